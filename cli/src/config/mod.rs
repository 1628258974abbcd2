//! CLI configuration loading

pub mod loader;

pub use loader::{CliConfigLoader, LoadedConfig, RawConfig};
