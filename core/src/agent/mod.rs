//! Agent loop, configuration and run results

pub mod config;
pub mod core;
pub mod execution;
pub mod prompt;
pub mod session;

pub use config::{AgentBuilder, AgentConfig};
pub use core::{run_agent, Agent};
pub use execution::{AbortReason, AgentRun, RunOutcome};
pub use prompt::{build_system_prompt, ADPILOT_SYSTEM_PROMPT};
pub use session::{AgentSession, LoopState};
