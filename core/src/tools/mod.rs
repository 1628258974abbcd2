//! Tool system: schemas, registry, invoker and built-in tools

pub mod base;
pub mod builtin;
pub mod invoker;
pub mod registry;
pub mod schema;

pub use base::{Tool, ToolArgs, ToolCall, ToolOutcome, ToolResult};
pub use invoker::ToolInvoker;
pub use registry::{ToolRegistry, ToolRegistryBuilder};
pub use schema::{ParamKind, ParameterSpec};
