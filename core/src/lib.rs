//! # adpilot Core
//!
//! Core library for adpilot, a tool-calling assistant for advertising
//! performance questions.
//!
//! The agent loop alternates between asking a chat model what to do and
//! running the tools it requests, until the model answers or a bound is hit.
//! Tools are registered once in an immutable [`ToolRegistry`] and shared by
//! every run.

// Core modules
pub mod agent;
pub mod config;
pub mod error;
pub mod llm;
pub mod output;
pub mod tools;
pub mod trajectory;

// Re-export commonly used types
pub use agent::{
    run_agent, AbortReason, Agent, AgentBuilder, AgentConfig, AgentRun, RunOutcome,
};
pub use config::{ModelParams, Protocol, ResolvedLlmConfig};
pub use error::{AgentError, Error, Result};
pub use llm::{create_client, ConversationTurn, LlmClient, LlmResponse, ScriptedClient};
pub use tools::builtin::advertising_registry;
pub use tools::{Tool, ToolCall, ToolRegistry, ToolResult};
pub use trajectory::TrajectoryRecorder;

/// Current version of the adpilot-core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for the library
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}

/// Initialize tracing with a specific debug mode
///
/// `RUST_LOG` still wins when it is set.
pub fn init_tracing_with_debug(debug: bool) {
    let filter = if debug { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}
