//! Error types and handling for adpilot core

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for adpilot core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for adpilot core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// LLM client errors
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Tool registration and execution errors
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// Agent execution errors
    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    /// Trajectory recording errors
    #[error("Trajectory error: {0}")]
    Trajectory(#[from] TrajectoryError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for field '{field}': {value}")]
    InvalidValue { field: String, value: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("No configuration found")]
    NoConfigFound,
}

/// LLM client errors
#[derive(Error, Debug, Clone)]
pub enum LlmError {
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },
}

impl LlmError {
    /// Whether the failure is a transport-level problem worth retrying.
    ///
    /// Rate limits, network failures and 5xx responses count as the model
    /// service being temporarily unavailable; everything else is a request
    /// the service will keep rejecting.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::RateLimit | LlmError::Network { .. } => true,
            LlmError::ApiError { status, .. } => *status == 429 || *status >= 500,
            LlmError::Authentication { .. }
            | LlmError::InvalidRequest { .. }
            | LlmError::MalformedResponse { .. } => false,
        }
    }
}

/// Tool registration and execution errors
///
/// Apart from `DuplicateTool`, which can only happen while building a
/// registry, these are carried as values inside tool results and fed back
/// to the model.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolError {
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Tool already registered: {name}")]
    DuplicateTool { name: String },

    #[error("Invalid argument '{parameter}' for {tool}: {message}")]
    Validation {
        tool: String,
        parameter: String,
        message: String,
    },

    #[error("Tool execution failed: {name} - {message}")]
    ExecutionFailed { name: String, message: String },

    #[error("Tool timeout: {name} did not finish within {timeout_ms}ms")]
    Timeout { name: String, timeout_ms: u64 },
}

impl ToolError {
    /// Short machine-friendly label for logs and tool result payloads
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::UnknownTool { .. } => "unknown_tool",
            ToolError::DuplicateTool { .. } => "duplicate_tool",
            ToolError::Validation { .. } => "validation",
            ToolError::ExecutionFailed { .. } => "execution_failed",
            ToolError::Timeout { .. } => "timeout",
        }
    }
}

/// Agent execution errors surfaced to the caller as service failures
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Model unavailable after {attempts} attempt(s): {message}")]
    ModelUnavailable { attempts: u32, message: String },

    #[error("Model request rejected: {0}")]
    Llm(LlmError),

    #[error("Agent run was cancelled")]
    Cancelled,
}

/// Trajectory recording errors
#[derive(Error, Debug)]
pub enum TrajectoryError {
    #[error("Failed to record trajectory: {message}")]
    RecordingFailed { message: String },

    #[error("Failed to load trajectory: {path}")]
    LoadFailed { path: String },

    #[error("Invalid trajectory format")]
    InvalidFormat,
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Generic(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Generic(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(LlmError::RateLimit.is_transient());
        assert!(LlmError::Network {
            message: "connection reset".to_string()
        }
        .is_transient());
        assert!(LlmError::ApiError {
            status: 503,
            message: "overloaded".to_string()
        }
        .is_transient());
        assert!(!LlmError::ApiError {
            status: 400,
            message: "bad".to_string()
        }
        .is_transient());
        assert!(!LlmError::Authentication {
            message: "no key".to_string()
        }
        .is_transient());
    }

    #[test]
    fn test_validation_error_names_parameter() {
        let err = ToolError::Validation {
            tool: "generate_ad_copy".to_string(),
            parameter: "tone".to_string(),
            message: "must be one of professional, friendly, luxury, direct".to_string(),
        };
        assert!(err.to_string().contains("'tone'"));
        assert_eq!(err.kind(), "validation");
    }
}
