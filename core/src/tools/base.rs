//! Base tool traits and structures

use crate::error::{Result, ToolError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::schema::ParameterSpec;

/// Trait for all tools
///
/// Implementations receive arguments that were already validated against
/// [`Tool::parameters`], with defaults filled in.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the name of the tool
    fn name(&self) -> &str;

    /// Get the description of the tool
    fn description(&self) -> &str;

    /// Declared parameters
    fn parameters(&self) -> Vec<ParameterSpec>;

    /// Execute the tool with validated arguments
    async fn execute(&self, args: ToolArgs) -> Result<Value>;
}

/// A call to a tool requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this tool call
    pub id: String,

    /// Name of the tool to call
    pub name: String,

    /// Arguments to pass to the tool
    #[serde(default)]
    pub arguments: Value,
}

impl ToolCall {
    /// Create a new tool call with a generated id
    pub fn new<S: Into<String>>(name: S, arguments: Value) -> Self {
        Self {
            id: format!("call_{}", Uuid::new_v4().simple()),
            name: name.into(),
            arguments,
        }
    }

    /// Create a tool call with a provider-assigned id
    pub fn with_id<I: Into<String>, S: Into<String>>(id: I, name: S, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// Arguments handed to a tool after validation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArgs {
    tool: String,
    values: Map<String, Value>,
}

impl ToolArgs {
    pub(crate) fn new(tool: &str, values: Map<String, Value>) -> Self {
        Self {
            tool: tool.to_string(),
            values,
        }
    }

    /// Get a parameter value by key
    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let value = self.values.get(key).ok_or_else(|| ToolError::Validation {
            tool: self.tool.clone(),
            parameter: key.to_string(),
            message: "missing required parameter".to_string(),
        })?;

        serde_json::from_value(value.clone()).map_err(|e| {
            ToolError::Validation {
                tool: self.tool.clone(),
                parameter: key.to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Get an optional parameter value
    pub fn get_opt<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        match self.values.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.get(key).map(Some),
        }
    }

    /// Raw view of all arguments
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }
}

/// Outcome of one tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum ToolOutcome {
    Success(Value),
    Failure(ToolError),
}

/// Result of a tool execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// ID of the tool call this is a result for
    pub tool_call_id: String,

    /// Name of the tool that was requested
    pub tool_name: String,

    /// Payload or failure
    pub outcome: ToolOutcome,

    /// Execution duration in milliseconds
    pub duration_ms: Option<u64>,
}

impl ToolResult {
    /// Create a successful result
    pub fn success(call: &ToolCall, payload: Value) -> Self {
        Self {
            tool_call_id: call.id.clone(),
            tool_name: call.name.clone(),
            outcome: ToolOutcome::Success(payload),
            duration_ms: None,
        }
    }

    /// Create a failed result
    pub fn failure(call: &ToolCall, error: ToolError) -> Self {
        Self {
            tool_call_id: call.id.clone(),
            tool_name: call.name.clone(),
            outcome: ToolOutcome::Failure(error),
            duration_ms: None,
        }
    }

    /// Set execution duration
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Whether the tool produced a payload
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ToolOutcome::Success(_))
    }

    /// The failure, if any
    pub fn error(&self) -> Option<&ToolError> {
        match &self.outcome {
            ToolOutcome::Failure(e) => Some(e),
            ToolOutcome::Success(_) => None,
        }
    }

    /// Text handed back to the model
    pub fn content(&self) -> String {
        match &self.outcome {
            ToolOutcome::Success(Value::String(s)) => s.clone(),
            ToolOutcome::Success(payload) => payload.to_string(),
            ToolOutcome::Failure(e) => format!("Error ({}): {}", e.kind(), e),
        }
    }
}
