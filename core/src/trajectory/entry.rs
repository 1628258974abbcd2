//! Trajectory entry structures

use crate::llm::{ConversationTurn, Usage};
use crate::tools::{ToolCall, ToolResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single entry in the run trajectory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrajectoryEntry {
    /// Unique identifier for this entry
    pub id: String,

    /// Timestamp when this entry was created
    pub timestamp: DateTime<Utc>,

    /// Type of entry
    pub entry_type: EntryType,

    /// Iteration the entry belongs to (0 before the first planning step)
    pub iteration: u32,
}

/// Type of trajectory entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntryType {
    /// Run started
    TaskStart {
        task: String,
        agent_config: serde_json::Value,
    },

    /// Conversation sent to the model
    LlmRequest {
        conversation: Vec<ConversationTurn>,
        model: String,
        provider: String,
    },

    /// Model response received
    LlmResponse {
        content: Option<String>,
        tool_calls: Vec<ToolCall>,
        usage: Option<Usage>,
        finish_reason: Option<String>,
    },

    /// Tool call dispatched
    ToolCall { call: ToolCall },

    /// Tool result received
    ToolResult { result: ToolResult },

    /// Planning/executing cycle completed
    StepComplete { step_summary: String },

    /// Run finished
    TaskComplete {
        success: bool,
        final_result: String,
        total_iterations: u32,
        duration_ms: u64,
    },

    /// Error occurred
    Error {
        error: String,
        context: Option<String>,
    },
}

impl TrajectoryEntry {
    /// Create a new trajectory entry
    pub fn new(entry_type: EntryType, iteration: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            entry_type,
            iteration,
        }
    }

    /// Create a task start entry
    pub fn task_start(task: String, agent_config: serde_json::Value) -> Self {
        Self::new(EntryType::TaskStart { task, agent_config }, 0)
    }

    /// Create an LLM request entry
    pub fn llm_request(
        conversation: Vec<ConversationTurn>,
        model: String,
        provider: String,
        iteration: u32,
    ) -> Self {
        Self::new(
            EntryType::LlmRequest {
                conversation,
                model,
                provider,
            },
            iteration,
        )
    }

    /// Create an LLM response entry
    pub fn llm_response(response: &crate::llm::LlmResponse, iteration: u32) -> Self {
        Self::new(
            EntryType::LlmResponse {
                content: response.content.clone(),
                tool_calls: response.tool_calls.clone(),
                usage: response.usage.clone(),
                finish_reason: response.finish_reason.as_ref().map(|r| format!("{:?}", r)),
            },
            iteration,
        )
    }

    /// Create a tool call entry
    pub fn tool_call(call: ToolCall, iteration: u32) -> Self {
        Self::new(EntryType::ToolCall { call }, iteration)
    }

    /// Create a tool result entry
    pub fn tool_result(result: ToolResult, iteration: u32) -> Self {
        Self::new(EntryType::ToolResult { result }, iteration)
    }

    /// Create a step complete entry
    pub fn step_complete(step_summary: String, iteration: u32) -> Self {
        Self::new(EntryType::StepComplete { step_summary }, iteration)
    }

    /// Create a task complete entry
    pub fn task_complete(
        success: bool,
        final_result: String,
        total_iterations: u32,
        duration_ms: u64,
    ) -> Self {
        Self::new(
            EntryType::TaskComplete {
                success,
                final_result,
                total_iterations,
                duration_ms,
            },
            total_iterations,
        )
    }

    /// Create an error entry
    pub fn error(error: String, context: Option<String>, iteration: u32) -> Self {
        Self::new(EntryType::Error { error, context }, iteration)
    }
}
