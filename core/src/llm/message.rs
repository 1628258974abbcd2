//! Conversation turns exchanged with the model

use crate::tools::{ToolCall, ToolResult};
use serde::{Deserialize, Serialize};

/// One turn of a conversation, in chronological order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum ConversationTurn {
    /// System instructions
    System { content: String },

    /// Human input
    User { content: String },

    /// Model output: text, requested tool calls, or both
    Assistant {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
        /// Set on the answer that ended the run
        #[serde(default)]
        is_final: bool,
    },

    /// Result of one tool call, tagged with the originating call id
    ToolResult {
        tool_call_id: String,
        tool_name: String,
        content: String,
        #[serde(default)]
        is_error: bool,
    },
}

impl ConversationTurn {
    /// Create a new system turn
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    /// Create a new user turn
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    /// Create a final assistant answer
    pub fn final_answer<S: Into<String>>(content: S) -> Self {
        Self::Assistant {
            content: Some(content.into()),
            tool_calls: Vec::new(),
            is_final: true,
        }
    }

    /// Create an assistant turn that requests tool calls
    pub fn tool_request(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self::Assistant {
            content,
            tool_calls,
            is_final: false,
        }
    }

    /// Create a tool result turn from an invocation result
    pub fn tool_result(result: &ToolResult) -> Self {
        Self::ToolResult {
            tool_call_id: result.tool_call_id.clone(),
            tool_name: result.tool_name.clone(),
            content: result.content(),
            is_error: !result.is_success(),
        }
    }

    /// Tool calls requested by this turn (empty for non-assistant turns)
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Self::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }

    /// Whether this is the assistant answer that terminated a run
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Assistant { is_final: true, .. })
    }
}
