//! LLM client trait and response structures

use crate::error::Result;
use crate::tools::ToolCall;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::message::ConversationTurn;

/// Trait for LLM clients
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a chat completion request with the tool catalog attached
    async fn chat_completion(
        &self,
        conversation: &[ConversationTurn],
        tools: &[ToolDefinition],
        options: Option<ChatOptions>,
    ) -> Result<LlmResponse>;

    /// Get the model name
    fn model_name(&self) -> &str;

    /// Get the provider name
    fn provider_name(&self) -> &str;
}

/// Response from an LLM
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Generated text, if any
    pub content: Option<String>,

    /// Tool calls requested by the model
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,

    /// Usage statistics
    pub usage: Option<Usage>,

    /// Model used for generation
    pub model: String,

    /// Finish reason
    pub finish_reason: Option<FinishReason>,
}

/// What the model decided to do in one planning step
#[derive(Debug, Clone, PartialEq)]
pub enum PlanningOutcome {
    /// The model answered; the run is over
    FinalAnswer(String),

    /// The model wants these tools executed first. Any text that came with
    /// the calls is kept alongside them.
    ToolCalls {
        content: Option<String>,
        calls: Vec<ToolCall>,
    },
}

impl LlmResponse {
    /// Create a plain text response
    pub fn text<S: Into<String>>(content: S) -> Self {
        Self {
            content: Some(content.into()),
            finish_reason: Some(FinishReason::Stop),
            ..Default::default()
        }
    }

    /// Create a response that only requests tool calls
    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls: calls,
            finish_reason: Some(FinishReason::ToolCalls),
            ..Default::default()
        }
    }

    /// Classify the response.
    ///
    /// Returns `None` for empty or malformed responses: no text and no tool
    /// calls, or a tool call without a name. Calls with an empty or repeated
    /// id get a fresh one, so every result pairs with exactly one call.
    pub fn planning_outcome(&self) -> Option<PlanningOutcome> {
        let text = self
            .content
            .as_ref()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty());

        if !self.tool_calls.is_empty() {
            if self.tool_calls.iter().any(|call| call.name.trim().is_empty()) {
                return None;
            }
            return Some(PlanningOutcome::ToolCalls {
                content: text.map(str::to_string),
                calls: unique_call_ids(&self.tool_calls),
            });
        }

        text.map(|t| PlanningOutcome::FinalAnswer(t.to_string()))
    }
}

/// Copy `calls`, replacing empty and already-seen ids
fn unique_call_ids(calls: &[ToolCall]) -> Vec<ToolCall> {
    let mut seen = HashSet::new();
    calls
        .iter()
        .map(|call| {
            let id = call.id.trim();
            if id.is_empty() || !seen.insert(id.to_string()) {
                let fresh = ToolCall::new(call.name.clone(), call.arguments.clone());
                tracing::debug!("Replacing tool call id '{}' with {}", call.id, fresh.id);
                seen.insert(fresh.id.clone());
                fresh
            } else {
                call.clone()
            }
        })
        .collect()
}

/// Usage statistics for a request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Number of tokens in the prompt
    pub prompt_tokens: u32,

    /// Number of tokens in the completion
    pub completion_tokens: u32,

    /// Total number of tokens
    pub total_tokens: u32,
}

/// Reason why generation finished
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Generation completed naturally
    Stop,

    /// Hit the maximum token limit
    Length,

    /// Model decided to call a tool
    ToolCalls,

    /// Content was filtered
    ContentFilter,

    /// Other reason
    Other(String),
}

/// Tool definition for function calling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Type of tool (usually "function")
    #[serde(rename = "type")]
    pub tool_type: String,

    /// Function definition
    pub function: FunctionDefinition,
}

/// Function definition for tool calling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// Name of the function
    pub name: String,

    /// Description of what the function does
    pub description: String,

    /// JSON schema for the function parameters
    pub parameters: serde_json::Value,
}

/// Options for chat completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatOptions {
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,

    /// Temperature for generation
    pub temperature: Option<f32>,

    /// Top-p sampling parameter
    pub top_p: Option<f32>,

    /// Stop sequences
    pub stop: Option<Vec<String>>,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            max_tokens: Some(4096),
            temperature: Some(0.2),
            top_p: Some(1.0),
            stop: None,
        }
    }
}

impl From<&crate::config::ModelParams> for ChatOptions {
    fn from(params: &crate::config::ModelParams) -> Self {
        let defaults = ChatOptions::default();
        Self {
            max_tokens: params.max_tokens.or(defaults.max_tokens),
            temperature: params.temperature.or(defaults.temperature),
            top_p: params.top_p.or(defaults.top_p),
            stop: params.stop_sequences.clone(),
        }
    }
}
