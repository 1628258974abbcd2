//! Output abstraction layer for agent runs
//!
//! The agent reports progress through [`AgentOutput`]; the CLI decides how to
//! render it. Core only provides the abstraction and a no-op implementation.

use crate::agent::RunOutcome;
use crate::tools::{ToolCall, ToolResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Null output handler that discards all events
pub struct NullOutput;

#[async_trait]
impl AgentOutput for NullOutput {
    async fn emit_event(
        &self,
        _event: AgentEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

/// Token usage statistics accumulated over a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Total input tokens consumed
    pub input_tokens: u32,
    /// Total output tokens generated
    pub output_tokens: u32,
    /// Total tokens (input + output)
    pub total_tokens: u32,
}

impl TokenUsage {
    /// Add one response's usage to the running totals
    pub fn add(&mut self, usage: &crate::llm::Usage) {
        self.input_tokens += usage.prompt_tokens;
        self.output_tokens += usage.completion_tokens;
        self.total_tokens += usage.total_tokens;
    }
}

/// Events emitted during an agent run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Run started
    ExecutionStarted {
        user_message: String,
        max_iterations: u32,
    },
    /// A planning step is about to call the model; `iteration` starts at 1
    PlanningStarted { iteration: u32 },
    /// A transient model failure is being retried
    ModelRetry { attempt: u32, error: String },
    /// Tool call dispatched
    ToolExecutionStarted { call: ToolCall },
    /// Tool call finished (successfully or not)
    ToolExecutionCompleted { result: ToolResult },
    /// Token usage updated after a model call
    TokenUsageUpdated { token_usage: TokenUsage },
    /// Run reached a terminal state
    ExecutionCompleted { outcome: RunOutcome, iterations: u32 },
}

/// Abstract output interface for agent runs
#[async_trait]
pub trait AgentOutput: Send + Sync {
    /// Emit an agent event
    async fn emit_event(
        &self,
        event: AgentEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Emit token usage update
    async fn emit_token_update(
        &self,
        token_usage: TokenUsage,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.emit_event(AgentEvent::TokenUsageUpdated { token_usage })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Usage;

    #[test]
    fn test_token_usage_accumulates() {
        let mut total = TokenUsage::default();
        let usage = Usage {
            prompt_tokens: 100,
            completion_tokens: 20,
            total_tokens: 120,
        };
        total.add(&usage);
        total.add(&usage);
        assert_eq!(total.input_tokens, 200);
        assert_eq!(total.total_tokens, 240);
    }

    #[test]
    fn test_events_serialize_with_tag() {
        let event = AgentEvent::PlanningStarted { iteration: 2 };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "planning_started");
        assert_eq!(value["iteration"], 2);
    }
}
