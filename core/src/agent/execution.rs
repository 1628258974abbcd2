//! Agent run result structures

use crate::llm::ConversationTurn;
use crate::output::TokenUsage;
use serde::{Deserialize, Serialize};

/// Why a run stopped without a final answer from the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum AbortReason {
    /// The model kept requesting tools until the cycle cap was hit
    IterationLimitExceeded { max_iterations: u32 },
    /// The model returned neither text nor usable tool calls, twice in a row
    MalformedResponse,
    /// The run deadline passed
    RequestTimeout,
}

impl AbortReason {
    /// Human-readable reason used in the incompleteness answer
    pub fn describe(&self) -> String {
        match self {
            AbortReason::IterationLimitExceeded { max_iterations } => {
                format!("the step limit of {} was reached", max_iterations)
            }
            AbortReason::MalformedResponse => {
                "the model returned an empty or unusable response".to_string()
            }
            AbortReason::RequestTimeout => "the request took too long".to_string(),
        }
    }
}

/// Terminal state of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunOutcome {
    Done,
    Aborted(AbortReason),
}

/// Result of one agent run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRun {
    /// Text shown to the user
    pub answer: String,

    /// Full conversation, system prompt first
    pub transcript: Vec<ConversationTurn>,

    /// Completed planning/executing cycles
    pub iterations: u32,

    /// How the run ended
    pub outcome: RunOutcome,

    /// Total execution time in milliseconds
    pub duration_ms: u64,

    /// Tokens consumed across all model calls
    pub token_usage: TokenUsage,
}

impl AgentRun {
    /// Whether the model produced a final answer
    pub fn is_complete(&self) -> bool {
        self.outcome == RunOutcome::Done
    }

    /// Conversation without the system prompt, suitable as the next run's history
    pub fn history(&self) -> Vec<ConversationTurn> {
        self.transcript
            .iter()
            .filter(|turn| !matches!(turn, ConversationTurn::System { .. }))
            .cloned()
            .collect()
    }
}
