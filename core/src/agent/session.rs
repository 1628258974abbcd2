//! Per-run conversation state

use crate::llm::{ConversationTurn, LlmResponse, PlanningOutcome};
use crate::output::TokenUsage;
use crate::tools::{ToolCall, ToolResult};

use super::execution::AbortReason;

/// Loop states of an agent run
#[derive(Debug, Clone, PartialEq)]
pub enum LoopState {
    Planning,
    Executing(Vec<ToolCall>),
    Done(String),
    Aborted(AbortReason),
}

/// Mutable state owned by a single run; never shared between runs
#[derive(Debug)]
pub struct AgentSession {
    conversation: Vec<ConversationTurn>,
    /// Index of this run's user turn
    run_start: usize,
    iterations: u32,
    max_iterations: u32,
    state: LoopState,
    token_usage: TokenUsage,
}

impl AgentSession {
    /// Start a session: system prompt, prior history (minus its system turns),
    /// then the new user message
    pub fn new(
        system_prompt: String,
        prior_history: &[ConversationTurn],
        user_message: &str,
        max_iterations: u32,
    ) -> Self {
        let mut conversation = Vec::with_capacity(prior_history.len() + 2);
        conversation.push(ConversationTurn::system(system_prompt));
        conversation.extend(
            prior_history
                .iter()
                .filter(|turn| !matches!(turn, ConversationTurn::System { .. }))
                .cloned(),
        );
        let run_start = conversation.len();
        conversation.push(ConversationTurn::user(user_message));

        Self {
            conversation,
            run_start,
            iterations: 0,
            max_iterations,
            state: LoopState::Planning,
            token_usage: TokenUsage::default(),
        }
    }

    pub fn conversation(&self) -> &[ConversationTurn] {
        &self.conversation
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn state(&self) -> &LoopState {
        &self.state
    }

    pub fn token_usage(&self) -> &TokenUsage {
        &self.token_usage
    }

    /// Apply a classified planning response
    pub fn apply_planning(&mut self, response: &LlmResponse, outcome: PlanningOutcome) {
        if let Some(usage) = &response.usage {
            self.token_usage.add(usage);
        }

        self.state = match outcome {
            PlanningOutcome::FinalAnswer(text) => {
                self.conversation
                    .push(ConversationTurn::final_answer(text.clone()));
                LoopState::Done(text)
            }
            PlanningOutcome::ToolCalls { content, calls } => {
                self.conversation
                    .push(ConversationTurn::tool_request(content, calls.clone()));
                LoopState::Executing(calls)
            }
        };
    }

    /// Append tool results in request order and close the cycle.
    ///
    /// The counter moves exactly once per cycle; reaching the cap aborts.
    pub fn complete_cycle(&mut self, results: &[ToolResult]) {
        self.conversation
            .extend(results.iter().map(ConversationTurn::tool_result));
        self.iterations += 1;

        self.state = if self.iterations >= self.max_iterations {
            LoopState::Aborted(AbortReason::IterationLimitExceeded {
                max_iterations: self.max_iterations,
            })
        } else {
            LoopState::Planning
        };
    }

    /// Append the results of a cycle that was cut short, then abort
    pub fn interrupt_cycle(&mut self, results: &[ToolResult], reason: AbortReason) {
        self.conversation
            .extend(results.iter().map(ConversationTurn::tool_result));
        self.state = LoopState::Aborted(reason);
    }

    /// Stop the run without a model answer
    pub fn abort(&mut self, reason: AbortReason) {
        self.state = LoopState::Aborted(reason);
    }

    /// Most recent non-empty assistant text of this run
    pub fn last_assistant_text(&self) -> Option<&str> {
        self.conversation[self.run_start..].iter().rev().find_map(|turn| match turn {
            ConversationTurn::Assistant {
                content: Some(text),
                ..
            } if !text.trim().is_empty() => Some(text.as_str()),
            _ => None,
        })
    }

    /// Record the answer shown to the user for an aborted run
    pub fn push_incomplete_answer(&mut self, answer: &str) {
        self.conversation.push(ConversationTurn::final_answer(answer));
    }

    pub fn into_transcript(self) -> Vec<ConversationTurn> {
        self.conversation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session(max: u32) -> AgentSession {
        AgentSession::new("system".to_string(), &[], "hello", max)
    }

    #[test]
    fn test_history_system_turns_are_replaced() {
        let history = vec![
            ConversationTurn::system("stale prompt"),
            ConversationTurn::user("earlier question"),
            ConversationTurn::final_answer("earlier answer"),
        ];
        let session = AgentSession::new("fresh prompt".to_string(), &history, "follow-up", 5);
        let conversation = session.conversation();

        assert_eq!(conversation.len(), 4);
        assert_eq!(session.last_assistant_text(), None);
        assert_eq!(conversation[0], ConversationTurn::system("fresh prompt"));
        assert_eq!(conversation[3], ConversationTurn::user("follow-up"));
        assert_eq!(
            conversation
                .iter()
                .filter(|t| matches!(t, ConversationTurn::System { .. }))
                .count(),
            1
        );
    }

    #[test]
    fn test_counter_moves_once_per_cycle() {
        let mut session = session(2);
        let calls = vec![
            ToolCall::with_id("a", "get_keywords", json!({})),
            ToolCall::with_id("b", "get_ads", json!({})),
        ];
        let response = LlmResponse::tool_calls(calls.clone());
        let outcome = response.planning_outcome().unwrap();
        session.apply_planning(&response, outcome);
        assert_eq!(session.state(), &LoopState::Executing(calls.clone()));

        let results: Vec<ToolResult> = calls
            .iter()
            .map(|c| ToolResult::success(c, json!([])))
            .collect();
        session.complete_cycle(&results);
        assert_eq!(session.iterations(), 1);
        assert_eq!(session.state(), &LoopState::Planning);

        session.complete_cycle(&[]);
        assert_eq!(
            session.state(),
            &LoopState::Aborted(AbortReason::IterationLimitExceeded { max_iterations: 2 })
        );
    }

    #[test]
    fn test_final_answer_ends_run() {
        let mut session = session(5);
        let response = LlmResponse::text("Done.");
        let outcome = response.planning_outcome().unwrap();
        session.apply_planning(&response, outcome);
        assert_eq!(session.state(), &LoopState::Done("Done.".to_string()));
        assert_eq!(session.last_assistant_text(), Some("Done."));
    }
}
