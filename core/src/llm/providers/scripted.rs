//! Scripted client that replays canned responses
//!
//! Used for offline checks and to drive the agent loop deterministically.

use crate::error::{LlmError, Result};
use crate::llm::{ChatOptions, ConversationTurn, LlmClient, LlmResponse, ToolDefinition};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Replays a fixed queue of responses, one per request
pub struct ScriptedClient {
    script: Mutex<VecDeque<std::result::Result<LlmResponse, LlmError>>>,
    requests: Mutex<Vec<Vec<ConversationTurn>>>,
    fallback: Option<std::result::Result<LlmResponse, LlmError>>,
    delay: Option<Duration>,
}

impl ScriptedClient {
    /// Create a client that answers with `responses` in order
    pub fn new(responses: Vec<LlmResponse>) -> Self {
        Self::with_results(responses.into_iter().map(Ok).collect())
    }

    /// Create a client whose script can also contain failures
    pub fn with_results(results: Vec<std::result::Result<LlmResponse, LlmError>>) -> Self {
        Self {
            script: Mutex::new(results.into()),
            requests: Mutex::new(Vec::new()),
            fallback: None,
            delay: None,
        }
    }

    /// Keep answering with `response` once the script runs out
    pub fn repeating(mut self, response: LlmResponse) -> Self {
        self.fallback = Some(Ok(response));
        self
    }

    /// Keep failing with `error` once the script runs out
    pub fn repeating_error(mut self, error: LlmError) -> Self {
        self.fallback = Some(Err(error));
        self
    }

    /// Wait before answering each request
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of requests received so far
    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }

    /// Conversations received, in request order
    pub fn requests(&self) -> Vec<Vec<ConversationTurn>> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn chat_completion(
        &self,
        conversation: &[ConversationTurn],
        _tools: &[ToolDefinition],
        _options: Option<ChatOptions>,
    ) -> Result<LlmResponse> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(conversation.to_vec());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self
            .script
            .lock()
            .ok()
            .and_then(|mut s| s.pop_front())
            .or_else(|| self.fallback.clone());
        match next {
            Some(Ok(response)) => Ok(response),
            Some(Err(e)) => Err(e.into()),
            None => Err(LlmError::InvalidRequest {
                message: "scripted client has no responses left".to_string(),
            }
            .into()),
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }
}
