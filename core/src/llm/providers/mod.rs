//! LLM provider implementations

pub mod anthropic;
pub mod openai;
pub mod scripted;

pub use anthropic::AnthropicClient;
pub use openai::OpenAiClient;
pub use scripted::ScriptedClient;

use crate::config::{Protocol, ResolvedLlmConfig};
use crate::error::Result;
use crate::llm::LlmClient;
use std::sync::Arc;

/// Create the client for a resolved configuration
pub fn create_client(config: &ResolvedLlmConfig) -> Result<Arc<dyn LlmClient>> {
    config
        .validate()
        .map_err(|value| crate::error::ConfigError::InvalidValue {
            field: "llm".to_string(),
            value,
        })?;

    match config.protocol {
        Protocol::Mistral | Protocol::OpenAICompat => Ok(Arc::new(OpenAiClient::new(config)?)),
        Protocol::Anthropic => Ok(Arc::new(AnthropicClient::new(config)?)),
    }
}
