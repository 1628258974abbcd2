//! Anthropic Claude client implementation

use crate::config::ResolvedLlmConfig;
use crate::error::{LlmError, Result};
use crate::llm::{
    ChatOptions, ConversationTurn, FinishReason, LlmClient, LlmResponse, ToolDefinition, Usage,
};
use crate::tools::ToolCall;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Claude client
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    headers: HashMap<String, String>,
}

impl AnthropicClient {
    /// Create a new Anthropic client
    pub fn new(config: &ResolvedLlmConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(LlmError::Authentication {
                message: "No API key found for Anthropic".to_string(),
            }
            .into());
        }

        Ok(Self {
            client: Client::new(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            headers: config.headers.clone(),
        })
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn chat_completion(
        &self,
        conversation: &[ConversationTurn],
        tools: &[ToolDefinition],
        options: Option<ChatOptions>,
    ) -> Result<LlmResponse> {
        let request = self.build_request(conversation, tools, options);

        let mut builder = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json");
        for (name, value) in &self.headers {
            builder = builder.header(name, value);
        }

        let response = builder
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Network {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Anthropic API call failed ({}): {}", status, error_text);
            let error = match status.as_u16() {
                401 | 403 => LlmError::Authentication {
                    message: error_text,
                },
                429 => LlmError::RateLimit,
                code => LlmError::ApiError {
                    status: code,
                    message: error_text,
                },
            };
            return Err(error.into());
        }

        let anthropic_response: AnthropicResponse =
            response
                .json()
                .await
                .map_err(|e| LlmError::MalformedResponse {
                    message: format!("Failed to parse response: {}", e),
                })?;

        Ok(self.convert_response(anthropic_response))
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &str {
        "anthropic"
    }
}

impl AnthropicClient {
    fn build_request(
        &self,
        conversation: &[ConversationTurn],
        tools: &[ToolDefinition],
        options: Option<ChatOptions>,
    ) -> AnthropicRequest {
        let options = options.unwrap_or_default();

        // The system prompt travels outside the message list
        let mut system_message = None;
        let mut messages: Vec<AnthropicMessage> = Vec::new();

        for turn in conversation {
            match turn {
                ConversationTurn::System { content } => system_message = Some(content.clone()),
                ConversationTurn::User { content } => {
                    push_block(&mut messages, "user", json!({"type": "text", "text": content}))
                }
                ConversationTurn::Assistant {
                    content,
                    tool_calls,
                    ..
                } => {
                    if let Some(text) = content.as_deref().filter(|t| !t.is_empty()) {
                        push_block(&mut messages, "assistant", json!({"type": "text", "text": text}));
                    }
                    for call in tool_calls {
                        push_block(
                            &mut messages,
                            "assistant",
                            json!({
                                "type": "tool_use",
                                "id": call.id,
                                "name": call.name,
                                "input": call.arguments,
                            }),
                        );
                    }
                }
                // Tool results are user-role blocks; siblings share one message
                ConversationTurn::ToolResult {
                    tool_call_id,
                    content,
                    is_error,
                    ..
                } => push_block(
                    &mut messages,
                    "user",
                    json!({
                        "type": "tool_result",
                        "tool_use_id": tool_call_id,
                        "content": content,
                        "is_error": is_error,
                    }),
                ),
            }
        }

        AnthropicRequest {
            model: self.model.clone(),
            max_tokens: options.max_tokens.unwrap_or(4096),
            temperature: options.temperature,
            top_p: options.top_p,
            system: system_message,
            messages,
            tools: if tools.is_empty() {
                None
            } else {
                Some(
                    tools
                        .iter()
                        .map(|tool| AnthropicTool {
                            name: tool.function.name.clone(),
                            description: tool.function.description.clone(),
                            input_schema: tool.function.parameters.clone(),
                        })
                        .collect(),
                )
            },
            stop_sequences: options.stop,
        }
    }

    fn convert_response(&self, response: AnthropicResponse) -> LlmResponse {
        let mut text = String::new();
        let mut tool_calls = Vec::new();

        for block in response.content {
            match block {
                AnthropicContent::Text { text: chunk } => text.push_str(&chunk),
                AnthropicContent::ToolUse { id, name, input } => {
                    tool_calls.push(ToolCall::with_id(id, name, input))
                }
                AnthropicContent::Other => {}
            }
        }

        let usage = response.usage.map(|u| Usage {
            prompt_tokens: u.input_tokens,
            completion_tokens: u.output_tokens,
            total_tokens: u.input_tokens + u.output_tokens,
        });

        let finish_reason = response.stop_reason.map(|reason| match reason.as_str() {
            "end_turn" | "stop_sequence" => FinishReason::Stop,
            "max_tokens" => FinishReason::Length,
            "tool_use" => FinishReason::ToolCalls,
            _ => FinishReason::Other(reason),
        });

        LlmResponse {
            content: if text.is_empty() { None } else { Some(text) },
            tool_calls,
            usage,
            model: response.model,
            finish_reason,
        }
    }
}

/// Append a content block, merging into the previous message when roles match
fn push_block(messages: &mut Vec<AnthropicMessage>, role: &'static str, block: Value) {
    match messages.last_mut() {
        Some(last) if last.role == role => last.content.push(block),
        _ => messages.push(AnthropicMessage {
            role,
            content: vec![block],
        }),
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<AnthropicTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: Vec<Value>,
}

#[derive(Debug, Serialize)]
struct AnthropicTool {
    name: String,
    description: String,
    input_schema: Value,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    model: String,
    content: Vec<AnthropicContent>,
    stop_reason: Option<String>,
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicContent {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}
