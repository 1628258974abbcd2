//! OpenAI-compatible client implementation using async-openai library
//!
//! Serves both OpenAI and Mistral, whose chat completions API speaks the same
//! wire format.

use crate::config::ResolvedLlmConfig;
use crate::error::{LlmError, Result};
use crate::llm::{
    ChatOptions, ConversationTurn, FinishReason, LlmClient, LlmResponse, ToolDefinition, Usage,
};
use crate::tools::ToolCall;
use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessage,
        ChatCompletionRequestAssistantMessageContent, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessage, ChatCompletionRequestToolMessage,
        ChatCompletionRequestToolMessageContent, ChatCompletionRequestUserMessage,
        ChatCompletionTool, ChatCompletionToolType, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs, FunctionCall, FunctionObject,
    },
    Client,
};
use async_trait::async_trait;
use serde_json::Value;

/// OpenAI-compatible client using async-openai library
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    model: String,
    provider: &'static str,
}

impl OpenAiClient {
    /// Create a new client from resolved LLM config
    pub fn new(config: &ResolvedLlmConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(LlmError::Authentication {
                message: format!("No API key found for {}", config.protocol.as_str()),
            }
            .into());
        }

        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.api_key)
            .with_api_base(&config.base_url);

        Ok(Self {
            client: Client::with_config(openai_config),
            model: config.model.clone(),
            provider: config.protocol.as_str(),
        })
    }

    /// Convert the conversation to async-openai messages
    fn convert_messages(
        &self,
        conversation: &[ConversationTurn],
    ) -> Vec<ChatCompletionRequestMessage> {
        conversation
            .iter()
            .map(|turn| match turn {
                ConversationTurn::System { content } => {
                    ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                        content: content.clone().into(),
                        name: None,
                    })
                }
                ConversationTurn::User { content } => {
                    ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                        content: content.clone().into(),
                        name: None,
                    })
                }
                ConversationTurn::Assistant {
                    content,
                    tool_calls,
                    ..
                } => {
                    let tool_calls: Vec<ChatCompletionMessageToolCall> = tool_calls
                        .iter()
                        .map(|call| ChatCompletionMessageToolCall {
                            id: call.id.clone(),
                            r#type: ChatCompletionToolType::Function,
                            function: FunctionCall {
                                name: call.name.clone(),
                                arguments: call.arguments.to_string(),
                            },
                        })
                        .collect();

                    ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                        content: content
                            .clone()
                            .map(ChatCompletionRequestAssistantMessageContent::Text),
                        tool_calls: if tool_calls.is_empty() {
                            None
                        } else {
                            Some(tool_calls)
                        },
                        ..Default::default()
                    })
                }
                ConversationTurn::ToolResult {
                    tool_call_id,
                    content,
                    ..
                } => ChatCompletionRequestMessage::Tool(ChatCompletionRequestToolMessage {
                    content: ChatCompletionRequestToolMessageContent::Text(content.clone()),
                    tool_call_id: tool_call_id.clone(),
                }),
            })
            .collect()
    }

    /// Convert our tool definitions to async-openai format
    fn convert_tools(&self, tools: &[ToolDefinition]) -> Vec<ChatCompletionTool> {
        tools
            .iter()
            .map(|tool| ChatCompletionTool {
                r#type: ChatCompletionToolType::Function,
                function: FunctionObject {
                    name: tool.function.name.clone(),
                    description: Some(tool.function.description.clone()),
                    parameters: Some(tool.function.parameters.clone()),
                    strict: None,
                },
            })
            .collect()
    }

    #[allow(deprecated)]
    fn build_request(
        &self,
        conversation: &[ConversationTurn],
        tools: &[ToolDefinition],
        options: Option<ChatOptions>,
    ) -> Result<CreateChatCompletionRequest> {
        let mut request_builder = CreateChatCompletionRequestArgs::default();
        request_builder.model(&self.model);
        request_builder.messages(self.convert_messages(conversation));

        if !tools.is_empty() {
            request_builder.tools(self.convert_tools(tools));
        }

        if let Some(opts) = options {
            if let Some(max_tokens) = opts.max_tokens {
                request_builder.max_tokens(max_tokens);
            }
            if let Some(temperature) = opts.temperature {
                request_builder.temperature(temperature);
            }
            if let Some(top_p) = opts.top_p {
                request_builder.top_p(top_p);
            }
        }

        request_builder.build().map_err(|e| {
            tracing::error!("Failed to build {} request: {}", self.provider, e);
            LlmError::InvalidRequest {
                message: format!("Failed to build request: {}", e),
            }
            .into()
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn chat_completion(
        &self,
        conversation: &[ConversationTurn],
        tools: &[ToolDefinition],
        options: Option<ChatOptions>,
    ) -> Result<LlmResponse> {
        let request = self.build_request(conversation, tools, options)?;

        tracing::debug!(
            provider = self.provider,
            model = %self.model,
            tools = tools.len(),
            "sending chat completion request"
        );

        let response = self.client.chat().create(request).await.map_err(|e| {
            tracing::error!("{} API call failed: {}", self.provider, e);
            convert_error(e)
        })?;

        let result = self.convert_response(response)?;
        if !result.tool_calls.is_empty() {
            tracing::debug!("{} response contains {} tool calls", self.provider, result.tool_calls.len());
            for call in &result.tool_calls {
                tracing::debug!("Tool call: {} (id: {})", call.name, call.id);
            }
        }

        Ok(result)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &str {
        self.provider
    }
}

impl OpenAiClient {
    /// Convert async-openai response to our internal format
    fn convert_response(
        &self,
        response: async_openai::types::CreateChatCompletionResponse,
    ) -> Result<LlmResponse> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::MalformedResponse {
                message: "No choices in response".to_string(),
            })?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tool_call| {
                // Unparsable arguments are kept as a raw string; argument
                // validation reports them back to the model.
                let arguments: Value = serde_json::from_str(&tool_call.function.arguments)
                    .unwrap_or_else(|_| Value::String(tool_call.function.arguments.clone()));
                ToolCall::with_id(tool_call.id, tool_call.function.name, arguments)
            })
            .collect();

        let usage = response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        let finish_reason = choice.finish_reason.map(|reason| match reason {
            async_openai::types::FinishReason::Stop => FinishReason::Stop,
            async_openai::types::FinishReason::Length => FinishReason::Length,
            async_openai::types::FinishReason::ToolCalls => FinishReason::ToolCalls,
            async_openai::types::FinishReason::ContentFilter => FinishReason::ContentFilter,
            async_openai::types::FinishReason::FunctionCall => FinishReason::ToolCalls,
        });

        Ok(LlmResponse {
            content: choice.message.content,
            tool_calls,
            usage,
            model: response.model,
            finish_reason,
        })
    }
}

/// Map async-openai errors onto our taxonomy so transport problems are retried
fn convert_error(error: OpenAIError) -> crate::error::Error {
    let llm_error = match error {
        OpenAIError::Reqwest(e) => LlmError::Network {
            message: e.to_string(),
        },
        OpenAIError::ApiError(api) => {
            let kind = api
                .code
                .clone()
                .or_else(|| api.r#type.clone())
                .unwrap_or_default();
            if kind.contains("rate_limit") {
                LlmError::RateLimit
            } else if kind.contains("invalid_api_key") || kind.contains("authentication") {
                LlmError::Authentication {
                    message: api.message,
                }
            } else if kind.contains("invalid_request") {
                LlmError::InvalidRequest {
                    message: api.message,
                }
            } else {
                // async-openai doesn't expose status codes directly
                LlmError::ApiError {
                    status: 500,
                    message: api.message,
                }
            }
        }
        OpenAIError::JSONDeserialize(e) => LlmError::MalformedResponse {
            message: e.to_string(),
        },
        OpenAIError::InvalidArgument(message) => LlmError::InvalidRequest { message },
        other => LlmError::ApiError {
            status: 500,
            message: other.to_string(),
        },
    };
    llm_error.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Protocol;
    use serde_json::json;

    fn client() -> OpenAiClient {
        let config = ResolvedLlmConfig::new(
            Protocol::Mistral,
            Protocol::Mistral.default_base_url().to_string(),
            "test-key".to_string(),
            "mistral-large-latest".to_string(),
        );
        OpenAiClient::new(&config).unwrap()
    }

    #[test]
    fn test_missing_key_is_rejected() {
        let config = ResolvedLlmConfig::new(
            Protocol::Mistral,
            Protocol::Mistral.default_base_url().to_string(),
            String::new(),
            "mistral-large-latest".to_string(),
        );
        assert!(OpenAiClient::new(&config).is_err());
    }

    #[test]
    fn test_conversation_conversion_keeps_call_ids() {
        let client = client();
        let call = ToolCall::with_id(
            "abc123XYZ",
            "get_campaign_metrics",
            json!({"date_range": "2024-05-01 to 2024-05-31"}),
        );
        let conversation = vec![
            ConversationTurn::system("You are a performance marketer."),
            ConversationTurn::user("What happened to CPA last month?"),
            ConversationTurn::tool_request(None, vec![call]),
            ConversationTurn::ToolResult {
                tool_call_id: "abc123XYZ".to_string(),
                tool_name: "get_campaign_metrics".to_string(),
                content: "[]".to_string(),
                is_error: false,
            },
        ];

        let messages = client.convert_messages(&conversation);
        assert_eq!(messages.len(), 4);
        match &messages[2] {
            ChatCompletionRequestMessage::Assistant(assistant) => {
                let calls = assistant.tool_calls.as_ref().unwrap();
                assert_eq!(calls[0].id, "abc123XYZ");
                assert_eq!(calls[0].function.name, "get_campaign_metrics");
            }
            other => panic!("unexpected message: {:?}", other),
        }
        match &messages[3] {
            ChatCompletionRequestMessage::Tool(tool) => assert_eq!(tool.tool_call_id, "abc123XYZ"),
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_provider_name_follows_protocol() {
        assert_eq!(client().provider_name(), "mistral");
    }
}
