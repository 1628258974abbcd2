//! LLM client abstractions and implementations

pub mod client;
pub mod message;
pub mod providers;

pub use client::{
    ChatOptions, FinishReason, FunctionDefinition, LlmClient, LlmResponse, PlanningOutcome,
    ToolDefinition, Usage,
};
pub use message::ConversationTurn;
pub use providers::*;
