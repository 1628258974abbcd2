//! Agent configuration structures

use crate::llm::{ChatOptions, LlmClient};
use crate::output::{AgentOutput, NullOutput};
use crate::tools::ToolRegistry;
use crate::trajectory::TrajectoryRecorder;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Configuration for an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Hard cap on planning/executing cycles
    pub max_iterations: u32,

    /// Upper bound on each tool call
    pub tool_timeout_ms: u64,

    /// Extra attempts for a planning step after a transient model failure
    pub model_retry_count: u32,

    /// Initial retry delay, doubled after every attempt
    pub retry_backoff_ms: u64,

    /// Deadline for a whole run
    pub request_timeout_ms: u64,

    /// Run sibling tool calls of one planning step concurrently
    pub parallel_tool_calls: bool,

    /// Custom system prompt for the agent (optional)
    /// If not provided, the default system prompt will be used
    pub system_prompt: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            tool_timeout_ms: 30_000,
            model_retry_count: 2,
            retry_backoff_ms: 500,
            request_timeout_ms: 120_000,
            parallel_tool_calls: true,
            system_prompt: None,
        }
    }
}

impl AgentConfig {
    pub fn tool_timeout(&self) -> Duration {
        Duration::from_millis(self.tool_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Delay before retry number `attempt` (1-based), capped at ten seconds
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(factor).min(10_000))
    }

    /// Check values the loop cannot work with
    pub fn validate(&self) -> Result<(), String> {
        if self.max_iterations == 0 {
            return Err("max_iterations must be at least 1".to_string());
        }
        if self.tool_timeout_ms == 0 {
            return Err("tool_timeout_ms must be greater than 0".to_string());
        }
        if self.request_timeout_ms == 0 {
            return Err("request_timeout_ms must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Builder for creating agents from an injected client and registry
pub struct AgentBuilder {
    llm_client: Arc<dyn LlmClient>,
    registry: Arc<ToolRegistry>,
    agent_config: AgentConfig,
    chat_options: ChatOptions,
    output: Arc<dyn AgentOutput>,
    trajectory_recorder: Option<Arc<TrajectoryRecorder>>,
}

impl AgentBuilder {
    /// Create a new agent builder
    pub fn new(llm_client: Arc<dyn LlmClient>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            llm_client,
            registry,
            agent_config: AgentConfig::default(),
            chat_options: ChatOptions::default(),
            output: Arc::new(NullOutput),
            trajectory_recorder: None,
        }
    }

    /// Set agent configuration
    pub fn with_agent_config(mut self, agent_config: AgentConfig) -> Self {
        self.agent_config = agent_config;
        self
    }

    /// Set maximum iterations
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.agent_config.max_iterations = max_iterations;
        self
    }

    /// Set the per-call tool timeout
    pub fn with_tool_timeout_ms(mut self, tool_timeout_ms: u64) -> Self {
        self.agent_config.tool_timeout_ms = tool_timeout_ms;
        self
    }

    /// Set system prompt
    pub fn with_system_prompt(mut self, system_prompt: Option<String>) -> Self {
        self.agent_config.system_prompt = system_prompt;
        self
    }

    /// Set sampling options sent with every model request
    pub fn with_chat_options(mut self, chat_options: ChatOptions) -> Self {
        self.chat_options = chat_options;
        self
    }

    /// Set the output handler
    pub fn with_output(mut self, output: Arc<dyn AgentOutput>) -> Self {
        self.output = output;
        self
    }

    /// Record every run into this trajectory
    pub fn with_trajectory_recorder(mut self, recorder: Arc<TrajectoryRecorder>) -> Self {
        self.trajectory_recorder = Some(recorder);
        self
    }

    /// Build the agent
    pub fn build(self) -> crate::error::Result<super::Agent> {
        self.agent_config.validate().map_err(|value| {
            crate::error::ConfigError::InvalidValue {
                field: "agent".to_string(),
                value,
            }
        })?;

        Ok(super::Agent::new(
            self.llm_client,
            self.registry,
            self.agent_config,
            self.chat_options,
            self.output,
            self.trajectory_recorder,
        ))
    }
}
