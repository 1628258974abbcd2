//! CLI command implementations

pub mod check;
pub mod interactive;
pub mod run;
pub mod tools;

pub use check::check_command;
pub use interactive::interactive_command;
pub use run::run_command;
pub use tools::tools_command;

use crate::config::LoadedConfig;
use crate::output::{CliOutputConfig, CliOutputHandler};
use adpilot_core::llm::ChatOptions;
use adpilot_core::{advertising_registry, create_client, Agent, TrajectoryRecorder};
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Per-invocation settings taken from flags
#[derive(Debug, Clone, Default)]
pub struct RunSettings {
    pub max_iterations: Option<u32>,
    pub tool_timeout_ms: Option<u64>,
    pub trajectory_file: Option<PathBuf>,
    pub verbose: bool,
}

/// Build an agent for a loaded configuration, with flag overrides applied
pub(crate) fn build_agent(
    loaded: LoadedConfig,
    settings: &RunSettings,
    recorder: Option<Arc<TrajectoryRecorder>>,
) -> Result<Agent> {
    info!("🤖 Using protocol: {}", loaded.llm.protocol.as_str());
    info!("🤖 Using model: {}", loaded.llm.model);

    let chat_options = ChatOptions::from(&loaded.llm.params);
    let client = create_client(&loaded.llm)?;
    let registry = Arc::new(advertising_registry()?);

    let mut agent_config = loaded.agent;
    if let Some(max) = settings.max_iterations {
        agent_config.max_iterations = max;
    }
    if let Some(timeout) = settings.tool_timeout_ms {
        agent_config.tool_timeout_ms = timeout;
    }

    let output = Arc::new(CliOutputHandler::new(CliOutputConfig {
        verbose: settings.verbose,
        ..CliOutputConfig::default()
    }));

    let mut builder = Agent::builder(client, registry)
        .with_agent_config(agent_config)
        .with_chat_options(chat_options)
        .with_output(output);
    if let Some(recorder) = recorder {
        builder = builder.with_trajectory_recorder(recorder);
    }

    Ok(builder.build()?)
}

/// Cancellation token that fires on Ctrl-C
pub(crate) fn ctrl_c_token() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            child.cancel();
        }
    });
    token
}
