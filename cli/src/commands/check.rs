//! Offline self-check command
//!
//! Drives the real registry and agent loop with a scripted model, so the tool
//! wiring can be verified without an API key or network access.

use crate::output::{CliOutputConfig, CliOutputHandler};
use adpilot_core::{
    advertising_registry, Agent, AgentConfig, LlmResponse, RunOutcome, ScriptedClient, ToolCall,
};
use anyhow::{bail, Result};
use colored::Colorize;
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const CHECK_QUESTION: &str = "What happened to CPA last month?";

/// Run a scripted CPA question end to end
pub async fn check_command(verbose: bool) -> Result<()> {
    let client = Arc::new(ScriptedClient::new(vec![
        LlmResponse::tool_calls(vec![ToolCall::with_id(
            "check_metrics",
            "get_campaign_metrics",
            json!({"date_range": "2024-05-01 to 2024-05-31"}),
        )]),
        LlmResponse::text(
            "Summer Sale 2024 (123) spent 850.0 for 120 conversions, a CPA of about 7.08.",
        ),
    ]));
    let registry = Arc::new(advertising_registry()?);
    let output = Arc::new(CliOutputHandler::new(CliOutputConfig {
        verbose,
        show_stats: true,
    }));

    let agent = Agent::builder(client.clone(), registry)
        .with_agent_config(AgentConfig::default())
        .with_output(output)
        .build()?;

    println!("🔍 {}", CHECK_QUESTION);
    let run = agent.run(CHECK_QUESTION, &[], &CancellationToken::new()).await?;

    let tool_replied = run.transcript.iter().any(|turn| {
        matches!(
            turn,
            adpilot_core::ConversationTurn::ToolResult { tool_call_id, content, .. }
                if tool_call_id == "check_metrics" && content.contains("850.0")
        )
    });

    if run.outcome != RunOutcome::Done || !tool_replied || client.call_count() != 2 {
        bail!("self-check failed: unexpected run {:?}", run.outcome);
    }

    println!("\n{}", run.answer);
    println!("{}", "✅ Self-check passed".green());
    Ok(())
}
