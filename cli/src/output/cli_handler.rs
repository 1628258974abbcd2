//! CLI output handler implementation

use adpilot_core::agent::RunOutcome;
use adpilot_core::output::{AgentEvent, AgentOutput};
use adpilot_core::tools::ToolCall;
use async_trait::async_trait;
use colored::Colorize;
use tracing::debug;

/// Longest tool payload shown before truncation
const RESULT_PREVIEW_CHARS: usize = 200;

/// CLI output configuration
#[derive(Debug, Clone)]
pub struct CliOutputConfig {
    /// Show tool payloads and retry notices
    pub verbose: bool,
    /// Print run statistics after each answer
    pub show_stats: bool,
}

impl Default for CliOutputConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            show_stats: true,
        }
    }
}

/// CLI output handler that formats events for terminal display
pub struct CliOutputHandler {
    config: CliOutputConfig,
}

impl CliOutputHandler {
    /// Create a new CLI output handler
    pub fn new(config: CliOutputConfig) -> Self {
        Self { config }
    }

    fn format_call(call: &ToolCall) -> String {
        let args = match call.arguments.as_object() {
            Some(map) if map.is_empty() => String::new(),
            _ => call.arguments.to_string(),
        };
        format!("{}({})", call.name.bold(), args)
    }
}

/// Log line for a planning step; `iteration` is already 1-based
fn planning_message(iteration: u32) -> String {
    format!("🔄 Planning step {}", iteration)
}

/// Cut `text` to at most `max` characters, marking the cut
pub fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[async_trait]
impl AgentOutput for CliOutputHandler {
    async fn emit_event(
        &self,
        event: AgentEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        match event {
            AgentEvent::ExecutionStarted {
                user_message,
                max_iterations,
            } => {
                debug!("🚀 Starting run (max {} steps)", max_iterations);
                debug!("📝 Question: {}", user_message);
            }

            AgentEvent::PlanningStarted { iteration } => {
                debug!("{}", planning_message(iteration));
            }

            AgentEvent::ModelRetry { attempt, error } => {
                if self.config.verbose {
                    println!(
                        "{}",
                        format!("⚠️  Model call failed ({}), retry {}", error, attempt).yellow()
                    );
                }
            }

            AgentEvent::ToolExecutionStarted { call } => {
                println!("{} {}", "⏺".white(), Self::format_call(&call));
            }

            AgentEvent::ToolExecutionCompleted { result } => {
                let duration = result
                    .duration_ms
                    .map(|ms| format!(" ({}ms)", ms))
                    .unwrap_or_default();
                match result.error() {
                    None => {
                        println!("  {} {}{}", "⎿".green(), result.tool_name, duration.dimmed());
                        if self.config.verbose {
                            println!(
                                "    {}",
                                truncate(&result.content(), RESULT_PREVIEW_CHARS).dimmed()
                            );
                        }
                    }
                    Some(error) => {
                        println!(
                            "  {} {}{}: {}",
                            "⎿".red(),
                            result.tool_name,
                            duration.dimmed(),
                            error.to_string().red()
                        );
                    }
                }
            }

            AgentEvent::TokenUsageUpdated { token_usage: _ } => {
                // Totals are reported once the run completes
            }

            AgentEvent::ExecutionCompleted { outcome, iterations } => {
                match &outcome {
                    RunOutcome::Done => debug!("✅ Run completed"),
                    RunOutcome::Aborted(reason) => debug!("❌ Run aborted: {:?}", reason),
                }
                if self.config.show_stats {
                    println!("{}", format!("📈 Executed {} steps", iterations).dimmed());
                }
            }
        }

        Ok(())
    }
}
