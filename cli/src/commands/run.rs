//! Single question command

use super::{build_agent, ctrl_c_token, RunSettings};
use crate::config::CliConfigLoader;
use adpilot_core::{AgentRun, TrajectoryRecorder};
use anyhow::Result;
use colored::Colorize;
use std::sync::Arc;
use tracing::info;

/// Answer a single question and exit
pub async fn run_command(
    question: String,
    config_loader: CliConfigLoader,
    settings: RunSettings,
) -> Result<()> {
    info!("Answering: {}", question);

    let loaded = config_loader.load().await?;
    let recorder = settings
        .trajectory_file
        .as_ref()
        .map(|path| Arc::new(TrajectoryRecorder::with_file(path)));
    let agent = build_agent(loaded, &settings, recorder.clone())?;

    let cancel = ctrl_c_token();
    let result = agent.run(&question, &[], &cancel).await;

    // Save the trajectory even when the run failed
    if let Some(recorder) = &recorder {
        save_trajectory(recorder).await?;
    }

    let run = result?;
    print_answer(&run);
    Ok(())
}

/// Write the trajectory file and log what it contains
pub(crate) async fn save_trajectory(recorder: &TrajectoryRecorder) -> Result<()> {
    recorder.save().await?;
    if let Some(path) = recorder.file_path() {
        let summary = recorder.summary().await;
        info!(
            "📊 Trajectory saved to: {} ({} question(s), {} tool call(s), {} failed)",
            path.display(),
            summary.questions.len(),
            summary.tool_calls,
            summary.tool_failures
        );
    }
    Ok(())
}

/// Print the answer of a run, flagging incomplete ones
pub(crate) fn print_answer(run: &AgentRun) {
    println!();
    if run.is_complete() {
        println!("{}", run.answer);
    } else {
        println!("{}", run.answer.yellow());
    }
    if run.token_usage.total_tokens > 0 {
        println!(
            "{}",
            format!(
                "🪙 Tokens: {} input + {} output = {} total ⏱️  {:.2}s",
                run.token_usage.input_tokens,
                run.token_usage.output_tokens,
                run.token_usage.total_tokens,
                run.duration_ms as f64 / 1000.0
            )
            .dimmed()
        );
    }
}
