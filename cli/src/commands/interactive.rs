//! Interactive conversation mode

use super::run::{print_answer, save_trajectory};
use super::{build_agent, RunSettings};
use crate::config::CliConfigLoader;
use adpilot_core::{AgentError, ConversationTurn, TrajectoryRecorder};
use anyhow::Result;
use colored::Colorize;
use std::sync::Arc;
use std::future::Future;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio_util::sync::CancellationToken;

/// Start an interactive session that keeps conversation history between questions
pub async fn interactive_command(
    config_loader: CliConfigLoader,
    settings: RunSettings,
) -> Result<()> {
    let loaded = config_loader.load().await?;
    let recorder = settings
        .trajectory_file
        .as_ref()
        .map(|path| Arc::new(TrajectoryRecorder::with_file(path)));
    let agent = build_agent(loaded, &settings, recorder.clone())?;

    println!("{}", "📣 adpilot - ask about your campaigns".bold());
    println!(
        "{}",
        format!(
            "Up to {} tool steps per question. Type 'exit' or 'quit' to leave, 'clear' to forget the conversation.",
            agent.config().max_iterations
        )
        .dimmed()
    );

    let mut history: Vec<ConversationTurn> = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"\n> ").await?;
        stdout.flush().await?;

        // Ctrl-C at the prompt ends the session
        let Some(line) = next_question(&mut lines, ctrl_c()).await? else {
            break;
        };
        let question = line.trim();
        match question {
            "" => continue,
            "exit" | "quit" => break,
            "clear" => {
                history.clear();
                println!("{}", "History cleared.".dimmed());
                continue;
            }
            _ => {}
        }

        // Ctrl-C cancels the current question, not the session
        let cancel = CancellationToken::new();
        let result = tokio::select! {
            result = agent.run(question, &history, &cancel) => result,
            _ = tokio::signal::ctrl_c() => {
                cancel.cancel();
                Err(AgentError::Cancelled)
            }
        };

        match result {
            Ok(run) => {
                print_answer(&run);
                history = run.history();
            }
            Err(AgentError::Cancelled) => println!("{}", "Cancelled.".yellow()),
            Err(e) => println!("{}", format!("❌ {}", e).red()),
        }
    }

    if let Some(recorder) = &recorder {
        save_trajectory(recorder).await?;
    }

    println!("\n👋 Goodbye!");
    Ok(())
}

/// Next line typed at the prompt; `None` on end of input or when `interrupt` fires
async fn next_question<R, I>(lines: &mut Lines<R>, interrupt: I) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
    I: Future<Output = ()>,
{
    tokio::select! {
        biased;
        _ = interrupt => Ok(None),
        line = lines.next_line() => Ok(line?),
    }
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed
async fn ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
