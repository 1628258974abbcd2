//! # adpilot CLI
//!
//! Command-line interface for adpilot - ask questions about advertising
//! campaign performance.
//!
//! ## Usage
//!
//! - `adpilot` - Start interactive mode
//! - `adpilot "question"` - Answer a single question
//! - `adpilot tools` - Show available tools
//! - `adpilot check` - Run an offline self-check with a scripted model

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;
mod output;

use commands::{check_command, interactive_command, run_command, tools_command, RunSettings};
use config::CliConfigLoader;

/// adpilot - A tool-calling assistant for campaign performance questions
#[derive(Parser)]
#[command(name = "adpilot")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Ask questions about your advertising campaigns")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file or directory path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Protocol to use (mistral, openai, anthropic)
    #[arg(long)]
    protocol: Option<String>,

    /// API key override
    #[arg(long)]
    api_key: Option<String>,

    /// Base URL override
    #[arg(long)]
    base_url: Option<String>,

    /// Model name override
    #[arg(long)]
    model: Option<String>,

    /// Show tool payloads and retries
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short = 'd', long = "debug")]
    debug_output: bool,

    /// Maximum number of tool cycles per question
    #[arg(long)]
    max_iterations: Option<u32>,

    /// Per-tool timeout in milliseconds
    #[arg(long)]
    tool_timeout_ms: Option<u64>,

    /// Output trajectory file
    #[arg(long)]
    trajectory_file: Option<PathBuf>,

    /// The question to answer (if provided, runs in single-question mode)
    question: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show available tools
    Tools,

    /// Run an offline self-check (no API key needed)
    Check,
}

/// Build a configuration loader from CLI arguments
fn build_config_loader(cli: &Cli) -> CliConfigLoader {
    let mut loader = CliConfigLoader::new();

    if let Some(config_path) = &cli.config {
        loader = loader.with_config_override(config_path.clone());
    }

    if let Some(protocol) = &cli.protocol {
        loader = loader.with_protocol_override(protocol.clone());
    }

    if let Some(api_key) = &cli.api_key {
        loader = loader.with_api_key_override(api_key.clone());
    }

    if let Some(base_url) = &cli.base_url {
        loader = loader.with_base_url_override(base_url.clone());
    }

    if let Some(model) = &cli.model {
        loader = loader.with_model_override(model.clone());
    }

    loader
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    adpilot_core::init_tracing_with_debug(cli.verbose || cli.debug_output);

    let config_loader = build_config_loader(&cli);
    let settings = RunSettings {
        max_iterations: cli.max_iterations,
        tool_timeout_ms: cli.tool_timeout_ms,
        trajectory_file: cli.trajectory_file,
        verbose: cli.verbose,
    };

    match (cli.question, cli.command) {
        (Some(question), None) => run_command(question, config_loader, settings).await,
        (Some(_), Some(_)) => {
            tracing::error!("Error: Cannot specify both a question and a subcommand");
            std::process::exit(1);
        }
        (None, Some(Commands::Tools)) => tools_command().await,
        (None, Some(Commands::Check)) => check_command(settings.verbose).await,
        (None, None) => interactive_command(config_loader, settings).await,
    }
}
