//! Adlens CLI - Marketing analytics pipeline
//!
//! Usage:
//!   adlens run --input CSV --output DIR    Run the pipeline, write artifacts
//!   adlens metrics --input CSV --by channel Show aggregated metrics
//!   adlens insights --input CSV            Show ranked insights
//!   adlens narrator test                   Check the text-generation backend

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use adlens_core::RunStatus;
use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Run {
            input,
            output,
            backend,
            model,
            json,
        } => {
            let config = commands::load_config(config_path)?;
            let narrator = commands::select_backend(&config, backend.as_deref(), model.as_deref());
            let summary = commands::cmd_run(&input, &output, &config, narrator.as_ref()).await;
            commands::print_summary(&summary, json)?;
            if summary.status == RunStatus::Failed {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Metrics {
            input,
            by,
            from,
            to,
            json,
        } => {
            let config = commands::load_config(config_path)?;
            let window = commands::parse_window(from.as_deref(), to.as_deref())?;
            commands::cmd_metrics(&input, &config, &by, window, json)
        }
        Commands::Insights { input, json } => {
            let config = commands::load_config(config_path)?;
            commands::cmd_insights(&input, &config, json)
        }
        Commands::Prompts { action } => match action {
            None | Some(PromptsAction::List) => commands::cmd_prompts_list(),
            Some(PromptsAction::Show { id }) => commands::cmd_prompts_show(&id),
            Some(PromptsAction::Path) => commands::cmd_prompts_path(),
        },
        Commands::Config { action } => match action {
            None | Some(ConfigAction::Show) => commands::cmd_config_show(config_path),
            Some(ConfigAction::Path) => commands::cmd_config_path(config_path),
        },
        Commands::Narrator { action } => match action {
            NarratorAction::Test { backend, model } => {
                let config = commands::load_config(config_path)?;
                commands::cmd_narrator_test(&config, backend.as_deref(), model.as_deref()).await
            }
        },
    }
}
