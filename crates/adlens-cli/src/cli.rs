//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Adlens - Turn marketing exports into ranked insights
#[derive(Parser)]
#[command(name = "adlens")]
#[command(about = "Marketing analytics pipeline with executive reporting", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Pipeline config file (defaults to the user config, then built-in values)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline and write the report artifacts
    Run {
        /// Marketing CSV to analyze
        #[arg(short, long)]
        input: PathBuf,

        /// Directory for the artifacts
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Text-generation backend (overrides config and ADLENS_BACKEND)
        ///
        /// One of: ollama, openai_compatible, gemini, mock, none
        #[arg(long)]
        backend: Option<String>,

        /// Model override for the selected backend
        #[arg(long)]
        model: Option<String>,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show aggregated metrics for one dimension
    Metrics {
        /// Marketing CSV to analyze
        #[arg(short, long)]
        input: PathBuf,

        /// Group by: channel, category, date
        #[arg(long, default_value = "channel")]
        by: String,

        /// Only include rows on or after this date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Only include rows on or before this date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show ranked insights without writing artifacts
    Insights {
        /// Marketing CSV to analyze
        #[arg(short, long)]
        input: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage prompt templates
    Prompts {
        #[command(subcommand)]
        action: Option<PromptsAction>,
    },

    /// Inspect the pipeline configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },

    /// Text-generation backend utilities
    Narrator {
        #[command(subcommand)]
        action: NarratorAction,
    },
}

#[derive(Subcommand)]
pub enum PromptsAction {
    /// List all prompts and their override status
    List,

    /// Show the content of a prompt
    Show {
        /// Prompt ID (e.g., executive_report)
        id: String,
    },

    /// Show the override directory path
    Path,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,

    /// Show which config file is in use
    Path,
}

#[derive(Subcommand)]
pub enum NarratorAction {
    /// Check the configured backend and request a sample narrative
    Test {
        /// Text-generation backend (overrides config and ADLENS_BACKEND)
        #[arg(long)]
        backend: Option<String>,

        /// Model override for the selected backend
        #[arg(long)]
        model: Option<String>,
    },
}
