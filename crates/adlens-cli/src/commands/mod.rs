//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `config` - Config loading and inspection (show, path)
//! - `metrics` - Metric and insight inspection without writing artifacts
//! - `narrator` - Backend selection and connectivity test
//! - `prompts` - Prompt library management commands
//! - `run` - Full pipeline run and summary output

pub mod config;
pub mod metrics;
pub mod narrator;
pub mod prompts;
pub mod run;

// Re-export command functions for main.rs
pub use config::*;
pub use metrics::*;
pub use narrator::*;
pub use prompts::*;
pub use run::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Format an optional ratio for table output
pub fn fmt_ratio(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "-".to_string(),
    }
}
