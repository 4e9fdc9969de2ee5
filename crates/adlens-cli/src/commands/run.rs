//! Pipeline run command

use std::path::Path;

use adlens_core::ai::AIClient;
use adlens_core::{execute, PipelineConfig, RunRequest, RunStatus, RunSummary, TextGenerationPort};
use anyhow::{Context, Result};

/// Run the pipeline end to end
///
/// Never fails itself: hard pipeline failures are reported through the
/// summary status so the caller can still print the discard tally.
pub async fn cmd_run(
    input: &Path,
    output: &Path,
    config: &PipelineConfig,
    narrator: Option<&AIClient>,
) -> RunSummary {
    let request = RunRequest::new(input, output);
    let narrator = narrator.map(|c| c as &dyn TextGenerationPort);
    execute(&request, config, narrator).await
}

/// Print a run summary for humans or as JSON
pub fn print_summary(summary: &RunSummary, json: bool) -> Result<()> {
    if json {
        let out = serde_json::to_string_pretty(summary).context("Failed to render summary")?;
        println!("{}", out);
        return Ok(());
    }

    let icon = match summary.status {
        RunStatus::Success => "✅",
        RunStatus::Degraded => "⚠️ ",
        RunStatus::Failed => "❌",
    };
    println!("{} Status: {}", icon, summary.status);
    println!(
        "   Rows discarded: {} ({} invalid, {} duplicates)",
        summary.discarded, summary.cleaning.invalid, summary.cleaning.duplicates
    );
    if summary.cleaning.imputed_values > 0 {
        println!("   Values imputed: {}", summary.cleaning.imputed_values);
    }
    println!("   Insights: {}", summary.insights);
    println!("   Degraded: {}", if summary.degraded { "yes" } else { "no" });
    if let Some(ref reason) = summary.degraded_reason {
        println!("   Reason: {}", reason);
    }
    if let Some(ref error) = summary.error {
        println!("   Error: {}", error);
    }

    if let Some(ref paths) = summary.artifacts {
        println!();
        println!("Artifacts:");
        println!("   {}", paths.snapshot.display());
        println!("   {}", paths.insights.display());
        println!("   {}", paths.report.display());
    }
    Ok(())
}
