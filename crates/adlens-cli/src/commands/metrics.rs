//! Metric and insight inspection commands
//!
//! These run the load, clean and analysis stages only; nothing is written.

use std::collections::BTreeMap;
use std::path::Path;

use adlens_core::clean::{clean, CleanOutcome};
use adlens_core::features::{aggregate, aggregate_window, standard_metrics};
use adlens_core::import::load_path;
use adlens_core::insights::{AnalysisContext, InsightEngine};
use adlens_core::{DateWindow, GroupKey, Insight, MetricSet, PipelineConfig};
use anyhow::{Context, Result};
use chrono::NaiveDate;

use super::fmt_ratio;

/// Load and clean an input file
pub fn load_clean(input: &Path, config: &PipelineConfig) -> Result<CleanOutcome> {
    let dataset =
        load_path(input).with_context(|| format!("Failed to read {}", input.display()))?;
    clean(&dataset, &config.cleaning.impute).context("Failed to clean dataset")
}

/// Build a date window from optional `--from` / `--to` bounds
pub fn parse_window(from: Option<&str>, to: Option<&str>) -> Result<Option<DateWindow>> {
    if from.is_none() && to.is_none() {
        return Ok(None);
    }
    let from_date = from
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .context("Invalid --from date format (use YYYY-MM-DD)")?
        .unwrap_or(NaiveDate::MIN);
    let to_date = to
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .context("Invalid --to date format (use YYYY-MM-DD)")?
        .unwrap_or(NaiveDate::MAX);

    if from_date > to_date {
        anyhow::bail!("--from {} is after --to {}", from_date, to_date);
    }
    Ok(Some(DateWindow::new(from_date, to_date)))
}

/// Aggregate one dimension, optionally restricted to a date window
pub fn compute_metrics(
    outcome: &CleanOutcome,
    key: GroupKey,
    window: Option<DateWindow>,
) -> BTreeMap<String, MetricSet> {
    match window {
        Some(w) => aggregate_window(&outcome.records, key, w),
        None => aggregate(&outcome.records, key),
    }
}

/// Show aggregated metrics for one dimension
pub fn cmd_metrics(
    input: &Path,
    config: &PipelineConfig,
    by: &str,
    window: Option<DateWindow>,
    json: bool,
) -> Result<()> {
    let key: GroupKey = by.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let outcome = load_clean(input, config)?;
    let groups = compute_metrics(&outcome, key, window);

    if json {
        println!("{}", serde_json::to_string_pretty(&groups)?);
        return Ok(());
    }

    println!("Metrics by {} ({} clean rows)\n", key, outcome.records.len());
    if groups.is_empty() {
        println!("No rows matched.");
        return Ok(());
    }

    println!(
        "{:<24} {:>6} {:>12} {:>12} {:>7} {:>9} {:>7} {:>10} {:>7}",
        "NAME", "ROWS", "SPEND", "REVENUE", "ROAS", "CAC", "CTR", "SEARCHES", "RANK"
    );
    println!("{}", "-".repeat(102));

    for (name, set) in &groups {
        println!(
            "{:<24} {:>6} {:>12.2} {:>12.2} {:>7} {:>9} {:>7} {:>10.0} {:>7}",
            super::truncate(name, 24),
            set.records,
            set.total_spend,
            set.total_revenue,
            fmt_ratio(set.roas),
            fmt_ratio(set.cac),
            fmt_ratio(set.ctr),
            set.total_search_volume,
            fmt_ratio(set.avg_search_rank),
        );
    }

    if outcome.discarded() > 0 {
        println!();
        println!("{} row(s) discarded during cleaning", outcome.discarded());
    }
    Ok(())
}

/// Generate ranked insights for an input file
pub fn compute_insights(input: &Path, config: &PipelineConfig) -> Result<Vec<Insight>> {
    let outcome = load_clean(input, config)?;
    let metrics = standard_metrics(&outcome.records);
    Ok(InsightEngine::new().generate(&AnalysisContext::new(&metrics, config)))
}

/// Show ranked insights without writing artifacts
pub fn cmd_insights(input: &Path, config: &PipelineConfig, json: bool) -> Result<()> {
    let insights = compute_insights(input, config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&insights)?);
        return Ok(());
    }

    if insights.is_empty() {
        println!("No insights met the reporting criteria.");
        return Ok(());
    }

    println!("Insights ({}):\n", insights.len());
    for insight in &insights {
        println!(
            "[{}] {}: {}  (confidence {})",
            insight.id,
            insight.title,
            insight.subject,
            insight.confidence.display_score()
        );
        if !insight.claim.is_empty() {
            println!("    {}", insight.claim);
        }
        println!("    {}", insight.confidence.justification);
        println!();
    }
    Ok(())
}
