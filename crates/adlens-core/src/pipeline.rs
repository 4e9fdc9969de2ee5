//! Pipeline orchestration
//!
//! Loader → Cleaner → FeatureEngine → InsightEngine → ReportComposer →
//! artifact writer, run sequentially. A schema error, an unreadable input
//! or a failed artifact write aborts the run; a narrative failure only
//! degrades the report.

use std::fs;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{error, info};

use crate::ai::TextGenerationPort;
use crate::clean::clean;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::export::{
    snapshot_csv, utc_timestamp, write_artifacts, ArtifactPaths, ArtifactSet, CleaningSummary,
    InsightFile, SourceInfo,
};
use crate::features::{overall_kpis, row_features, standard_metrics};
use crate::import::load_csv;
use crate::insights::{AnalysisContext, InsightEngine};
use crate::models::RunStatus;
use crate::report::{compose, render_markdown, ComposeSettings};

/// What to run
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub input: PathBuf,
    pub output_dir: PathBuf,
}

impl RunRequest {
    pub fn new(input: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output_dir: output_dir.into(),
        }
    }
}

/// Outcome of a run, reported to the caller whether or not it succeeded
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub status: RunStatus,
    /// Rows dropped by the cleaner (0 when the run failed before cleaning)
    pub discarded: usize,
    pub cleaning: CleaningSummary,
    pub insights: usize,
    pub degraded: bool,
    pub degraded_reason: Option<String>,
    /// Error message for failed runs
    pub error: Option<String>,
    /// Artifact locations; `None` for failed runs
    pub artifacts: Option<ArtifactPaths>,
}

impl RunSummary {
    fn failed(message: String, cleaning: CleaningSummary) -> Self {
        Self {
            status: RunStatus::Failed,
            discarded: cleaning.discarded,
            cleaning,
            insights: 0,
            degraded: false,
            degraded_reason: None,
            error: Some(message),
            artifacts: None,
        }
    }
}

/// Run the full pipeline, returning the first hard failure as an error
pub async fn run_pipeline(
    request: &RunRequest,
    config: &PipelineConfig,
    narrator: Option<&dyn TextGenerationPort>,
) -> Result<RunSummary> {
    let mut tally = CleaningSummary::default();
    run_stages(request, config, narrator, &mut tally).await
}

/// Run the full pipeline; hard failures become [`RunStatus::Failed`]
pub async fn execute(
    request: &RunRequest,
    config: &PipelineConfig,
    narrator: Option<&dyn TextGenerationPort>,
) -> RunSummary {
    let mut tally = CleaningSummary::default();
    match run_stages(request, config, narrator, &mut tally).await {
        Ok(summary) => summary,
        Err(e) => {
            error!(error = %e, input = %request.input.display(), "Pipeline run failed");
            RunSummary::failed(e.to_string(), tally)
        }
    }
}

async fn run_stages(
    request: &RunRequest,
    config: &PipelineConfig,
    narrator: Option<&dyn TextGenerationPort>,
    tally: &mut CleaningSummary,
) -> Result<RunSummary> {
    info!(input = %request.input.display(), "Starting pipeline run");

    let bytes = fs::read(&request.input)?;
    let dataset = load_csv(bytes.as_slice())?;
    let source = SourceInfo::from_bytes(&request.input, &bytes, dataset.records.len());

    let outcome = clean(&dataset, &config.cleaning.impute)?;
    *tally = CleaningSummary::from(&outcome);

    let metrics = standard_metrics(&outcome.records);
    let kpis = overall_kpis(&outcome.records);

    let engine = InsightEngine::new();
    let insights = engine.generate(&AnalysisContext::new(&metrics, config));

    let settings = ComposeSettings::from_config(&config.narrative).with_source(
        request
            .input
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| request.input.display().to_string()),
    );
    let report = compose(&insights, &kpis, narrator, &settings).await;
    let status = if report.degraded {
        RunStatus::Degraded
    } else {
        RunStatus::Success
    };

    let insight_file = InsightFile {
        report_generated_utc: utc_timestamp(report.generated_at),
        source,
        status,
        degraded: report.degraded,
        degraded_reason: report.degraded_reason.clone(),
        kpis,
        cleaning: tally.clone(),
        insights: report.insights.clone(),
    };
    let artifacts = ArtifactSet {
        snapshot_csv: snapshot_csv(&row_features(&outcome.records))?,
        insights_json: insight_file.to_json()?,
        report_markdown: render_markdown(&report),
    };
    let paths = write_artifacts(&request.output_dir, &config.output, &artifacts)?;

    info!(
        status = status.as_str(),
        discarded = tally.discarded,
        insights = report.insights.len(),
        "Pipeline run complete"
    );

    Ok(RunSummary {
        status,
        discarded: tally.discarded,
        cleaning: tally.clone(),
        insights: report.insights.len(),
        degraded: report.degraded,
        degraded_reason: report.degraded_reason,
        error: None,
        artifacts: Some(paths),
    })
}
