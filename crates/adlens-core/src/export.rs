//! Artifact export
//!
//! A run produces three artifacts:
//! - the cleaned, feature-engineered dataset snapshot (CSV)
//! - the structured insight file (JSON)
//! - the executive report (Markdown)
//!
//! They are written as one unit: everything is rendered into a staging
//! directory inside the output directory, then renamed into place. If any
//! rename fails the previous artifact set is restored.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::clean::CleanOutcome;
use crate::config::OutputConfig;
use crate::error::{Error, Result};
use crate::insights::Insight;
use crate::models::{Column, FeatureRow, OverallKpis, RunStatus};

/// Where the input came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub path: String,
    /// Hex SHA-256 of the input file
    pub sha256: String,
    /// Data rows read (header excluded)
    pub rows: usize,
}

impl SourceInfo {
    /// Fingerprint the bytes already read from `path`
    pub fn from_bytes(path: &Path, bytes: &[u8], rows: usize) -> Self {
        Self {
            path: path.display().to_string(),
            sha256: sha256_hex(bytes),
            rows,
        }
    }
}

/// Hex-encoded SHA-256 digest
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Cleaning tally surfaced in the insight file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleaningSummary {
    pub input_rows: usize,
    pub kept_rows: usize,
    pub discarded: usize,
    pub invalid: usize,
    pub duplicates: usize,
    pub imputed_values: usize,
}

impl From<&CleanOutcome> for CleaningSummary {
    fn from(outcome: &CleanOutcome) -> Self {
        Self {
            input_rows: outcome.input_rows,
            kept_rows: outcome.records.len(),
            discarded: outcome.discarded(),
            invalid: outcome.invalid(),
            duplicates: outcome.duplicates(),
            imputed_values: outcome.imputed_total(),
        }
    }
}

/// The structured insight file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightFile {
    pub report_generated_utc: String,
    pub source: SourceInfo,
    pub status: RunStatus,
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded_reason: Option<String>,
    pub kpis: OverallKpis,
    pub cleaning: CleaningSummary,
    /// Descending confidence
    pub insights: Vec<Insight>,
}

impl InsightFile {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// RFC 3339 UTC timestamp used in artifacts
pub fn utc_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Render the dataset snapshot: clean columns plus ctr, cac and roas
///
/// Undefined ratios are written as empty cells.
pub fn snapshot_csv(rows: &[FeatureRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header: Vec<&str> = Column::all().iter().map(|c| c.as_str()).collect();
    header.extend(["ctr", "cac", "roas"]);
    wtr.write_record(&header)?;

    let cell = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();
    for row in rows {
        let r = &row.record;
        wtr.write_record([
            r.date.clone(),
            r.channel.clone(),
            r.category.clone(),
            r.spend.to_string(),
            r.impressions.to_string(),
            r.clicks.to_string(),
            r.conversions.to_string(),
            r.revenue.to_string(),
            r.search_volume.to_string(),
            r.search_rank.to_string(),
            cell(row.ctr),
            cell(row.cac),
            cell(row.roas),
        ])?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| Error::InvalidData(format!("Failed to flush snapshot: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| Error::InvalidData(format!("Snapshot is not UTF-8: {}", e)))
}

/// Rendered artifact contents
#[derive(Debug, Clone)]
pub struct ArtifactSet {
    pub snapshot_csv: String,
    pub insights_json: String,
    pub report_markdown: String,
}

/// Final locations of the written artifacts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactPaths {
    pub snapshot: PathBuf,
    pub insights: PathBuf,
    pub report: PathBuf,
}

impl ArtifactPaths {
    pub fn resolve(output_dir: &Path, names: &OutputConfig) -> Self {
        Self {
            snapshot: output_dir.join(&names.snapshot_file),
            insights: output_dir.join(&names.insights_file),
            report: output_dir.join(&names.report_file),
        }
    }
}

fn artifact_error(action: &str, path: &Path, err: io::Error) -> Error {
    Error::ArtifactWrite(format!("Failed to {} {}: {}", action, path.display(), err))
}

/// Write all three artifacts as one unit
pub fn write_artifacts(
    output_dir: &Path,
    names: &OutputConfig,
    artifacts: &ArtifactSet,
) -> Result<ArtifactPaths> {
    write_artifacts_with(output_dir, names, artifacts, |_| Ok(()))
}

/// `write_artifacts` with a hook run before each file is committed
fn write_artifacts_with(
    output_dir: &Path,
    names: &OutputConfig,
    artifacts: &ArtifactSet,
    before_commit: impl Fn(&Path) -> io::Result<()>,
) -> Result<ArtifactPaths> {
    fs::create_dir_all(output_dir).map_err(|e| artifact_error("create", output_dir, e))?;

    let staging = tempfile::Builder::new()
        .prefix(".adlens-staging-")
        .tempdir_in(output_dir)
        .map_err(|e| artifact_error("create staging dir in", output_dir, e))?;

    let files = [
        (&names.snapshot_file, &artifacts.snapshot_csv),
        (&names.insights_file, &artifacts.insights_json),
        (&names.report_file, &artifacts.report_markdown),
    ];

    for (name, content) in &files {
        let staged = staging.path().join(name.as_str());
        fs::write(&staged, content.as_bytes()).map_err(|e| artifact_error("write", &staged, e))?;
    }
    debug!(staging = %staging.path().display(), "Staged artifacts");

    // (target, backup of the previous artifact if there was one)
    let mut committed: Vec<(PathBuf, Option<PathBuf>)> = Vec::new();
    for (name, _) in &files {
        let target = output_dir.join(name.as_str());
        let staged = staging.path().join(name.as_str());
        let backup = staging.path().join(format!("{}.previous", name));

        let result = commit_one(&staged, &target, &backup, &before_commit);
        match result {
            Ok(had_previous) => committed.push((target, had_previous.then_some(backup))),
            Err(e) => {
                warn!(target = %target.display(), error = %e, "Artifact commit failed, rolling back");
                let unrestored = rollback(&committed);
                let mut err = artifact_error("commit", &target, e);
                if !unrestored.is_empty() || backup.exists() {
                    // Backups live in the staging dir, so it must outlive this run
                    let kept = staging.keep();
                    warn!(staging = %kept.display(), "Kept staging dir with previous artifacts");
                    if let Error::ArtifactWrite(msg) = &mut err {
                        for line in &unrestored {
                            msg.push_str("; ");
                            msg.push_str(line);
                        }
                    }
                }
                return Err(err);
            }
        }
    }

    let paths = ArtifactPaths::resolve(output_dir, names);
    info!(output = %output_dir.display(), "Artifacts written");
    Ok(paths)
}

/// Move the previous artifact aside, then rename the staged one in
///
/// Returns whether a previous artifact existed. On error nothing has changed
/// for this target.
fn commit_one(
    staged: &Path,
    target: &Path,
    backup: &Path,
    before_commit: &impl Fn(&Path) -> io::Result<()>,
) -> io::Result<bool> {
    before_commit(target)?;

    let had_previous = target.exists();
    if had_previous {
        fs::rename(target, backup)?;
    }
    if let Err(e) = fs::rename(staged, target) {
        if had_previous {
            if let Err(restore) = fs::rename(backup, target) {
                warn!(target = %target.display(), error = %restore, "Failed to restore artifact");
                return Err(io::Error::new(
                    e.kind(),
                    format!(
                        "{}; previous artifact left at {}: {}",
                        e,
                        backup.display(),
                        restore
                    ),
                ));
            }
        }
        return Err(e);
    }
    Ok(had_previous)
}

/// Undo committed renames, restoring previous artifacts
///
/// Returns one message per previous artifact that could not be put back.
fn rollback(committed: &[(PathBuf, Option<PathBuf>)]) -> Vec<String> {
    let mut unrestored = Vec::new();
    for (target, backup) in committed.iter().rev() {
        if let Err(e) = fs::remove_file(target) {
            warn!(target = %target.display(), error = %e, "Failed to remove new artifact");
        }
        if let Some(backup) = backup {
            if let Err(e) = fs::rename(backup, target) {
                warn!(target = %target.display(), error = %e, "Failed to restore previous artifact");
                unrestored.push(format!(
                    "previous {} left at {}: {}",
                    target.display(),
                    backup.display(),
                    e
                ));
            }
        }
    }
    unrestored
}
