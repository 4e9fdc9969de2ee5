//! Pipeline configuration
//!
//! Every constant that shapes a user-visible number (imputation rules,
//! confidence reference scales, opportunity thresholds) lives here rather
//! than inline in the analyzers.
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. An explicit path (`--config`), or the override in the data dir
//!    (~/.local/share/adlens/config/pipeline.toml)
//! 2. Fall back to embedded defaults (compiled into binary)

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::Column;

/// Embedded default config (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../../../config/pipeline.toml");

/// How a missing numeric value is filled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputeRule {
    /// Fill with 0 (counters: spend, clicks, impressions, ...)
    Zero,
    /// Fill with the median of the observed values in the column
    Median,
}

/// Imputation rule per numeric column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImputePolicy {
    pub spend: ImputeRule,
    pub impressions: ImputeRule,
    pub clicks: ImputeRule,
    pub conversions: ImputeRule,
    pub revenue: ImputeRule,
    pub search_volume: ImputeRule,
    pub search_rank: ImputeRule,
}

impl Default for ImputePolicy {
    fn default() -> Self {
        Self {
            spend: ImputeRule::Zero,
            impressions: ImputeRule::Zero,
            clicks: ImputeRule::Zero,
            conversions: ImputeRule::Zero,
            revenue: ImputeRule::Zero,
            search_volume: ImputeRule::Zero,
            search_rank: ImputeRule::Median,
        }
    }
}

impl ImputePolicy {
    /// Rule for a numeric column; categorical columns are never imputed numerically
    pub fn rule_for(&self, column: Column) -> Option<ImputeRule> {
        match column {
            Column::Spend => Some(self.spend),
            Column::Impressions => Some(self.impressions),
            Column::Clicks => Some(self.clicks),
            Column::Conversions => Some(self.conversions),
            Column::Revenue => Some(self.revenue),
            Column::SearchVolume => Some(self.search_volume),
            Column::SearchRank => Some(self.search_rank),
            Column::Date | Column::Channel | Column::Category => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    pub impute: ImputePolicy,
}

/// Reference scales for the confidence heuristic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    /// Total spend at which a spend-backed claim reaches full confidence
    pub reference_spend: f64,
    /// Search volume at which a volume-backed claim reaches full confidence
    pub reference_volume: f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            reference_spend: 50_000.0,
            reference_volume: 50_000.0,
        }
    }
}

/// Keyword form of the opportunity volume floor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FloorRule {
    /// Median of the category search volumes in the current run
    Median,
}

/// Minimum search volume for the SEO opportunity insight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VolumeFloor {
    Fixed(f64),
    Rule(FloorRule),
}

impl VolumeFloor {
    /// Resolve the floor against the candidate volumes of this run
    pub fn resolve(&self, volumes: &[f64]) -> f64 {
        match self {
            VolumeFloor::Fixed(v) => *v,
            VolumeFloor::Rule(FloorRule::Median) => median(volumes).unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpportunityConfig {
    pub volume_floor: VolumeFloor,
    /// Average rank strictly greater than this counts as poorly ranked
    pub rank_threshold: f64,
}

impl Default for OpportunityConfig {
    fn default() -> Self {
        Self {
            volume_floor: VolumeFloor::Fixed(1000.0),
            rank_threshold: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrativeConfig {
    /// Backend name; `ADLENS_BACKEND` takes precedence
    pub backend: String,
    /// Upper bound on a single text-generation call
    pub timeout_secs: u64,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            backend: "ollama".to_string(),
            timeout_secs: 60,
        }
    }
}

impl NarrativeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Artifact file names, relative to the output directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub snapshot_file: String,
    pub insights_file: String,
    pub report_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            snapshot_file: "processed_data.csv".to_string(),
            insights_file: "insights.json".to_string(),
            report_file: "executive_report.md".to_string(),
        }
    }
}

/// Full pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub cleaning: CleaningConfig,
    pub confidence: ConfidenceConfig,
    pub opportunity: OpportunityConfig,
    pub narrative: NarrativeConfig,
    pub output: OutputConfig,
}

impl PipelineConfig {
    /// Load configuration, preferring an explicit path, then the data-dir
    /// override, then the embedded defaults
    ///
    /// Returns the config and the file it came from (`None` for embedded).
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            let content = fs::read_to_string(path).map_err(|e| {
                Error::Config(format!("Failed to read config {}: {}", path.display(), e))
            })?;
            return Ok((Self::parse(&content)?, Some(path.to_path_buf())));
        }

        if let Some(path) = default_config_path() {
            if path.exists() {
                let content = fs::read_to_string(&path)
                    .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;
                return Ok((Self::parse(&content)?, Some(path)));
            }
        }

        Ok((Self::parse(DEFAULT_CONFIG)?, None))
    }

    /// Parse and validate TOML content
    pub fn parse(content: &str) -> Result<Self> {
        let config: PipelineConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make confidence or thresholds meaningless
    pub fn validate(&self) -> Result<()> {
        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(Error::Config(format!("{} must be a positive number, got {}", name, v)))
            }
        };
        positive("confidence.reference_spend", self.confidence.reference_spend)?;
        positive("confidence.reference_volume", self.confidence.reference_volume)?;

        if let VolumeFloor::Fixed(v) = self.opportunity.volume_floor {
            if !v.is_finite() || v < 0.0 {
                return Err(Error::Config(format!(
                    "opportunity.volume_floor must be non-negative, got {}",
                    v
                )));
            }
        }
        if !self.opportunity.rank_threshold.is_finite() || self.opportunity.rank_threshold < 0.0 {
            return Err(Error::Config(format!(
                "opportunity.rank_threshold must be non-negative, got {}",
                self.opportunity.rank_threshold
            )));
        }
        if self.narrative.timeout_secs == 0 {
            return Err(Error::Config("narrative.timeout_secs must be at least 1".into()));
        }

        let out = &self.output;
        for name in [&out.snapshot_file, &out.insights_file, &out.report_file] {
            if name.is_empty() || name.contains('/') || name.contains('\\') {
                return Err(Error::Config(format!(
                    "Artifact names must be plain file names, got {:?}",
                    name
                )));
            }
        }
        if out.snapshot_file == out.insights_file
            || out.snapshot_file == out.report_file
            || out.insights_file == out.report_file
        {
            return Err(Error::Config("Artifact file names must be distinct".into()));
        }

        Ok(())
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("adlens").join("config").join("pipeline.toml"))
}

/// Median of a slice; `None` when empty. NaN values are ignored.
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_config() {
        let config = PipelineConfig::parse(DEFAULT_CONFIG).unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = PipelineConfig::parse(
            r#"
[confidence]
reference_spend = 2500

[opportunity]
volume_floor = "median"
"#,
        )
        .unwrap();

        assert_eq!(config.confidence.reference_spend, 2500.0);
        assert_eq!(config.confidence.reference_volume, 50_000.0);
        assert_eq!(
            config.opportunity.volume_floor,
            VolumeFloor::Rule(FloorRule::Median)
        );
        assert_eq!(config.opportunity.rank_threshold, 5.0);
        assert_eq!(config.cleaning.impute.search_rank, ImputeRule::Median);
    }

    #[test]
    fn test_impute_override() {
        let config = PipelineConfig::parse("[cleaning.impute]\nrevenue = \"median\"\n").unwrap();
        assert_eq!(
            config.cleaning.impute.rule_for(Column::Revenue),
            Some(ImputeRule::Median)
        );
        assert_eq!(
            config.cleaning.impute.rule_for(Column::Spend),
            Some(ImputeRule::Zero)
        );
        assert_eq!(config.cleaning.impute.rule_for(Column::Channel), None);
    }

    #[test]
    fn test_invalid_reference_scale() {
        let result = PipelineConfig::parse("[confidence]\nreference_spend = 0.0\n");
        assert!(matches!(result, Err(Error::Config(_))));

        let result = PipelineConfig::parse("[confidence]\nreference_volume = -5.0\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_output_names() {
        let result = PipelineConfig::parse("[output]\nreport_file = \"../report.md\"\n");
        assert!(matches!(result, Err(Error::Config(_))));

        let result = PipelineConfig::parse("[output]\nreport_file = \"insights.json\"\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_toml() {
        let result = PipelineConfig::parse("[confidence\nreference_spend = 1");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let result = PipelineConfig::load(Some(Path::new("/nonexistent/adlens.toml")));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_volume_floor_resolve() {
        assert_eq!(VolumeFloor::Fixed(10.0).resolve(&[1.0, 2.0]), 10.0);
        assert_eq!(
            VolumeFloor::Rule(FloorRule::Median).resolve(&[1.0, 9.0, 3.0]),
            3.0
        );
        assert_eq!(VolumeFloor::Rule(FloorRule::Median).resolve(&[]), 0.0);
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[4.0]), Some(4.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[f64::NAN, 1.0]), Some(1.0));
    }
}
