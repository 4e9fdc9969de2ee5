//! Data model for the analytics pipeline
//!
//! Rows move through three shapes:
//! - [`RawRecord`]: strings exactly as read from the source file
//! - [`CleanRecord`]: typed, imputed, validated and deduplicated
//! - [`MetricSet`]: per-group aggregation derived from clean rows

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Sentinel used for missing categorical values
pub const UNKNOWN: &str = "Unknown";

/// Canonical columns of the input schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Date,
    Channel,
    Category,
    Spend,
    Impressions,
    Clicks,
    Conversions,
    Revenue,
    SearchVolume,
    SearchRank,
}

impl Column {
    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Date => "date",
            Column::Channel => "channel",
            Column::Category => "category",
            Column::Spend => "spend",
            Column::Impressions => "impressions",
            Column::Clicks => "clicks",
            Column::Conversions => "conversions",
            Column::Revenue => "revenue",
            Column::SearchVolume => "search_volume",
            Column::SearchRank => "search_rank",
        }
    }

    /// Get all columns in snapshot order
    pub fn all() -> &'static [Column] {
        &[
            Column::Date,
            Column::Channel,
            Column::Category,
            Column::Spend,
            Column::Impressions,
            Column::Clicks,
            Column::Conversions,
            Column::Revenue,
            Column::SearchVolume,
            Column::SearchRank,
        ]
    }

    /// Numeric columns, coerced and imputed by the cleaner
    pub fn numeric() -> &'static [Column] {
        &[
            Column::Spend,
            Column::Impressions,
            Column::Clicks,
            Column::Conversions,
            Column::Revenue,
            Column::SearchVolume,
            Column::SearchRank,
        ]
    }

    /// Header spellings accepted for this column (lowercase)
    ///
    /// Includes the names used by the D2C export (`spend_usd`, `seo_category`,
    /// `first_purchase`, `avg_position`, ...).
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Column::Date => &["date", "day"],
            Column::Channel => &["channel"],
            Column::Category => &["category", "seo_category"],
            Column::Spend => &["spend", "spend_usd"],
            Column::Impressions => &["impressions"],
            Column::Clicks => &["clicks"],
            Column::Conversions => &["conversions", "first_purchase"],
            Column::Revenue => &["revenue", "revenue_usd"],
            Column::SearchVolume => &["search_volume", "monthly_search_volume"],
            Column::SearchRank => &["search_rank", "average_position", "avg_position"],
        }
    }

    /// Whether the source file must contain this column
    pub fn is_required(&self) -> bool {
        !matches!(self, Column::SearchVolume | Column::SearchRank)
    }

    /// Resolve a header cell to a canonical column
    pub fn from_header(header: &str) -> Option<Column> {
        let header = header.trim().trim_start_matches('\u{feff}').to_lowercase();
        Column::all()
            .iter()
            .copied()
            .find(|c| c.aliases().contains(&header.as_str()))
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row of source data, untyped
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    /// 1-based data row number in the source file (header excluded)
    pub row: usize,
    pub date: Option<String>,
    pub channel: Option<String>,
    pub category: Option<String>,
    pub spend: Option<String>,
    pub impressions: Option<String>,
    pub clicks: Option<String>,
    pub conversions: Option<String>,
    pub revenue: Option<String>,
    pub search_volume: Option<String>,
    pub search_rank: Option<String>,
}

impl RawRecord {
    pub fn new(row: usize) -> Self {
        Self {
            row,
            ..Default::default()
        }
    }

    fn slot(&mut self, column: Column) -> &mut Option<String> {
        match column {
            Column::Date => &mut self.date,
            Column::Channel => &mut self.channel,
            Column::Category => &mut self.category,
            Column::Spend => &mut self.spend,
            Column::Impressions => &mut self.impressions,
            Column::Clicks => &mut self.clicks,
            Column::Conversions => &mut self.conversions,
            Column::Revenue => &mut self.revenue,
            Column::SearchVolume => &mut self.search_volume,
            Column::SearchRank => &mut self.search_rank,
        }
    }

    /// Raw value of a column, `None` when the cell was empty or absent
    pub fn get(&self, column: Column) -> Option<&str> {
        let value = match column {
            Column::Date => &self.date,
            Column::Channel => &self.channel,
            Column::Category => &self.category,
            Column::Spend => &self.spend,
            Column::Impressions => &self.impressions,
            Column::Clicks => &self.clicks,
            Column::Conversions => &self.conversions,
            Column::Revenue => &self.revenue,
            Column::SearchVolume => &self.search_volume,
            Column::SearchRank => &self.search_rank,
        };
        value.as_deref()
    }

    /// Set a column value; blank strings are stored as missing
    pub fn set(&mut self, column: Column, value: &str) {
        let trimmed = value.trim();
        *self.slot(column) = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
    }

    /// Builder-style setter, mostly for tests
    pub fn with(mut self, column: Column, value: &str) -> Self {
        self.set(column, value);
        self
    }
}

/// Rows read from a source file plus the canonical columns its header provided
#[derive(Debug, Clone, Default)]
pub struct RawDataset {
    pub columns: BTreeSet<Column>,
    pub records: Vec<RawRecord>,
}

impl RawDataset {
    /// Required columns absent from the source header
    pub fn missing_required(&self) -> Vec<Column> {
        Column::all()
            .iter()
            .copied()
            .filter(|c| c.is_required() && !self.columns.contains(c))
            .collect()
    }
}

/// A typed, validated row. Every numeric field is finite and non-negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanRecord {
    /// ISO date when parseable, the raw text otherwise, `Unknown` when missing
    pub date: String,
    pub channel: String,
    pub category: String,
    pub spend: f64,
    pub impressions: f64,
    pub clicks: f64,
    pub conversions: f64,
    pub revenue: f64,
    pub search_volume: f64,
    pub search_rank: f64,
}

impl CleanRecord {
    /// Value of a numeric column (`None` for categorical columns)
    pub fn numeric(&self, column: Column) -> Option<f64> {
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

    /// The deduplication key tuple
    pub fn key(&self) -> (String, String, String) {
        (
            self.date.clone(),
            self.channel.clone(),
            self.category.clone(),
        )
    }

    /// Parsed date, if the stored value is ISO formatted
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()
    }
}

/// Dimension used to group clean records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    Channel,
    Category,
    Date,
}

impl GroupKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupKey::Channel => "channel",
            GroupKey::Category => "category",
            GroupKey::Date => "date",
        }
    }

    /// Group value of a record under this key
    pub fn value_of<'a>(&self, record: &'a CleanRecord) -> &'a str {
        match self {
            GroupKey::Channel => &record.channel,
            GroupKey::Category => &record.category,
            GroupKey::Date => &record.date,
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for GroupKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "channel" => Ok(GroupKey::Channel),
            "category" => Ok(GroupKey::Category),
            "date" => Ok(GroupKey::Date),
            _ => Err(format!(
                "Unknown group key: {}. Available: channel, category, date",
                s
            )),
        }
    }
}

/// Inclusive date range used to restrict an aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateWindow {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.from && date <= self.to
    }
}

/// Aggregated metrics for one group
///
/// Ratio metrics are `None` when their denominator is zero. Consumers must
/// treat `None` as "no signal", never as poor performance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSet {
    pub records: usize,
    pub total_spend: f64,
    pub total_impressions: f64,
    pub total_clicks: f64,
    pub total_conversions: f64,
    pub total_revenue: f64,
    pub total_search_volume: f64,
    pub avg_search_rank: Option<f64>,
    /// revenue / spend
    pub roas: Option<f64>,
    /// spend / conversions
    pub cac: Option<f64>,
    /// clicks / impressions
    pub ctr: Option<f64>,
    /// conversions / clicks
    pub conversion_rate: Option<f64>,
}

/// Per-row derived features written to the dataset snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub record: CleanRecord,
    pub ctr: Option<f64>,
    pub cac: Option<f64>,
    pub roas: Option<f64>,
}

/// Headline KPIs across the whole clean dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverallKpis {
    pub total_spend: f64,
    pub total_revenue: f64,
    pub overall_roas: Option<f64>,
    pub rows: usize,
}

/// Terminal status of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// All artifacts written with a generated narrative
    Success,
    /// All artifacts written, but the report is the deterministic fallback
    Degraded,
    /// The run aborted; previous artifacts are untouched
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::Degraded => "degraded",
            RunStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_from_header_aliases() {
        assert_eq!(Column::from_header("spend_usd"), Some(Column::Spend));
        assert_eq!(Column::from_header(" Revenue_USD "), Some(Column::Revenue));
        assert_eq!(Column::from_header("seo_category"), Some(Column::Category));
        assert_eq!(Column::from_header("first_purchase"), Some(Column::Conversions));
        assert_eq!(
            Column::from_header("monthly_search_volume"),
            Some(Column::SearchVolume)
        );
        assert_eq!(Column::from_header("avg_position"), Some(Column::SearchRank));
        assert_eq!(Column::from_header("\u{feff}date"), Some(Column::Date));
        assert_eq!(Column::from_header("campaign_id"), None);
    }

    #[test]
    fn test_raw_record_blank_is_missing() {
        let record = RawRecord::new(1)
            .with(Column::Channel, "  ")
            .with(Column::Spend, " 12.5 ");
        assert_eq!(record.get(Column::Channel), None);
        assert_eq!(record.get(Column::Spend), Some("12.5"));
    }

    #[test]
    fn test_missing_required() {
        let mut dataset = RawDataset::default();
        dataset.columns.extend(Column::all().iter().copied());
        dataset.columns.remove(&Column::SearchRank);
        assert!(dataset.missing_required().is_empty());

        dataset.columns.remove(&Column::Revenue);
        assert_eq!(dataset.missing_required(), vec![Column::Revenue]);
    }

    #[test]
    fn test_group_key_parse() {
        assert_eq!("Channel".parse::<GroupKey>().unwrap(), GroupKey::Channel);
        assert_eq!("category".parse::<GroupKey>().unwrap(), GroupKey::Category);
        assert!("region".parse::<GroupKey>().is_err());
    }
}
