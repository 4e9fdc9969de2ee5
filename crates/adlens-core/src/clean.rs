//! Cleaner: turns raw rows into typed, validated, deduplicated records
//!
//! Every change to a row is one of:
//! - numeric imputation (per [`ImputePolicy`])
//! - categorical imputation (`Unknown`)
//! - a [`ValidationDiscard`] (negative value or duplicate key)
//!
//! Negative rows are rejected before deduplication, so a later valid row
//! with the same key survives an invalid first occurrence.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::{median, ImputePolicy, ImputeRule};
use crate::error::{Error, Result};
use crate::import::{parse_date, parse_number};
use crate::models::{CleanRecord, Column, RawDataset, RawRecord, UNKNOWN};

/// Why a row was dropped
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiscardReason {
    /// A numeric field held a negative value
    NegativeValue { field: Column, value: f64 },
    /// Same (date, channel, category) as an earlier kept row
    Duplicate { first_row: usize },
}

impl fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscardReason::NegativeValue { field, value } => {
                write!(f, "negative {} ({})", field, value)
            }
            DiscardReason::Duplicate { first_row } => {
                write!(f, "duplicate of row {}", first_row)
            }
        }
    }
}

/// A row-level, non-fatal rejection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationDiscard {
    /// 1-based data row in the source file
    pub row: usize,
    pub reason: DiscardReason,
}

/// Result of cleaning a dataset
#[derive(Debug, Clone, Default)]
pub struct CleanOutcome {
    pub records: Vec<CleanRecord>,
    pub discards: Vec<ValidationDiscard>,
    /// Number of values filled in per column, over kept rows
    pub imputed: BTreeMap<Column, usize>,
    pub input_rows: usize,
}

impl CleanOutcome {
    /// Total number of dropped rows
    pub fn discarded(&self) -> usize {
        self.discards.len()
    }

    pub fn duplicates(&self) -> usize {
        self.discards
            .iter()
            .filter(|d| matches!(d.reason, DiscardReason::Duplicate { .. }))
            .count()
    }

    pub fn invalid(&self) -> usize {
        self.discarded() - self.duplicates()
    }

    pub fn imputed_total(&self) -> usize {
        self.imputed.values().sum()
    }
}

/// Clean a raw dataset
///
/// Fails with [`Error::Schema`] when a required column is absent from the
/// source header. Everything else degrades to imputation or a discard.
pub fn clean(dataset: &RawDataset, policy: &ImputePolicy) -> Result<CleanOutcome> {
    let missing = dataset.missing_required();
    if !missing.is_empty() {
        let names: Vec<&str> = missing.iter().map(|c| c.as_str()).collect();
        return Err(Error::Schema(format!(
            "Missing required column(s): {}",
            names.join(", ")
        )));
    }

    let medians = column_medians(&dataset.records, policy);

    let mut outcome = CleanOutcome {
        input_rows: dataset.records.len(),
        ..Default::default()
    };
    let mut first_seen: HashMap<(String, String, String), usize> = HashMap::new();

    for raw in &dataset.records {
        let (record, imputed) = match build_record(raw, policy, &medians) {
            Ok(built) => built,
            Err(reason) => {
                debug!(row = raw.row, reason = %reason, "Discarding row");
                outcome.discards.push(ValidationDiscard {
                    row: raw.row,
                    reason,
                });
                continue;
            }
        };

        if let Some(&first_row) = first_seen.get(&record.key()) {
            debug!(row = raw.row, first_row, "Discarding duplicate row");
            outcome.discards.push(ValidationDiscard {
                row: raw.row,
                reason: DiscardReason::Duplicate { first_row },
            });
            continue;
        }
        first_seen.insert(record.key(), raw.row);

        for column in imputed {
            *outcome.imputed.entry(column).or_insert(0) += 1;
        }
        outcome.records.push(record);
    }

    info!(
        input = outcome.input_rows,
        kept = outcome.records.len(),
        invalid = outcome.invalid(),
        duplicates = outcome.duplicates(),
        imputed = outcome.imputed_total(),
        "Cleaning complete"
    );

    Ok(outcome)
}

/// Median of observed, non-negative values for every median-imputed column
fn column_medians(records: &[RawRecord], policy: &ImputePolicy) -> HashMap<Column, f64> {
    let mut medians = HashMap::new();
    for &column in Column::numeric() {
        if policy.rule_for(column) != Some(ImputeRule::Median) {
            continue;
        }
        let observed: Vec<f64> = records
            .iter()
            .filter_map(|r| r.get(column).and_then(parse_number))
            .filter(|v| *v >= 0.0)
            .collect();
        // An all-missing column has nothing to take a median of
        let value = median(&observed).unwrap_or(0.0);
        debug!(column = column.as_str(), median = value, "Computed imputation median");
        medians.insert(column, value);
    }
    medians
}

/// Build one typed record, returning the columns that were imputed
fn build_record(
    raw: &RawRecord,
    policy: &ImputePolicy,
    medians: &HashMap<Column, f64>,
) -> std::result::Result<(CleanRecord, Vec<Column>), DiscardReason> {
    let mut imputed = Vec::new();
    let mut numbers: HashMap<Column, f64> = HashMap::new();

    for &column in Column::numeric() {
        let value = match raw.get(column).and_then(parse_number) {
            Some(v) if v < 0.0 => {
                return Err(DiscardReason::NegativeValue { field: column, value: v });
            }
            Some(v) => v,
            None => {
                imputed.push(column);
                match policy.rule_for(column) {
                    Some(ImputeRule::Median) => medians.get(&column).copied().unwrap_or(0.0),
                    _ => 0.0,
                }
            }
        };
        numbers.insert(column, value);
    }

    let mut text = |column: Column| match raw.get(column) {
        Some(v) => v.to_string(),
        None => {
            imputed.push(column);
            UNKNOWN.to_string()
        }
    };
    let channel = text(Column::Channel);
    let category = text(Column::Category);
    let date = text(Column::Date);
    let date = match parse_date(&date) {
        Some(d) => d.format("%Y-%m-%d").to_string(),
        None => date,
    };

    let num = |column: Column| numbers.get(&column).copied().unwrap_or(0.0);
    let record = CleanRecord {
        date,
        channel,
        category,
        spend: num(Column::Spend),
        impressions: num(Column::Impressions),
        clicks: num(Column::Clicks),
        conversions: num(Column::Conversions),
        revenue: num(Column::Revenue),
        search_volume: num(Column::SearchVolume),
        search_rank: num(Column::SearchRank),
    };

    Ok((record, imputed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::load_csv;
    use std::collections::HashSet;

    const HEADER: &str =
        "date,channel,category,spend,impressions,clicks,conversions,revenue,search_volume,search_rank";

    fn dataset(rows: &[&str]) -> RawDataset {
        let csv = format!("{}\n{}\n", HEADER, rows.join("\n"));
        load_csv(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_missing_required_column_is_schema_error() {
        let csv = "date,channel,category,spend\n2024-01-01,Google,Gadgets,10\n";
        let raw = load_csv(csv.as_bytes()).unwrap();
        let result = clean(&raw, &ImputePolicy::default());
        match result {
            Err(Error::Schema(msg)) => {
                assert!(msg.contains("impressions"));
                assert!(msg.contains("revenue"));
            }
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_optional_search_columns_may_be_absent() {
        let csv = "date,channel,category,spend,impressions,clicks,conversions,revenue\n\
                   2024-01-01,Google,Gadgets,10,100,5,1,50\n";
        let raw = load_csv(csv.as_bytes()).unwrap();
        let outcome = clean(&raw, &ImputePolicy::default()).unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].search_volume, 0.0);
        assert_eq!(outcome.records[0].search_rank, 0.0);
    }

    #[test]
    fn test_numeric_imputation_zero_and_median() {
        let raw = dataset(&[
            "2024-01-01,Google,Gadgets,,100,5,1,50,1000,2",
            "2024-01-02,Google,Gadgets,10,100,5,1,50,1000,",
            "2024-01-03,Google,Gadgets,10,100,5,1,50,1000,8",
            "2024-01-04,Google,Gadgets,10,100,oops,1,50,1000,4",
        ]);
        let outcome = clean(&raw, &ImputePolicy::default()).unwrap();

        assert_eq!(outcome.records.len(), 4);
        // missing spend -> 0
        assert_eq!(outcome.records[0].spend, 0.0);
        // missing rank -> median of 2, 8, 4
        assert_eq!(outcome.records[1].search_rank, 4.0);
        // uncoercible clicks -> treated as missing -> 0
        assert_eq!(outcome.records[3].clicks, 0.0);

        assert_eq!(outcome.imputed.get(&Column::Spend), Some(&1));
        assert_eq!(outcome.imputed.get(&Column::SearchRank), Some(&1));
        assert_eq!(outcome.imputed.get(&Column::Clicks), Some(&1));
        assert_eq!(outcome.imputed_total(), 3);
    }

    #[test]
    fn test_categorical_imputation() {
        let raw = dataset(&[",,,10,100,5,1,50,1000,2"]);
        let outcome = clean(&raw, &ImputePolicy::default()).unwrap();
        let record = &outcome.records[0];
        assert_eq!(record.channel, UNKNOWN);
        assert_eq!(record.category, UNKNOWN);
        assert_eq!(record.date, UNKNOWN);
    }

    #[test]
    fn test_dates_are_normalized() {
        let raw = dataset(&[
            "01/15/2024,Google,Gadgets,10,100,5,1,50,1000,2",
            "week 3,Google,Gadgets,10,100,5,1,50,1000,2",
        ]);
        let outcome = clean(&raw, &ImputePolicy::default()).unwrap();
        assert_eq!(outcome.records[0].date, "2024-01-15");
        assert_eq!(outcome.records[1].date, "week 3");
    }

    #[test]
    fn test_duplicates_keep_first() {
        let raw = dataset(&[
            "2024-01-01,Google,Gadgets,10,100,5,1,50,1000,2",
            "2024-01-01,Google,Gadgets,99,100,5,1,50,1000,2",
            "01/01/2024,Google,Gadgets,77,100,5,1,50,1000,2",
            "2024-01-01,Meta,Gadgets,10,100,5,1,50,1000,2",
        ]);
        let outcome = clean(&raw, &ImputePolicy::default()).unwrap();

        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.records[0].spend, 10.0);
        assert_eq!(outcome.duplicates(), 2);
        assert_eq!(
            outcome.discards[0],
            ValidationDiscard {
                row: 2,
                reason: DiscardReason::Duplicate { first_row: 1 },
            }
        );
    }

    #[test]
    fn test_negative_rows_are_discarded_and_tallied() {
        let raw = dataset(&[
            "2024-01-01,Google,Gadgets,-10,100,5,1,50,1000,2",
            "2024-01-02,Google,Gadgets,10,-100,5,1,50,1000,2",
            "2024-01-03,Google,Gadgets,10,100,(5),1,50,1000,2",
            "2024-01-04,Google,Gadgets,10,100,5,1,-50,1000,2",
            "2024-01-05,Google,Gadgets,10,100,5,1,50,1000,2",
        ]);
        let outcome = clean(&raw, &ImputePolicy::default()).unwrap();

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.invalid(), 4);
        assert_eq!(outcome.discarded(), 4);
        assert_eq!(
            outcome.discards[0].reason,
            DiscardReason::NegativeValue {
                field: Column::Spend,
                value: -10.0
            }
        );
        assert_eq!(outcome.discards[2].row, 3);
    }

    #[test]
    fn test_invalid_first_occurrence_does_not_shadow_valid_duplicate() {
        let raw = dataset(&[
            "2024-01-01,Google,Gadgets,-10,100,5,1,50,1000,2",
            "2024-01-01,Google,Gadgets,10,100,5,1,50,1000,2",
        ]);
        let outcome = clean(&raw, &ImputePolicy::default()).unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].spend, 10.0);
        assert_eq!(outcome.invalid(), 1);
        assert_eq!(outcome.duplicates(), 0);
    }

    #[test]
    fn test_negative_duplicate_is_tallied_as_invalid() {
        // Negative check runs before dedup, so the reason is never Duplicate
        let raw = dataset(&[
            "2024-01-01,Google,Gadgets,10,100,5,1,50,1000,2",
            "2024-01-01,Google,Gadgets,10,100,5,1,-50,1000,2",
        ]);
        let outcome = clean(&raw, &ImputePolicy::default()).unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.invalid(), 1);
        assert_eq!(outcome.duplicates(), 0);
        assert_eq!(
            outcome.discards[0].reason,
            DiscardReason::NegativeValue {
                field: Column::Revenue,
                value: -50.0
            }
        );
    }

    #[test]
    fn test_negative_values_excluded_from_median() {
        let raw = dataset(&[
            "2024-01-01,Google,Gadgets,10,100,5,1,50,1000,-40",
            "2024-01-02,Google,Gadgets,10,100,5,1,50,1000,6",
            "2024-01-03,Google,Gadgets,10,100,5,1,50,1000,",
        ]);
        let outcome = clean(&raw, &ImputePolicy::default()).unwrap();
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.records[1].search_rank, 6.0);
    }

    #[test]
    fn test_output_invariants_hold_for_messy_input() {
        let raw = dataset(&[
            "2024-01-01,Google,Gadgets,$1,000.50,100,5,1,50,1000,2",
            ",,,,,,,,,",
            ",,,,,,,,,",
            "2024-01-01,Google,Gadgets,abc,-,5,1,50,1000,2",
            "2024-02-01,,Home Decor,,,,,,47732,40.4",
            "2024-02-01,,Home Decor,5,5,5,5,5,5,5",
            "2024-03-01,TikTok,Toys,inf,NaN,1e3,2,3,4,5",
        ]);
        let outcome = clean(&raw, &ImputePolicy::default()).unwrap();

        let mut keys = HashSet::new();
        for record in &outcome.records {
            assert!(!record.date.is_empty());
            assert!(!record.channel.is_empty());
            assert!(!record.category.is_empty());
            for &column in Column::numeric() {
                let v = record.numeric(column).unwrap();
                assert!(v.is_finite() && v >= 0.0, "{} = {}", column, v);
            }
            assert!(keys.insert(record.key()), "duplicate key {:?}", record.key());
        }
        assert_eq!(
            outcome.records.len() + outcome.discarded(),
            outcome.input_rows
        );
    }
}
