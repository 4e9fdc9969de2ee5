//! Feature engineering: per-row ratios and per-group metric sets

use std::collections::BTreeMap;

use crate::models::{CleanRecord, DateWindow, FeatureRow, GroupKey, MetricSet, OverallKpis};

/// Metric sets for every dimension computed in a run
pub type MetricsByDimension = BTreeMap<GroupKey, BTreeMap<String, MetricSet>>;

/// `numerator / denominator`, undefined when the denominator is zero
pub fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        None
    } else {
        Some(numerator / denominator)
    }
}

/// Aggregate clean records by a grouping key
pub fn aggregate(records: &[CleanRecord], key: GroupKey) -> BTreeMap<String, MetricSet> {
    aggregate_iter(records.iter(), key)
}

/// Aggregate only the records whose date falls inside `window` (inclusive)
///
/// Records without a parseable ISO date are excluded.
pub fn aggregate_window(
    records: &[CleanRecord],
    key: GroupKey,
    window: DateWindow,
) -> BTreeMap<String, MetricSet> {
    let in_window = records
        .iter()
        .filter(|r| r.parsed_date().is_some_and(|d| window.contains(d)));
    aggregate_iter(in_window, key)
}

fn aggregate_iter<'a>(
    records: impl Iterator<Item = &'a CleanRecord>,
    key: GroupKey,
) -> BTreeMap<String, MetricSet> {
    let mut groups: BTreeMap<String, MetricSet> = BTreeMap::new();
    let mut rank_sums: BTreeMap<String, f64> = BTreeMap::new();

    for record in records {
        let name = key.value_of(record);
        let set = groups.entry(name.to_string()).or_default();
        set.records += 1;
        set.total_spend += record.spend;
        set.total_impressions += record.impressions;
        set.total_clicks += record.clicks;
        set.total_conversions += record.conversions;
        set.total_revenue += record.revenue;
        set.total_search_volume += record.search_volume;
        *rank_sums.entry(name.to_string()).or_insert(0.0) += record.search_rank;
    }

    for (name, set) in groups.iter_mut() {
        let rank_sum = rank_sums.get(name).copied().unwrap_or(0.0);
        set.avg_search_rank = ratio(rank_sum, set.records as f64);
        set.roas = ratio(set.total_revenue, set.total_spend);
        set.cac = ratio(set.total_spend, set.total_conversions);
        set.ctr = ratio(set.total_clicks, set.total_impressions);
        set.conversion_rate = ratio(set.total_conversions, set.total_clicks);
    }

    tracing::debug!(key = key.as_str(), groups = groups.len(), "Aggregated metrics");
    groups
}

/// Per-row CTR, CAC and ROAS for the dataset snapshot
pub fn row_features(records: &[CleanRecord]) -> Vec<FeatureRow> {
    records
        .iter()
        .map(|r| FeatureRow {
            record: r.clone(),
            ctr: ratio(r.clicks, r.impressions),
            cac: ratio(r.spend, r.conversions),
            roas: ratio(r.revenue, r.spend),
        })
        .collect()
}

/// Headline totals across every clean record
pub fn overall_kpis(records: &[CleanRecord]) -> OverallKpis {
    let total_spend: f64 = records.iter().map(|r| r.spend).sum();
    let total_revenue: f64 = records.iter().map(|r| r.revenue).sum();
    OverallKpis {
        total_spend,
        total_revenue,
        overall_roas: ratio(total_revenue, total_spend),
        rows: records.len(),
    }
}

/// Channel and category metrics, the two dimensions the insight analyzers read
pub fn standard_metrics(records: &[CleanRecord]) -> MetricsByDimension {
    let mut metrics = MetricsByDimension::new();
    metrics.insert(GroupKey::Channel, aggregate(records, GroupKey::Channel));
    metrics.insert(GroupKey::Category, aggregate(records, GroupKey::Category));
    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(date: &str, channel: &str, category: &str, spend: f64, revenue: f64) -> CleanRecord {
        CleanRecord {
            date: date.to_string(),
            channel: channel.to_string(),
            category: category.to_string(),
            spend,
            impressions: 1000.0,
            clicks: 50.0,
            conversions: 5.0,
            revenue,
            search_volume: 100.0,
            search_rank: 4.0,
        }
    }

    #[test]
    fn test_aggregate_by_channel() {
        let records = vec![
            record("2024-01-01", "A", "Gadgets", 60.0, 600.0),
            record("2024-01-02", "A", "Toys", 40.0, 432.0),
            record("2024-01-01", "B", "Gadgets", 5000.0, 6000.0),
        ];
        let metrics = aggregate(&records, GroupKey::Channel);

        let a = &metrics["A"];
        assert_eq!(a.records, 2);
        assert_eq!(a.total_spend, 100.0);
        assert_eq!(a.total_revenue, 1032.0);
        assert!((a.roas.unwrap() - 10.32).abs() < 1e-9);
        assert_eq!(a.cac, Some(10.0));
        assert_eq!(a.ctr, Some(0.05));
        assert_eq!(a.conversion_rate, Some(0.1));
        assert_eq!(a.total_search_volume, 200.0);
        assert_eq!(a.avg_search_rank, Some(4.0));

        assert!((metrics["B"].roas.unwrap() - 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_two_dimensions_in_one_run() {
        let records = vec![
            record("2024-01-01", "A", "Gadgets", 10.0, 20.0),
            record("2024-01-01", "B", "Gadgets", 10.0, 20.0),
        ];
        let metrics = standard_metrics(&records);
        assert_eq!(metrics[&GroupKey::Channel].len(), 2);
        assert_eq!(metrics[&GroupKey::Category].len(), 1);
        assert_eq!(metrics[&GroupKey::Category]["Gadgets"].total_spend, 20.0);
    }

    #[test]
    fn test_zero_denominators_are_undefined() {
        let mut r = record("2024-01-01", "A", "Gadgets", 0.0, 50.0);
        r.conversions = 0.0;
        r.clicks = 0.0;
        r.impressions = 0.0;
        let metrics = aggregate(&[r.clone()], GroupKey::Channel);

        let a = &metrics["A"];
        assert_eq!(a.roas, None);
        assert_eq!(a.cac, None);
        assert_eq!(a.ctr, None);
        assert_eq!(a.conversion_rate, None);

        let rows = row_features(&[r]);
        assert_eq!(rows[0].roas, None);
        assert_eq!(rows[0].cac, None);
        assert_eq!(rows[0].ctr, None);
    }

    #[test]
    fn test_undefined_serializes_as_null() {
        let set = MetricSet::default();
        let json = serde_json::to_value(&set).unwrap();
        assert!(json["roas"].is_null());
        assert!(json["cac"].is_null());
    }

    #[test]
    fn test_aggregate_window() {
        let records = vec![
            record("2024-01-01", "A", "Gadgets", 10.0, 20.0),
            record("2024-01-31", "A", "Toys", 10.0, 20.0),
            record("2024-02-01", "A", "Home", 10.0, 20.0),
            record("Unknown", "A", "Misc", 10.0, 20.0),
        ];
        let window = DateWindow::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        );
        let metrics = aggregate_window(&records, GroupKey::Channel, window);
        assert_eq!(metrics["A"].records, 2);
        assert_eq!(metrics["A"].total_spend, 20.0);
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate(&[], GroupKey::Category).is_empty());
        let kpis = overall_kpis(&[]);
        assert_eq!(kpis.rows, 0);
        assert_eq!(kpis.overall_roas, None);
    }

    #[test]
    fn test_overall_kpis() {
        let records = vec![
            record("2024-01-01", "A", "Gadgets", 100.0, 1032.0),
            record("2024-01-01", "B", "Gadgets", 5000.0, 6000.0),
        ];
        let kpis = overall_kpis(&records);
        assert_eq!(kpis.total_spend, 5100.0);
        assert_eq!(kpis.total_revenue, 7032.0);
        assert_eq!(kpis.overall_roas, Some(7032.0 / 5100.0));
        assert_eq!(kpis.rows, 2);
    }
}
