//! SEO Opportunity Insight
//!
//! Finds the content category with the most search demand among those that
//! rank poorly: total volume at or above the floor, average rank strictly
//! worse than the threshold.

use std::collections::BTreeMap;

use crate::models::{GroupKey, MetricSet};

use super::confidence::ConfidenceScale;
use super::engine::{AnalysisContext, Analyzer};
use super::types::{format_count, Confidence, Insight, InsightKind};

/// `SEO-001`: high-volume, poorly ranked category
pub struct SeoOpportunityAnalyzer;

impl SeoOpportunityAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SeoOpportunityAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Qualifying category with the highest volume (ties: lexical name)
pub fn best_opportunity<'a>(
    categories: &'a BTreeMap<String, MetricSet>,
    volume_floor: f64,
    rank_threshold: f64,
) -> Option<(&'a str, &'a MetricSet)> {
    categories
        .iter()
        .filter(|(_, set)| {
            set.total_search_volume >= volume_floor
                && set.avg_search_rank.is_some_and(|rank| rank > rank_threshold)
        })
        .min_by(|(a_name, a), (b_name, b)| {
            b.total_search_volume
                .total_cmp(&a.total_search_volume)
                .then_with(|| a_name.cmp(b_name))
        })
        .map(|(name, set)| (name.as_str(), set))
}

impl Analyzer for SeoOpportunityAnalyzer {
    fn id(&self) -> InsightKind {
        InsightKind::SeoOpportunity
    }

    fn name(&self) -> &'static str {
        "High-Volume, Poorly Ranked Category"
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Vec<Insight> {
        let Some(categories) = ctx.dimension(GroupKey::Category) else {
            return vec![];
        };

        let opportunity = &ctx.config.opportunity;
        let volumes: Vec<f64> = categories.values().map(|s| s.total_search_volume).collect();
        let floor = opportunity.volume_floor.resolve(&volumes);

        let Some((name, set)) = best_opportunity(categories, floor, opportunity.rank_threshold)
        else {
            tracing::debug!(floor, threshold = opportunity.rank_threshold, "No SEO opportunity");
            return vec![];
        };
        let rank = set.avg_search_rank.unwrap_or_default();

        let confidence = Confidence {
            score: ConfidenceScale::volume(&ctx.config.confidence).score(set.total_search_volume),
            justification: format!(
                "Based on a total search volume of {} for this category.",
                format_count(set.total_search_volume)
            ),
        };

        let insight = Insight::new(self.id(), self.name(), name, GroupKey::Category, confidence)
            .with_metric("total_search_volume", Some(set.total_search_volume))
            .with_metric("avg_search_rank", set.avg_search_rank)
            .with_metric("total_revenue", Some(set.total_revenue))
            .with_metric("roas", set.roas)
            .with_claim(format!(
                "{} draws {} searches but ranks {:.1} on average.",
                name,
                format_count(set.total_search_volume),
                rank
            ))
            .with_recommendation(format!(
                "Invest in SEO content for {} to capture existing demand.",
                name
            ));

        vec![insight]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FloorRule, PipelineConfig, VolumeFloor};
    use crate::features::MetricsByDimension;

    fn category(volume: f64, rank: Option<f64>) -> MetricSet {
        MetricSet {
            records: 1,
            total_search_volume: volume,
            avg_search_rank: rank,
            ..Default::default()
        }
    }

    fn metrics(categories: &[(&str, f64, f64)]) -> MetricsByDimension {
        let mut by_category = BTreeMap::new();
        for (name, volume, rank) in categories {
            by_category.insert(name.to_string(), category(*volume, Some(*rank)));
        }
        let mut metrics = MetricsByDimension::new();
        metrics.insert(GroupKey::Category, by_category);
        metrics
    }

    fn run(metrics: &MetricsByDimension, config: &PipelineConfig) -> Vec<Insight> {
        SeoOpportunityAnalyzer::new().analyze(&AnalysisContext::new(metrics, config))
    }

    #[test]
    fn test_only_poorly_ranked_high_volume_qualifies() {
        let m = metrics(&[("Home Decor", 47732.0, 40.4), ("Gadgets", 500.0, 2.0)]);
        let insights = run(&m, &PipelineConfig::default());

        assert_eq!(insights.len(), 1);
        let insight = &insights[0];
        assert_eq!(insight.id, "SEO-001");
        assert_eq!(insight.subject, "Home Decor");
        assert_eq!(insight.metrics["total_search_volume"], Some(47732.0));
        assert_eq!(insight.metrics["avg_search_rank"], Some(40.4));
        assert_eq!(insight.confidence.score, 47732.0 / 50_000.0);
        assert_eq!(
            insight.confidence.justification,
            "Based on a total search volume of 47,732 for this category."
        );
    }

    #[test]
    fn test_well_ranked_category_never_qualifies() {
        let m = metrics(&[("Gadgets", 900_000.0, 2.0), ("Toys", 900_000.0, 5.0)]);
        assert!(run(&m, &PipelineConfig::default()).is_empty());
    }

    #[test]
    fn test_highest_volume_wins_then_name() {
        let m = metrics(&[
            ("B", 5000.0, 10.0),
            ("A", 5000.0, 12.0),
            ("C", 4000.0, 50.0),
        ]);
        let insights = run(&m, &PipelineConfig::default());
        assert_eq!(insights[0].subject, "A");
    }

    #[test]
    fn test_floor_is_inclusive() {
        let m = metrics(&[("Edge", 1000.0, 6.0)]);
        assert_eq!(run(&m, &PipelineConfig::default()).len(), 1);
    }

    #[test]
    fn test_median_floor() {
        let m = metrics(&[
            ("Low", 100.0, 30.0),
            ("Mid", 2000.0, 30.0),
            ("High", 9000.0, 3.0),
        ]);
        let mut config = PipelineConfig::default();
        config.opportunity.volume_floor = VolumeFloor::Rule(FloorRule::Median);

        let insights = run(&m, &config);
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].subject, "Mid");
    }

    #[test]
    fn test_undefined_rank_does_not_qualify() {
        let mut m = MetricsByDimension::new();
        let mut by_category = BTreeMap::new();
        by_category.insert("Ghost".to_string(), category(90_000.0, None));
        m.insert(GroupKey::Category, by_category);
        assert!(run(&m, &PipelineConfig::default()).is_empty());
    }
}
