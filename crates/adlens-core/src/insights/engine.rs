//! Insight Engine - runs the registered analyzers over aggregated metrics

use crate::config::PipelineConfig;
use crate::features::MetricsByDimension;
use crate::models::{GroupKey, MetricSet};

use super::types::{Insight, InsightKind};
use super::{SeoOpportunityAnalyzer, TopPerformerAnalyzer, UnderPerformerAnalyzer};

use std::collections::BTreeMap;

/// Context provided to insight analyzers
pub struct AnalysisContext<'a> {
    /// Metric sets per dimension for this run
    pub metrics: &'a MetricsByDimension,
    /// Confidence scales and opportunity thresholds
    pub config: &'a PipelineConfig,
}

impl<'a> AnalysisContext<'a> {
    pub fn new(metrics: &'a MetricsByDimension, config: &'a PipelineConfig) -> Self {
        Self { metrics, config }
    }

    /// Metric sets for one dimension; `None` when it was not computed
    pub fn dimension(&self, key: GroupKey) -> Option<&'a BTreeMap<String, MetricSet>> {
        self.metrics.get(&key)
    }
}

/// Trait for insight analyzers
///
/// Analyzers are pure: the same context always yields the same insights.
pub trait Analyzer: Send + Sync {
    /// Kind of insight this analyzer produces
    fn id(&self) -> InsightKind;

    /// Human-readable name
    fn name(&self) -> &'static str;

    /// Inspect the metrics and produce zero or more insights
    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Vec<Insight>;
}

/// The main insight engine that orchestrates analysis
pub struct InsightEngine {
    analyzers: Vec<Box<dyn Analyzer>>,
}

impl Default for InsightEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl InsightEngine {
    /// Create a new insight engine with the built-in analyzers
    pub fn new() -> Self {
        let mut engine = Self { analyzers: vec![] };

        engine.register(Box::new(TopPerformerAnalyzer::new()));
        engine.register(Box::new(UnderPerformerAnalyzer::new()));
        engine.register(Box::new(SeoOpportunityAnalyzer::new()));

        engine
    }

    /// Create an engine with no analyzers registered
    pub fn empty() -> Self {
        Self { analyzers: vec![] }
    }

    /// Register an insight analyzer
    pub fn register(&mut self, analyzer: Box<dyn Analyzer>) {
        self.analyzers.push(analyzer);
    }

    /// Run every analyzer and order the results
    ///
    /// Ordered by descending confidence, then by insight id.
    pub fn generate(&self, ctx: &AnalysisContext<'_>) -> Vec<Insight> {
        let mut all = vec![];

        for analyzer in &self.analyzers {
            let insights = analyzer.analyze(ctx);
            tracing::debug!(
                analyzer = analyzer.id().as_str(),
                count = insights.len(),
                "Insight analysis complete"
            );
            all.extend(insights);
        }

        all.sort_by(|a, b| {
            b.confidence
                .score
                .total_cmp(&a.confidence.score)
                .then_with(|| a.id.cmp(&b.id))
        });

        tracing::info!(insights = all.len(), "Generated insights");
        all
    }

    /// Get list of registered insight kinds
    pub fn insight_kinds(&self) -> Vec<InsightKind> {
        self.analyzers.iter().map(|a| a.id()).collect()
    }
}

/// Run the built-in analyzers over `metrics`
pub fn generate(metrics: &MetricsByDimension, config: &PipelineConfig) -> Vec<Insight> {
    InsightEngine::new().generate(&AnalysisContext::new(metrics, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::standard_metrics;
    use crate::insights::types::Confidence;
    use crate::models::CleanRecord;

    struct FixedAnalyzer {
        kind: InsightKind,
        score: f64,
    }

    impl Analyzer for FixedAnalyzer {
        fn id(&self) -> InsightKind {
            self.kind
        }

        fn name(&self) -> &'static str {
            "Fixed"
        }

        fn analyze(&self, _ctx: &AnalysisContext<'_>) -> Vec<Insight> {
            vec![Insight::new(
                self.kind,
                "Fixed",
                "X",
                GroupKey::Channel,
                Confidence {
                    score: self.score,
                    justification: String::new(),
                },
            )]
        }
    }

    fn record(channel: &str, category: &str, spend: f64, revenue: f64) -> CleanRecord {
        CleanRecord {
            date: "2024-01-01".to_string(),
            channel: channel.to_string(),
            category: category.to_string(),
            spend,
            impressions: 1000.0,
            clicks: 10.0,
            conversions: 2.0,
            revenue,
            search_volume: 47732.0,
            search_rank: 40.4,
        }
    }

    #[test]
    fn test_engine_creation() {
        let kinds = InsightEngine::new().insight_kinds();
        assert!(kinds.contains(&InsightKind::TopPerformer));
        assert!(kinds.contains(&InsightKind::UnderPerformer));
        assert!(kinds.contains(&InsightKind::SeoOpportunity));
    }

    #[test]
    fn test_empty_metrics_yield_no_insights() {
        let metrics = MetricsByDimension::new();
        let config = PipelineConfig::default();
        assert!(generate(&metrics, &config).is_empty());
    }

    #[test]
    fn test_ordering_by_confidence_then_id() {
        let metrics = MetricsByDimension::new();
        let config = PipelineConfig::default();
        let ctx = AnalysisContext::new(&metrics, &config);

        let mut engine = InsightEngine::empty();
        engine.register(Box::new(FixedAnalyzer {
            kind: InsightKind::SeoOpportunity,
            score: 0.5,
        }));
        engine.register(Box::new(FixedAnalyzer {
            kind: InsightKind::UnderPerformer,
            score: 0.9,
        }));
        engine.register(Box::new(FixedAnalyzer {
            kind: InsightKind::TopPerformer,
            score: 0.5,
        }));

        let ids: Vec<String> = engine.generate(&ctx).into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["FUN-002", "FUN-001", "SEO-001"]);
    }

    #[test]
    fn test_generate_is_deterministic() {
        let records = vec![
            record("A", "Home Decor", 100.0, 1032.0),
            record("B", "Gadgets", 5000.0, 6000.0),
            record("C", "Toys", 333.3, 1000.0),
        ];
        let metrics = standard_metrics(&records);
        let config = PipelineConfig::default();

        let first = generate(&metrics, &config);
        for _ in 0..10 {
            let again = generate(&metrics, &config);
            assert_eq!(first, again);
            for (a, b) in first.iter().zip(again.iter()) {
                assert_eq!(a.confidence.score.to_bits(), b.confidence.score.to_bits());
            }
        }
        assert!(!first.is_empty());
    }
}
