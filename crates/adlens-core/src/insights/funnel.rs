//! Funnel insights: best and worst channel by ROAS
//!
//! Channels with an undefined ROAS (zero spend) carry no signal and are
//! never candidates.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::models::{GroupKey, MetricSet};

use super::confidence::ConfidenceScale;
use super::engine::{AnalysisContext, Analyzer};
use super::types::{format_usd, Confidence, Insight, InsightKind};

/// Channels with a defined ROAS, paired with it
fn candidates(channels: &BTreeMap<String, MetricSet>) -> Vec<(&str, &MetricSet, f64)> {
    channels
        .iter()
        .filter_map(|(name, set)| {
            set.roas
                .filter(|r| r.is_finite())
                .map(|roas| (name.as_str(), set, roas))
        })
        .collect()
}

/// Higher spend first, then lexical name
fn tie_break(a: (&str, &MetricSet), b: (&str, &MetricSet)) -> Ordering {
    b.1.total_spend
        .total_cmp(&a.1.total_spend)
        .then_with(|| a.0.cmp(b.0))
}

/// Channel with the maximum defined ROAS
pub fn top_performer(channels: &BTreeMap<String, MetricSet>) -> Option<(&str, &MetricSet)> {
    candidates(channels)
        .into_iter()
        .min_by(|a, b| b.2.total_cmp(&a.2).then_with(|| tie_break((a.0, a.1), (b.0, b.1))))
        .map(|(name, set, _)| (name, set))
}

/// Channel with the minimum defined ROAS
pub fn under_performer(channels: &BTreeMap<String, MetricSet>) -> Option<(&str, &MetricSet)> {
    candidates(channels)
        .into_iter()
        .min_by(|a, b| a.2.total_cmp(&b.2).then_with(|| tie_break((a.0, a.1), (b.0, b.1))))
        .map(|(name, set, _)| (name, set))
}

fn spend_confidence(ctx: &AnalysisContext<'_>, set: &MetricSet) -> Confidence {
    Confidence {
        score: ConfidenceScale::spend(&ctx.config.confidence).score(set.total_spend),
        justification: format!(
            "Based on a total spend of {} for this channel.",
            format_usd(set.total_spend)
        ),
    }
}

fn with_channel_metrics(insight: Insight, set: &MetricSet) -> Insight {
    insight
        .with_metric("roas", set.roas)
        .with_metric("total_spend", Some(set.total_spend))
        .with_metric("total_revenue", Some(set.total_revenue))
        .with_metric("total_conversions", Some(set.total_conversions))
        .with_metric("cac", set.cac)
        .with_metric("ctr", set.ctr)
}

/// `FUN-001`: the channel with the best return on ad spend
pub struct TopPerformerAnalyzer;

impl TopPerformerAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TopPerformerAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for TopPerformerAnalyzer {
    fn id(&self) -> InsightKind {
        InsightKind::TopPerformer
    }

    fn name(&self) -> &'static str {
        "Top Channel by ROAS"
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Vec<Insight> {
        let Some(channels) = ctx.dimension(GroupKey::Channel) else {
            return vec![];
        };
        let Some((name, set)) = top_performer(channels) else {
            return vec![];
        };
        let roas = set.roas.unwrap_or_default();

        let insight = Insight::new(
            self.id(),
            self.name(),
            name,
            GroupKey::Channel,
            spend_confidence(ctx, set),
        )
        .with_claim(format!(
            "{} has the highest ROAS at {:.2}x on {} of spend.",
            name,
            roas,
            format_usd(set.total_spend)
        ))
        .with_recommendation(format!(
            "Consider shifting more budget to {} while its return holds.",
            name
        ));

        vec![with_channel_metrics(insight, set)]
    }
}

/// `FUN-002`: the channel with the worst return on ad spend
///
/// Only emitted when at least two channels have a defined ROAS.
pub struct UnderPerformerAnalyzer;

impl UnderPerformerAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for UnderPerformerAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for UnderPerformerAnalyzer {
    fn id(&self) -> InsightKind {
        InsightKind::UnderPerformer
    }

    fn name(&self) -> &'static str {
        "Lowest Channel by ROAS"
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Vec<Insight> {
        let Some(channels) = ctx.dimension(GroupKey::Channel) else {
            return vec![];
        };
        if candidates(channels).len() < 2 {
            return vec![];
        }
        let Some((name, set)) = under_performer(channels) else {
            return vec![];
        };
        if top_performer(channels).map(|(top, _)| top) == Some(name) {
            return vec![];
        }
        let roas = set.roas.unwrap_or_default();

        let insight = Insight::new(
            self.id(),
            self.name(),
            name,
            GroupKey::Channel,
            spend_confidence(ctx, set),
        )
        .with_claim(format!(
            "{} has the lowest ROAS at {:.2}x on {} of spend.",
            name,
            roas,
            format_usd(set.total_spend)
        ))
        .with_recommendation(format!(
            "Review targeting and creative on {} before adding budget.",
            name
        ));

        vec![with_channel_metrics(insight, set)]
    }
}
