//! Core types for the Insight Engine

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::GroupKey;

/// Kinds of insight the engine can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    /// Channel with the best return on ad spend
    TopPerformer,
    /// Channel with the worst return on ad spend
    UnderPerformer,
    /// Category with high search demand but poor ranking
    SeoOpportunity,
}

impl InsightKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightKind::TopPerformer => "top_performer",
            InsightKind::UnderPerformer => "under_performer",
            InsightKind::SeoOpportunity => "seo_opportunity",
        }
    }

    /// Stable insight id surfaced in the insight file
    pub fn id(&self) -> &'static str {
        match self {
            InsightKind::TopPerformer => "FUN-001",
            InsightKind::UnderPerformer => "FUN-002",
            InsightKind::SeoOpportunity => "SEO-001",
        }
    }

    pub fn family(&self) -> InsightFamily {
        match self {
            InsightKind::TopPerformer | InsightKind::UnderPerformer => InsightFamily::Funnel,
            InsightKind::SeoOpportunity => InsightFamily::Seo,
        }
    }
}

impl fmt::Display for InsightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Business area an insight belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsightFamily {
    Funnel,
    #[serde(rename = "SEO")]
    Seo,
}

impl InsightFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightFamily::Funnel => "Funnel",
            InsightFamily::Seo => "SEO",
        }
    }
}

impl fmt::Display for InsightFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Confidence attached to an insight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Confidence {
    /// Always within [0.0, 1.0]
    pub score: f64,
    /// Names the evidence behind the score
    pub justification: String,
}

impl Confidence {
    /// Score rounded to two decimals, for display only
    pub fn display_score(&self) -> String {
        format!("{:.2}", self.score)
    }
}

/// A confidence-scored finding about one channel or category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    /// Stable id, e.g. `FUN-001`
    pub id: String,
    pub kind: InsightKind,
    pub family: InsightFamily,
    pub title: String,
    /// Group name the insight is about
    pub subject: String,
    /// Dimension the subject belongs to
    pub dimension: GroupKey,
    /// Supporting metric values; `None` is an undefined ratio
    pub metrics: BTreeMap<String, Option<f64>>,
    pub claim: String,
    pub recommendation: String,
    pub confidence: Confidence,
}

impl Insight {
    pub fn new(
        kind: InsightKind,
        title: impl Into<String>,
        subject: impl Into<String>,
        dimension: GroupKey,
        confidence: Confidence,
    ) -> Self {
        Self {
            id: kind.id().to_string(),
            kind,
            family: kind.family(),
            title: title.into(),
            subject: subject.into(),
            dimension,
            metrics: BTreeMap::new(),
            claim: String::new(),
            recommendation: String::new(),
            confidence,
        }
    }

    /// Add a supporting metric value
    pub fn with_metric(mut self, name: impl Into<String>, value: Option<f64>) -> Self {
        self.metrics.insert(name.into(), value);
        self
    }

    pub fn with_claim(mut self, claim: impl Into<String>) -> Self {
        self.claim = claim.into();
        self
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = recommendation.into();
        self
    }
}

/// Render a metric value exactly as stored, `n/a` when undefined
pub fn format_metric(value: Option<f64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "n/a".to_string(),
    }
}

/// Format a currency amount with thousands separators, e.g. `$5,000.00`
pub fn format_usd(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::new();
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, cents)
}

/// Format a count with thousands separators, e.g. `47,732`
pub fn format_count(value: f64) -> String {
    let usd = format_usd(value.round());
    usd.trim_start_matches('$')
        .trim_end_matches(".00")
        .replace("-$", "-")
}
