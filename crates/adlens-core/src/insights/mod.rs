//! Insight Engine - confidence-scored marketing insights
//!
//! A registry of analyzers scans the aggregated metrics and surfaces the
//! signals worth acting on. Every insight carries the metric values behind
//! it and a deterministic confidence score.
//!
//! ## Built-in Insights
//!
//! - **FUN-001 Top Channel by ROAS**
//! - **FUN-002 Lowest Channel by ROAS**
//! - **SEO-001 High-Volume, Poorly Ranked Category**
//!
//! ## Usage
//!
//! ```rust,ignore
//! use adlens_core::insights::{AnalysisContext, InsightEngine};
//!
//! let engine = InsightEngine::new();
//! let insights = engine.generate(&AnalysisContext::new(&metrics, &config));
//! ```

pub mod confidence;
pub mod engine;
pub mod funnel;
pub mod seo_opportunity;
pub mod types;

pub use confidence::ConfidenceScale;
pub use engine::{generate, AnalysisContext, Analyzer, InsightEngine};
pub use funnel::{TopPerformerAnalyzer, UnderPerformerAnalyzer};
pub use seo_opportunity::SeoOpportunityAnalyzer;
pub use types::{
    format_count, format_metric, format_usd, Confidence, Insight, InsightFamily, InsightKind,
};
