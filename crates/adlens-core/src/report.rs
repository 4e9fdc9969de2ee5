//! Report composition
//!
//! Turns ranked insights into an executive report. The narrative comes from
//! a [`TextGenerationPort`] when one is available and answers in time; any
//! failure produces a deterministic report built from the insight data alone,
//! flagged as degraded.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::ai::{parse_narrative, TextGenerationPort};
use crate::config::NarrativeConfig;
use crate::error::Result;
use crate::insights::{format_metric, format_usd, Insight};
use crate::models::OverallKpis;
use crate::prompts::{PromptId, PromptLibrary};

/// Reason recorded when there is nothing to narrate
pub const NO_INSIGHTS_REASON: &str = "no insights to narrate";
/// Reason recorded when no backend is configured
pub const NO_BACKEND_REASON: &str = "no text-generation backend configured";

/// Knobs for a single composition
#[derive(Debug, Clone)]
pub struct ComposeSettings {
    /// Upper bound on the generation call
    pub timeout: Duration,
    /// Dataset label passed to the prompt
    pub source: Option<String>,
}

impl Default for ComposeSettings {
    fn default() -> Self {
        Self::from_config(&NarrativeConfig::default())
    }
}

impl ComposeSettings {
    pub fn from_config(config: &NarrativeConfig) -> Self {
        Self {
            timeout: config.timeout(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// The final executive report
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub kpis: OverallKpis,
    /// Descending confidence
    pub insights: Vec<Insight>,
    pub executive_summary: String,
    pub recommendations: Vec<String>,
    /// Model that wrote the narrative; `None` for fallback reports
    pub model: Option<String>,
    /// True when the narrative is the deterministic fallback
    pub degraded: bool,
    pub degraded_reason: Option<String>,
}

/// Compose a report, narrating it with `narrator` when possible
///
/// Never fails: every generation problem becomes a degraded report.
pub async fn compose(
    insights: &[Insight],
    kpis: &OverallKpis,
    narrator: Option<&dyn TextGenerationPort>,
    settings: &ComposeSettings,
) -> Report {
    let ordered = ranked(insights);

    if ordered.is_empty() {
        return fallback_report(ordered, kpis, NO_INSIGHTS_REASON);
    }
    let Some(narrator) = narrator else {
        return fallback_report(ordered, kpis, NO_BACKEND_REASON);
    };

    let mut library = PromptLibrary::new();
    let prompt = match build_prompt(&mut library, &ordered, kpis, settings) {
        Ok(prompt) => prompt,
        Err(e) => return fallback_report(ordered, kpis, &format!("prompt unavailable: {}", e)),
    };

    info!(
        model = narrator.model(),
        host = narrator.host(),
        insights = ordered.len(),
        "Requesting executive narrative"
    );

    let outcome = tokio::time::timeout(settings.timeout, narrator.generate(&prompt)).await;
    let text = match outcome {
        Err(_) => {
            let reason = format!(
                "text generation timed out after {}s",
                settings.timeout.as_secs_f64()
            );
            return fallback_report(ordered, kpis, &reason);
        }
        Ok(Err(e)) => return fallback_report(ordered, kpis, &e.to_string()),
        Ok(Ok(text)) => text,
    };

    match parse_narrative(&text) {
        Ok(narrative) => Report {
            generated_at: Utc::now(),
            kpis: kpis.clone(),
            insights: ordered,
            executive_summary: narrative.executive_summary,
            recommendations: narrative.recommendations,
            model: Some(narrator.model().to_string()),
            degraded: false,
            degraded_reason: None,
        },
        Err(e) => fallback_report(ordered, kpis, &e.to_string()),
    }
}

/// Insights in descending confidence, ties by id
fn ranked(insights: &[Insight]) -> Vec<Insight> {
    let mut ordered = insights.to_vec();
    ordered.sort_by(|a, b| {
        b.confidence
            .score
            .total_cmp(&a.confidence.score)
            .then_with(|| a.id.cmp(&b.id))
    });
    ordered
}

/// Build the generation prompt from the `executive_report` template
pub fn build_prompt(
    library: &mut PromptLibrary,
    insights: &[Insight],
    kpis: &OverallKpis,
    settings: &ComposeSettings,
) -> Result<String> {
    let template = library.get(PromptId::ExecutiveReport)?;

    let kpi_text = format_kpis(kpis);
    let mut blocks = Vec::with_capacity(insights.len());
    for insight in insights {
        let block = serde_json::json!({
            "id": insight.id,
            "title": insight.title,
            "subject": insight.subject,
            "dimension": insight.dimension,
            "metrics": insight.metrics,
            "claim": insight.claim,
            "confidence": insight.confidence.score,
        });
        blocks.push(serde_json::to_string_pretty(&block)?);
    }
    let insight_text = blocks.join("\n\n");
    let source = settings.source.clone().unwrap_or_default();

    let mut vars = HashMap::new();
    vars.insert("kpis", kpi_text.as_str());
    vars.insert("insights", insight_text.as_str());
    vars.insert("source", source.as_str());

    Ok(template.render_combined(&vars))
}

fn format_kpis(kpis: &OverallKpis) -> String {
    format!(
        "- Total spend: {}\n- Total revenue: {}\n- Overall ROAS: {}\n- Rows analysed: {}",
        format_usd(kpis.total_spend),
        format_usd(kpis.total_revenue),
        format_roas(kpis.overall_roas),
        kpis.rows
    )
}

fn format_roas(roas: Option<f64>) -> String {
    match roas {
        Some(r) => format!("{:.2}x", r),
        None => "n/a".to_string(),
    }
}

/// Deterministic report assembled from insight data alone
pub fn fallback_report(insights: Vec<Insight>, kpis: &OverallKpis, reason: &str) -> Report {
    warn!(reason, "Using fallback executive report");

    let executive_summary = match insights.first() {
        None => "No insights met the reporting criteria for this dataset.".to_string(),
        Some(top) => format!(
            "{} insight(s) were identified across {} rows. The strongest signal is {} ({}): {}",
            insights.len(),
            kpis.rows,
            top.title,
            top.subject,
            top.claim
        ),
    };
    let recommendations = insights
        .iter()
        .map(|i| i.recommendation.clone())
        .filter(|r| !r.is_empty())
        .collect();

    Report {
        generated_at: Utc::now(),
        kpis: kpis.clone(),
        insights,
        executive_summary,
        recommendations,
        model: None,
        degraded: true,
        degraded_reason: Some(reason.to_string()),
    }
}

/// Render the narrative document
pub fn render_markdown(report: &Report) -> String {
    let mut out = String::new();
    out.push_str("# Executive Marketing Report\n\n");

    if report.degraded {
        let reason = report.degraded_reason.as_deref().unwrap_or("unknown reason");
        out.push_str(&format!(
            "> **Degraded report:** {}. This summary was assembled from the insight data without narrative generation.\n\n",
            reason
        ));
    }

    out.push_str(&format!(
        "_Generated {}",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if let Some(ref model) = report.model {
        out.push_str(&format!(" with {}", model));
    }
    out.push_str("_\n\n");

    let kpis = &report.kpis;
    out.push_str("## Headline KPIs\n\n");
    out.push_str("| Metric | Value |\n|---|---|\n");
    out.push_str(&format!("| Total spend | {} |\n", format_usd(kpis.total_spend)));
    out.push_str(&format!("| Total revenue | {} |\n", format_usd(kpis.total_revenue)));
    out.push_str(&format!("| Overall ROAS | {} |\n", format_roas(kpis.overall_roas)));
    out.push_str(&format!("| Rows analysed | {} |\n\n", kpis.rows));

    out.push_str("## Executive Summary\n\n");
    out.push_str(&report.executive_summary);
    out.push_str("\n\n");

    out.push_str("## Key Insights\n\n");
    if report.insights.is_empty() {
        out.push_str("No insights were generated for this dataset.\n\n");
    }
    for (i, insight) in report.insights.iter().enumerate() {
        out.push_str(&format!(
            "### {}. [{}] {}: {}\n\n",
            i + 1,
            insight.id,
            insight.title,
            insight.subject
        ));
        if !insight.claim.is_empty() {
            out.push_str(&format!("{}\n\n", insight.claim));
        }
        for (name, value) in &insight.metrics {
            out.push_str(&format!("- {}: {}\n", name, format_metric(*value)));
        }
        out.push_str(&format!(
            "- Confidence: {} ({})\n\n",
            insight.confidence.display_score(),
            insight.confidence.justification
        ));
    }

    out.push_str("## Recommendations\n\n");
    if report.recommendations.is_empty() {
        out.push_str("- No recommendations for this run.\n");
    }
    for rec in &report.recommendations {
        out.push_str(&format!("- {}\n", rec));
    }

    out
}
