//! Adlens Core Library
//!
//! Shared functionality for the adlens marketing insight tool:
//! - CSV import with column aliasing for D2C exports
//! - Cleaning: schema checks, imputation, validation and de-duplication
//! - Feature engineering (ROAS, CAC, CTR, conversion rate) per dimension
//! - Rule-based insight engine with confidence scoring
//! - Pluggable text-generation backends (Ollama, OpenAI-compatible, Gemini)
//! - Prompt library for customizable report prompts
//! - Report composition with a deterministic degraded fallback
//! - Atomic artifact export

pub mod ai;
pub mod clean;
pub mod config;
pub mod error;
pub mod export;
pub mod features;
pub mod import;
pub mod insights;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod report;

/// Test utilities including mock Ollama server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{
    AIClient, BackendInfo, GeminiBackend, MockBackend, NarrativeResponse, OllamaBackend,
    OpenAICompatibleBackend, TextGenerationPort,
};
pub use clean::{clean, CleanOutcome, DiscardReason, ValidationDiscard};
pub use config::{NarrativeConfig, OutputConfig, PipelineConfig};
pub use error::{Error, Result};
pub use export::{ArtifactPaths, CleaningSummary, InsightFile, SourceInfo};
pub use features::{aggregate, aggregate_window, overall_kpis, MetricsByDimension};
pub use insights::{Confidence, Insight, InsightEngine, InsightFamily, InsightKind};
pub use models::{Column, DateWindow, GroupKey, MetricSet, OverallKpis, RunStatus};
pub use pipeline::{execute, run_pipeline, RunRequest, RunSummary};
pub use prompts::{Prompt, PromptId, PromptInfo, PromptLibrary};
pub use report::{compose, render_markdown, Report};
