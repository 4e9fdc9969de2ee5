//! Text-generation response types
//!
//! Backend-agnostic; produced by [`super::parsing`].

use serde::{Deserialize, Serialize};

/// Narrative returned by the text-generation collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeResponse {
    /// Short executive summary paragraph
    pub executive_summary: String,
    /// One actionable recommendation per entry
    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// Backend description for display
#[derive(Debug, Clone, PartialEq)]
pub struct BackendInfo {
    /// Backend name as accepted by `ADLENS_BACKEND`
    pub name: &'static str,
    pub model: String,
    pub host: String,
}
