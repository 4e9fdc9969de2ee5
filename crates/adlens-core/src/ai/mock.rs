//! Mock backend for testing
//!
//! Useful for unit tests, offline runs and development without a running
//! LLM server. Each mode exercises one path of the report composer.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::TextGenerationPort;

/// Canned narrative returned in [`MockMode::Narrative`]
pub const MOCK_NARRATIVE: &str = r#"{
  "executive_summary": "Performance is concentrated in a small number of channels and categories. The insights below rank the strongest signals by confidence.",
  "recommendations": [
    "Rebalance budget toward the highest-ROAS channel.",
    "Prioritise SEO content for high-demand categories that rank poorly."
  ]
}"#;

/// How the mock answers
#[derive(Debug, Clone, PartialEq)]
pub enum MockMode {
    /// Valid narrative JSON
    Narrative,
    /// Fail as if the service were down
    Unavailable,
    /// Answer with text that is not a narrative
    Malformed,
    /// Answer with a fixed body
    Fixed(String),
    /// Sleep before answering (for timeout tests)
    Slow(Duration),
}

/// Mock text-generation backend
#[derive(Debug, Clone)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    pub mode: MockMode,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a new mock backend (healthy, valid narrative)
    pub fn new() -> Self {
        Self {
            healthy: true,
            mode: MockMode::Narrative,
        }
    }

    /// Create an unhealthy mock backend whose calls fail
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            mode: MockMode::Unavailable,
        }
    }

    pub fn malformed() -> Self {
        Self {
            healthy: true,
            mode: MockMode::Malformed,
        }
    }

    pub fn fixed(body: impl Into<String>) -> Self {
        Self {
            healthy: true,
            mode: MockMode::Fixed(body.into()),
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            healthy: true,
            mode: MockMode::Slow(delay),
        }
    }

    /// Create a new instance with a different model (no-op for mock)
    pub fn with_model(&self, _model: &str) -> Self {
        self.clone()
    }
}

#[async_trait]
impl TextGenerationPort for MockBackend {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        match &self.mode {
            MockMode::Narrative => Ok(MOCK_NARRATIVE.to_string()),
            MockMode::Unavailable => Err(Error::NarrativeUnavailable(
                "mock backend is unavailable".into(),
            )),
            MockMode::Malformed => Ok("Sorry, I can't produce JSON today.".to_string()),
            MockMode::Fixed(body) => Ok(body.clone()),
            MockMode::Slow(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(MOCK_NARRATIVE.to_string())
            }
        }
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::parsing::parse_narrative;

    #[tokio::test]
    async fn test_mock_narrative_parses() {
        let backend = MockBackend::new();
        assert!(backend.health_check().await);
        let text = backend.generate("prompt").await.unwrap();
        let narrative = parse_narrative(&text).unwrap();
        assert_eq!(narrative.recommendations.len(), 2);
    }

    #[tokio::test]
    async fn test_mock_unhealthy() {
        let backend = MockBackend::unhealthy();
        assert!(!backend.health_check().await);
        assert!(matches!(
            backend.generate("prompt").await,
            Err(Error::NarrativeUnavailable(_))
        ));
    }
}
