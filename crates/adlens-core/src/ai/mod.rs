//! Pluggable text-generation backend abstraction
//!
//! The report composer only depends on [`TextGenerationPort`]; the network
//! call behind it can fail and is never required for a run to complete.
//!
//! # Architecture
//!
//! - `TextGenerationPort` trait: the collaborator boundary
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `OllamaBackend`, `OpenAICompatibleBackend`,
//!   `GeminiBackend`, `MockBackend`
//!
//! # Configuration
//!
//! `ADLENS_BACKEND` (or `[narrative] backend` in the config) selects the
//! backend: ollama, openai_compatible, gemini, mock or none. Hosts, models and
//! credentials come from environment variables only:
//! - `OLLAMA_HOST`, `OLLAMA_MODEL`
//! - `OPENAI_COMPATIBLE_HOST`, `OPENAI_COMPATIBLE_MODEL`, `OPENAI_COMPATIBLE_API_KEY`
//! - `GEMINI_API_KEY`, `GEMINI_MODEL`, `GEMINI_HOST`

mod gemini;
mod mock;
mod ollama;
mod openai_compatible;
pub mod parsing;
pub mod types;

pub use gemini::{GeminiBackend, DEFAULT_GEMINI_HOST, DEFAULT_GEMINI_MODEL};
pub use mock::{MockBackend, MockMode, MOCK_NARRATIVE};
pub use ollama::OllamaBackend;
pub use openai_compatible::OpenAICompatibleBackend;
pub use parsing::parse_narrative;
pub use types::*;

use async_trait::async_trait;
use tracing::warn;

use crate::config::NarrativeConfig;
use crate::error::{Error, Result};

/// Environment variable that selects the backend
pub const BACKEND_ENV: &str = "ADLENS_BACKEND";

/// The text-generation collaborator boundary
///
/// Failures are [`Error::NarrativeUnavailable`] (unreachable, HTTP error)
/// or [`Error::MalformedResponse`] (answered, but unusable).
#[async_trait]
pub trait TextGenerationPort: Send + Sync {
    /// Generate text for a prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Check if the backend is available
    async fn health_check(&self) -> bool;

    /// Get the model name (for the report footer)
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete AI client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum AIClient {
    /// Ollama backend (HTTP API)
    Ollama(OllamaBackend),
    /// OpenAI-compatible backend (Docker Model Runner, vLLM, LocalAI, llama-server, etc.)
    OpenAICompatible(OpenAICompatibleBackend),
    /// Google Gemini backend
    Gemini(GeminiBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AIClient {
    /// Create a client from `ADLENS_BACKEND`, falling back to the configured backend
    ///
    /// Returns None when the backend is `none` or its required environment
    /// variables are not set.
    pub fn from_config(config: &NarrativeConfig) -> Option<Self> {
        let backend = std::env::var(BACKEND_ENV).unwrap_or_else(|_| config.backend.clone());
        Self::from_name(&backend)
    }

    /// Create a client for a named backend, reading its settings from the environment
    pub fn from_name(backend: &str) -> Option<Self> {
        let client = match backend.trim().to_lowercase().as_str() {
            "none" | "off" | "" => return None,
            "ollama" => OllamaBackend::from_env().map(AIClient::Ollama),
            "openai_compatible" | "openai" | "vllm" | "localai" | "llamacpp" => {
                OpenAICompatibleBackend::from_env().map(AIClient::OpenAICompatible)
            }
            "gemini" => GeminiBackend::from_env().map(AIClient::Gemini),
            "mock" => Some(AIClient::Mock(MockBackend::new())),
            _ => {
                warn!(backend = %backend, "Unknown backend, falling back to ollama");
                OllamaBackend::from_env().map(AIClient::Ollama)
            }
        };

        if client.is_none() {
            warn!(backend = %backend, "Backend is not configured in the environment; reports will be degraded");
        }
        client
    }

    /// Create an Ollama backend directly
    pub fn ollama(host: &str, model: &str) -> Self {
        AIClient::Ollama(OllamaBackend::new(host, model))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }

    /// Create a new instance with a different model
    pub fn with_model(&self, model: &str) -> Self {
        match self {
            AIClient::Ollama(b) => AIClient::Ollama(b.with_model(model)),
            AIClient::OpenAICompatible(b) => AIClient::OpenAICompatible(b.with_model(model)),
            AIClient::Gemini(b) => AIClient::Gemini(b.with_model(model)),
            AIClient::Mock(b) => AIClient::Mock(b.with_model(model)),
        }
    }

    /// Backend description for display
    pub fn info(&self) -> BackendInfo {
        let name = match self {
            AIClient::Ollama(_) => "ollama",
            AIClient::OpenAICompatible(_) => "openai_compatible",
            AIClient::Gemini(_) => "gemini",
            AIClient::Mock(_) => "mock",
        };
        BackendInfo {
            name,
            model: self.model().to_string(),
            host: self.host().to_string(),
        }
    }
}

// Implement TextGenerationPort for AIClient by delegating to the inner backend
#[async_trait]
impl TextGenerationPort for AIClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        match self {
            AIClient::Ollama(b) => b.generate(prompt).await,
            AIClient::OpenAICompatible(b) => b.generate(prompt).await,
            AIClient::Gemini(b) => b.generate(prompt).await,
            AIClient::Mock(b) => b.generate(prompt).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::Ollama(b) => b.health_check().await,
            AIClient::OpenAICompatible(b) => b.health_check().await,
            AIClient::Gemini(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::Ollama(b) => b.model(),
            AIClient::OpenAICompatible(b) => b.model(),
            AIClient::Gemini(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::Ollama(b) => b.host(),
            AIClient::OpenAICompatible(b) => b.host(),
            AIClient::Gemini(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}

/// Map a transport failure to `NarrativeUnavailable`
pub(crate) fn unreachable(backend: &str, err: reqwest::Error) -> Error {
    Error::NarrativeUnavailable(format!("{} request failed: {}", backend, err))
}

/// Turn a non-success HTTP status into `NarrativeUnavailable`
pub(crate) async fn check_status(
    backend: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let body = body.chars().take(200).collect::<String>();
    Err(Error::NarrativeUnavailable(format!(
        "{} returned {}: {}",
        backend, status, body
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_mock_and_none() {
        assert!(matches!(AIClient::from_name("mock"), Some(AIClient::Mock(_))));
        assert!(matches!(AIClient::from_name(" MOCK "), Some(AIClient::Mock(_))));
        assert!(AIClient::from_name("none").is_none());
    }

    #[test]
    fn test_mock_client_info() {
        let info = AIClient::mock().info();
        assert_eq!(info.name, "mock");
        assert_eq!(info.model, "mock");
    }

    #[tokio::test]
    async fn test_client_delegates() {
        let client = AIClient::Mock(MockBackend::fixed("hello"));
        assert_eq!(client.generate("x").await.unwrap(), "hello");
        assert!(client.health_check().await);
    }
}
