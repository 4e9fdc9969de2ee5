//! Test utilities for adlens-core
//!
//! A mock Ollama server for backend and end-to-end tests, plus sample
//! datasets shaped like the D2C marketing export.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::ai::MOCK_NARRATIVE;

/// Sample dataset using the original D2C column names
///
/// Channel A: spend 100, revenue 1032 (ROAS 10.32).
/// Channel B: spend 5000, revenue 6000 (ROAS 1.2).
/// Home Decor: volume 47732, rank 40.4. Gadgets: volume 500, rank 2.0.
/// Row 4 duplicates row 3; row 5 has negative spend.
pub const SAMPLE_CSV: &str = "\
date,channel,seo_category,spend_usd,impressions,clicks,first_purchase,revenue_usd,monthly_search_volume,avg_position
2024-01-01,A,Home Decor,100,2000,80,8,1032,47732,40.4
2024-01-01,B,Gadgets,5000,100000,2500,120,6000,500,2.0
2024-01-02,B,Gadgets,,,,,,,
2024-01-02,B,Gadgets,1,1,1,1,1,1,1
2024-01-03,C,Toys,-50,100,10,1,20,300,8
";

/// Dataset where every channel has zero spend
pub const ZERO_SPEND_CSV: &str = "\
date,channel,category,spend,impressions,clicks,conversions,revenue,search_volume,search_rank
2024-01-01,A,Gadgets,0,1000,10,1,50,500,2.0
2024-01-01,B,Toys,0,1000,10,0,0,400,3.0
";

/// Write `content` to `dir/name` and return the path
pub fn write_csv(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("write test csv");
    path
}

/// How the mock server answers `/api/generate`
#[derive(Debug, Clone)]
pub enum MockGenerate {
    /// Valid narrative JSON in the `response` field
    Narrative,
    /// A fixed `response` body
    Text(String),
    /// HTTP 500
    ServerError,
}

/// Mock Ollama server for testing and development
pub struct MockOllamaServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockOllamaServer {
    /// Start the mock server on an available port, answering with a narrative
    pub async fn start() -> Self {
        Self::start_with(MockGenerate::Narrative).await
    }

    /// Start a mock server whose generate endpoint fails
    pub async fn start_failing() -> Self {
        Self::start_with(MockGenerate::ServerError).await
    }

    pub async fn start_with(mode: MockGenerate) -> Self {
        let app = Router::new()
            .route("/api/tags", get(handle_tags))
            .route("/api/generate", post(handle_generate))
            .with_state(Arc::new(mode));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock server");
        let addr = listener.local_addr().expect("mock server address");

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .ok();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockOllamaServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Ollama tags endpoint response (health check)
async fn handle_tags() -> Json<TagsResponse> {
    Json(TagsResponse {
        models: vec![ModelInfo {
            name: "llama3.2:latest".to_string(),
            size: 4_000_000_000,
        }],
    })
}

/// Ollama generate endpoint
async fn handle_generate(
    State(mode): State<Arc<MockGenerate>>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, StatusCode> {
    let response = match mode.as_ref() {
        MockGenerate::Narrative => MOCK_NARRATIVE.to_string(),
        MockGenerate::Text(text) => text.clone(),
        MockGenerate::ServerError => return Err(StatusCode::INTERNAL_SERVER_ERROR),
    };

    Ok(Json(GenerateResponse {
        model: request.model,
        response,
        done: true,
    }))
}

#[derive(Debug, Serialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Debug, Serialize)]
struct ModelInfo {
    name: String,
    size: u64,
}

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    model: String,
    #[allow(dead_code)]
    prompt: String,
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    model: String,
    response: String,
    done: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{parse_narrative, OllamaBackend, TextGenerationPort};
    use crate::Error;

    #[tokio::test]
    async fn test_mock_server_health_check() {
        let server = MockOllamaServer::start().await;
        let client = OllamaBackend::new(&server.url(), "test-model");

        assert!(client.health_check().await);
    }

    #[tokio::test]
    async fn test_mock_server_generate_narrative() {
        let server = MockOllamaServer::start().await;
        let client = OllamaBackend::new(&server.url(), "test-model");

        let text = client.generate("Write a report").await.unwrap();
        let narrative = parse_narrative(&text).unwrap();
        assert!(!narrative.executive_summary.is_empty());
    }

    #[tokio::test]
    async fn test_mock_server_error_status() {
        let server = MockOllamaServer::start_failing().await;
        let client = OllamaBackend::new(&server.url(), "test-model");

        let result = client.generate("Write a report").await;
        assert!(matches!(result, Err(Error::NarrativeUnavailable(_))));
    }

    #[tokio::test]
    async fn test_mock_server_stopped() {
        let mut server = MockOllamaServer::start().await;
        let url = server.url();
        server.stop();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let client = OllamaBackend::new(&url, "test-model");
        assert!(!client.health_check().await);
    }

    #[test]
    fn test_sample_csv_loads() {
        let dataset = crate::import::load_csv(SAMPLE_CSV.as_bytes()).unwrap();
        assert!(dataset.missing_required().is_empty());
        assert_eq!(dataset.records.len(), 5);
    }
}
