//! Client for the remote embedding service.
//!
//! Contract: `POST {base}/embed` with `{"text", "normalize": true}` answers
//! `{"embedding": [...], "model": "...", "dim": N}`; `GET {base}/health`
//! answers `{"status", "model", "model_loaded"}`.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::error::EmbeddingError;
use super::{EmbeddingClient, EmbeddingReadiness};

/// Upper bound on a readiness probe, independent of the embed timeout.
const READINESS_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Serialize)]
struct EmbedRequest<'a> {
    text: &'a str,
    normalize: bool,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    dim: Option<usize>,
}

/// Body of the service's `/health` endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServiceHealth {
    pub status: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub model_loaded: Option<bool>,
}

/// Embeds text by calling the embedding service. No retries.
#[derive(Debug, Clone)]
pub struct HttpEmbedder {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpEmbedder {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, EmbeddingError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(EmbeddingError::InvalidConfig {
                reason: "embedding service URL is empty".to_string(),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EmbeddingError::InvalidConfig {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Probes `GET {base}/health`.
    pub async fn health(&self) -> Result<ServiceHealth, EmbeddingError> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }

    fn map_send_error(&self, err: reqwest::Error) -> EmbeddingError {
        if err.is_timeout() {
            EmbeddingError::Timeout {
                after: self.timeout,
            }
        } else {
            EmbeddingError::from(err)
        }
    }
}

impl EmbeddingClient for HttpEmbedder {
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let response = self
            .client
            .post(format!("{}/embed", self.base_url))
            .json(&EmbedRequest {
                text,
                normalize: true,
            })
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let body: EmbedResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                EmbeddingError::Timeout {
                    after: self.timeout,
                }
            } else {
                EmbeddingError::Malformed {
                    reason: e.to_string(),
                }
            }
        })?;

        if body.embedding.is_empty() {
            return Err(EmbeddingError::Empty);
        }
        if let Some(dim) = body.dim
            && dim != body.embedding.len()
        {
            return Err(EmbeddingError::Malformed {
                reason: format!(
                    "declared dim {dim} but embedding has {} components",
                    body.embedding.len()
                ),
            });
        }

        debug!(
            dim = body.embedding.len(),
            model = body.model.as_deref().unwrap_or("unknown"),
            "Received embedding"
        );
        Ok(body.embedding)
    }

    fn dimension(&self) -> Option<usize> {
        None
    }

    fn backend_name(&self) -> &'static str {
        "http"
    }

    async fn readiness(&self) -> EmbeddingReadiness {
        match tokio::time::timeout(READINESS_TIMEOUT, self.health()).await {
            Ok(Ok(health)) if health.model_loaded == Some(true) => EmbeddingReadiness::Ready,
            Ok(Ok(health)) => {
                debug!(status = %health.status, "Embedding service has no model loaded");
                EmbeddingReadiness::NotLoaded
            }
            Ok(Err(e)) => {
                debug!(url = %self.base_url, error = %e, "Embedding service health check failed");
                EmbeddingReadiness::Unavailable
            }
            Err(_) => {
                debug!(url = %self.base_url, "Embedding service health check timed out");
                EmbeddingReadiness::Unavailable
            }
        }
    }
}
