//! Text → vector backends.
//!
//! [`EmbeddingClient`] is the seam the query pipeline depends on.
//! [`EmbeddingBackend`] picks one implementation at startup:
//!
//! - [`HttpEmbedder`] calls the external embedding service.
//! - [`LocalEmbedder`] runs a BERT sentence encoder in-process via candle.
//! - [`StubEmbedder`] produces deterministic hash-seeded vectors.

/// BERT encoder with mean pooling.
pub mod bert;
mod config;
/// Device selection (CPU / Metal / CUDA).
pub mod device;
mod error;
pub mod http;
pub mod local;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod stub;
/// Tokenizer loading helpers.
pub mod utils;

#[cfg(test)]
mod tests;

pub use config::{EmbeddingBackendKind, EmbeddingConfig};
pub use error::EmbeddingError;
pub use http::{HttpEmbedder, ServiceHealth};
pub use local::LocalEmbedder;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockEmbedder;
pub use stub::StubEmbedder;

use std::future::Future;

use tracing::info;

/// Converts text into a fixed-dimension vector.
pub trait EmbeddingClient: Send + Sync {
    /// Embeds one text. Implementations bound their own latency.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, EmbeddingError>> + Send;

    /// Output dimension, if known before the first call.
    fn dimension(&self) -> Option<usize>;

    /// Short name for logs and readiness output.
    fn backend_name(&self) -> &'static str;

    /// Whether the backend can serve embeddings right now. In-process backends are always ready.
    fn readiness(&self) -> impl Future<Output = EmbeddingReadiness> + Send {
        async { EmbeddingReadiness::Ready }
    }
}

/// Embedding backend state reported on `/ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingReadiness {
    /// Model loaded and serving.
    Ready,
    /// Service answers but has not loaded its model yet.
    NotLoaded,
    /// Service unreachable or returned an error.
    Unavailable,
}

impl EmbeddingReadiness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::NotLoaded => "not_loaded",
            Self::Unavailable => "unavailable",
        }
    }

    /// `NotLoaded` still counts: the service is up and will load on demand.
    pub fn is_available(&self) -> bool {
        !matches!(self, Self::Unavailable)
    }
}

impl std::fmt::Display for EmbeddingReadiness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Embedding backend chosen from configuration.
#[derive(Debug, Clone)]
pub enum EmbeddingBackend {
    Http(HttpEmbedder),
    Local(LocalEmbedder),
    Stub(StubEmbedder),
    #[cfg(any(test, feature = "mock"))]
    Mock(MockEmbedder),
}

impl EmbeddingBackend {
    /// Builds the configured backend. Loading a local model happens here.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let backend = match config.backend {
            EmbeddingBackendKind::Http => {
                Self::Http(HttpEmbedder::new(config.url.clone(), config.timeout)?)
            }
            EmbeddingBackendKind::Local => {
                let path = config
                    .model_path
                    .as_deref()
                    .ok_or_else(|| EmbeddingError::InvalidConfig {
                        reason: "local backend requires a model path".to_string(),
                    })?;
                Self::Local(LocalEmbedder::load(path, config.timeout)?)
            }
            EmbeddingBackendKind::Stub => Self::Stub(StubEmbedder::new(config.stub_dim)?),
        };

        info!(
            backend = backend.backend_name(),
            dimension = ?backend.dimension(),
            "Embedding backend ready"
        );
        Ok(backend)
    }

    /// The HTTP client, when this is the HTTP backend.
    pub fn as_http(&self) -> Option<&HttpEmbedder> {
        match self {
            Self::Http(embedder) => Some(embedder),
            _ => None,
        }
    }
}

impl EmbeddingClient for EmbeddingBackend {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        match self {
            Self::Http(e) => e.embed(text).await,
            Self::Local(e) => e.embed(text).await,
            Self::Stub(e) => e.embed(text).await,
            #[cfg(any(test, feature = "mock"))]
            Self::Mock(e) => e.embed(text).await,
        }
    }

    fn dimension(&self) -> Option<usize> {
        match self {
            Self::Http(e) => e.dimension(),
            Self::Local(e) => e.dimension(),
            Self::Stub(e) => e.dimension(),
            #[cfg(any(test, feature = "mock"))]
            Self::Mock(e) => e.dimension(),
        }
    }

    fn backend_name(&self) -> &'static str {
        match self {
            Self::Http(e) => e.backend_name(),
            Self::Local(e) => e.backend_name(),
            Self::Stub(e) => e.backend_name(),
            #[cfg(any(test, feature = "mock"))]
            Self::Mock(e) => e.backend_name(),
        }
    }

    async fn readiness(&self) -> EmbeddingReadiness {
        match self {
            Self::Http(e) => e.readiness().await,
            Self::Local(e) => e.readiness().await,
            Self::Stub(e) => e.readiness().await,
            #[cfg(any(test, feature = "mock"))]
            Self::Mock(e) => e.readiness().await,
        }
    }
}
