use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::error::EmbeddingError;

/// Which [`super::EmbeddingBackend`] to construct at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmbeddingBackendKind {
    /// Remote embedding service over HTTP.
    #[default]
    Http,
    /// In-process BERT model loaded with candle.
    Local,
    /// Deterministic hash-seeded vectors.
    Stub,
}

impl EmbeddingBackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbeddingBackendKind::Http => "http",
            EmbeddingBackendKind::Local => "local",
            EmbeddingBackendKind::Stub => "stub",
        }
    }
}

impl fmt::Display for EmbeddingBackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmbeddingBackendKind {
    type Err = EmbeddingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(EmbeddingBackendKind::Http),
            "local" => Ok(EmbeddingBackendKind::Local),
            "stub" => Ok(EmbeddingBackendKind::Stub),
            other => Err(EmbeddingError::InvalidConfig {
                reason: format!("unknown embedding backend '{other}'"),
            }),
        }
    }
}

/// Everything needed to build an embedding backend.
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackendKind,
    /// Base URL for [`EmbeddingBackendKind::Http`].
    pub url: String,
    /// Model directory for [`EmbeddingBackendKind::Local`].
    pub model_path: Option<PathBuf>,
    pub timeout: Duration,
    /// Output dimension for [`EmbeddingBackendKind::Stub`].
    pub stub_dim: usize,
}

impl EmbeddingConfig {
    /// Config for a stub backend of the given dimension.
    pub fn stub(dim: usize) -> Self {
        Self {
            backend: EmbeddingBackendKind::Stub,
            url: String::new(),
            model_path: None,
            timeout: Duration::from_secs(5),
            stub_dim: dim,
        }
    }

    /// Config for an HTTP backend at `url`.
    pub fn http(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            backend: EmbeddingBackendKind::Http,
            url: url.into(),
            model_path: None,
            timeout,
            stub_dim: 0,
        }
    }
}
