use std::hash::{DefaultHasher, Hash, Hasher};

use tracing::debug;

use super::EmbeddingClient;
use super::error::EmbeddingError;

/// Deterministic unit vectors seeded from a hash of the text.
///
/// Equal texts map to equal vectors; unrelated texts are close to orthogonal
/// in high dimensions. Useful for development without a model or service.
#[derive(Debug, Clone, Copy)]
pub struct StubEmbedder {
    dimension: usize,
}

impl StubEmbedder {
    pub fn new(dimension: usize) -> Result<Self, EmbeddingError> {
        if dimension == 0 {
            return Err(EmbeddingError::InvalidConfig {
                reason: "stub dimension must be greater than zero".to_string(),
            });
        }
        Ok(Self { dimension })
    }

    /// Synchronous variant of [`EmbeddingClient::embed`].
    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        debug!(text_len = text.len(), "Generating stub embedding");

        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let mut state = hasher.finish();

        let mut embedding = Vec::with_capacity(self.dimension);
        for _ in 0..self.dimension {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            let value = ((state >> 32) as f32 / u32::MAX as f32) * 2.0 - 1.0;
            embedding.push(value);
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut embedding {
                *x /= norm;
            }
        }
        embedding
    }
}

impl EmbeddingClient for StubEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(self.embed_sync(text))
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.dimension)
    }

    fn backend_name(&self) -> &'static str {
        "stub"
    }
}
