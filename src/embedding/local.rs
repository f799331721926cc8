//! In-process sentence embedder (BERT family, safetensors + tokenizer.json).

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;
use tracing::{debug, info, instrument};

use super::EmbeddingClient;
use super::bert::BertSentenceEncoder;
use super::device::select_device;
use super::error::EmbeddingError;
use super::utils::load_tokenizer_with_truncation;

/// Longest token sequence fed to the encoder.
pub const LOCAL_MAX_SEQ_LEN: usize = 512;

struct LocalModel {
    encoder: BertSentenceEncoder,
    tokenizer: Tokenizer,
    device: Device,
}

impl LocalModel {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let encoding =
            self.tokenizer
                .encode(text, true)
                .map_err(|e| EmbeddingError::TokenizationFailed {
                    reason: e.to_string(),
                })?;

        if encoding.get_ids().is_empty() {
            return Err(EmbeddingError::Empty);
        }

        debug!(
            text_len = text.len(),
            token_count = encoding.get_ids().len(),
            "Running encoder forward pass"
        );

        let input_ids = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;
        let type_ids = Tensor::new(encoding.get_type_ids(), &self.device)?.unsqueeze(0)?;
        let attention_mask =
            Tensor::new(encoding.get_attention_mask(), &self.device)?.unsqueeze(0)?;

        let pooled = self
            .encoder
            .encode(&input_ids, &type_ids, &attention_mask)
            .map_err(|e| EmbeddingError::InferenceFailed {
                reason: e.to_string(),
            })?;

        Ok(pooled.squeeze(0)?.to_vec1::<f32>()?)
    }
}

/// Embeds text with a model loaded from disk. Inference runs on the blocking pool.
#[derive(Clone)]
pub struct LocalEmbedder {
    model: Arc<LocalModel>,
    timeout: Duration,
}

impl std::fmt::Debug for LocalEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalEmbedder")
            .field("device", &self.model.device)
            .field("dimension", &self.model.encoder.hidden_size())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl LocalEmbedder {
    /// Loads `config.json`, `model.safetensors` and `tokenizer.json` from `model_dir`.
    pub fn load(model_dir: &Path, timeout: Duration) -> Result<Self, EmbeddingError> {
        if !model_dir.is_dir() {
            return Err(EmbeddingError::ModelNotFound {
                path: model_dir.to_path_buf(),
            });
        }
        for file in ["config.json", "model.safetensors"] {
            let path = model_dir.join(file);
            if !path.exists() {
                return Err(EmbeddingError::ModelNotFound { path });
            }
        }

        let device = select_device()?;
        debug!(?device, "Selected compute device for local embedder");

        let encoder = BertSentenceEncoder::load(model_dir, &device).map_err(|e| {
            EmbeddingError::ModelLoadFailed {
                reason: format!("Failed to load BERT model: {e}"),
            }
        })?;
        let tokenizer = load_tokenizer_with_truncation(model_dir, LOCAL_MAX_SEQ_LEN)?;

        info!(
            model_path = %model_dir.display(),
            dimension = encoder.hidden_size(),
            "Local embedding model loaded"
        );

        Ok(Self {
            model: Arc::new(LocalModel {
                encoder,
                tokenizer,
                device,
            }),
            timeout,
        })
    }
}

impl EmbeddingClient for LocalEmbedder {
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let model = Arc::clone(&self.model);
        let text = text.to_owned();
        let task = tokio::task::spawn_blocking(move || model.embed(&text));

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(EmbeddingError::InferenceFailed {
                reason: format!("embedding task failed: {join_err}"),
            }),
            Err(_) => Err(EmbeddingError::Timeout {
                after: self.timeout,
            }),
        }
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.model.encoder.hidden_size())
    }

    fn backend_name(&self) -> &'static str {
        "local"
    }
}
