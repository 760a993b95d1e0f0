//! BERT sentence embedder (safetensors + tokenizer).
//!
//! Mean-pools the final hidden states and L2-normalizes, so cosine similarity
//! reduces to a dot product downstream. Use [`EmbedderConfig::stub`] for
//! tests and environments without model files.

use std::fs;
use std::sync::Arc;

use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::config::EmbedderConfig;
use super::device::select_device;
use super::error::EmbeddingError;

enum EmbedderBackend {
    Model {
        model: Arc<Mutex<BertModel>>,
        tokenizer: Arc<tokenizers::Tokenizer>,
        device: Device,
    },
    Stub,
}

/// Embedding generator for semantic matching (supports stub mode).
pub struct BertEmbedder {
    backend: EmbedderBackend,
    config: EmbedderConfig,
}

impl std::fmt::Debug for BertEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BertEmbedder")
            .field(
                "backend",
                &match &self.backend {
                    EmbedderBackend::Model { device, .. } => format!("Model({device:?})"),
                    EmbedderBackend::Stub => "Stub".to_string(),
                },
            )
            .field("model_id", &self.config.model_id)
            .field("embedding_dim", &self.config.embedding_dim)
            .finish()
    }
}

impl BertEmbedder {
    /// Loads the embedder from a config (stub mode is supported).
    pub fn load(config: EmbedderConfig) -> Result<Self, EmbeddingError> {
        config.validate()?;

        if config.testing_stub {
            warn!("Embedder running in STUB mode (testing only)");
            return Ok(Self {
                backend: EmbedderBackend::Stub,
                config,
            });
        }

        if !config.model_available() {
            return Err(EmbeddingError::ModelNotFound {
                path: config.model_dir.clone(),
            });
        }

        let device = select_device()?;
        debug!(?device, "Selected compute device for embedder");

        let (model, tokenizer) = Self::load_model(&config, &device)?;

        info!(
            model_dir = %config.model_dir.display(),
            model_id = %config.model_id,
            embedding_dim = config.embedding_dim,
            max_seq_len = config.max_seq_len,
            "Embedding model loaded"
        );

        Ok(Self {
            backend: EmbedderBackend::Model {
                model: Arc::new(Mutex::new(model)),
                tokenizer: Arc::new(tokenizer),
                device,
            },
            config,
        })
    }

    fn load_model(
        config: &EmbedderConfig,
        device: &Device,
    ) -> Result<(BertModel, tokenizers::Tokenizer), EmbeddingError> {
        let tokenizer = tokenizers::Tokenizer::from_file(config.tokenizer_path()).map_err(
            |e| EmbeddingError::TokenizationFailed {
                reason: format!("failed to load tokenizer: {e}"),
            },
        )?;

        let bert_config: BertConfig =
            serde_json::from_str(&fs::read_to_string(config.config_path())?).map_err(|e| {
                EmbeddingError::ModelLoadFailed {
                    reason: format!("failed to parse config.json: {e}"),
                }
            })?;

        if config.embedding_dim > bert_config.hidden_size {
            return Err(EmbeddingError::InvalidConfig {
                reason: format!(
                    "embedding_dim ({}) exceeds model hidden_size ({})",
                    config.embedding_dim, bert_config.hidden_size
                ),
            });
        }

        // SAFETY: the weights file is mmap'd read-only and not mutated while
        // the model is alive.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[config.weights_path()], DTYPE, device)
        }
        .map_err(|e| EmbeddingError::ModelLoadFailed {
            reason: format!("failed to map safetensors: {e}"),
        })?;

        let model = BertModel::load(vb, &bert_config).map_err(|e| {
            EmbeddingError::ModelLoadFailed {
                reason: format!("failed to load BERT weights: {e}"),
            }
        })?;

        Ok((model, tokenizer))
    }

    /// Generates an L2-normalized embedding for a single text.
    pub fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        match &self.backend {
            EmbedderBackend::Model {
                model,
                tokenizer,
                device,
            } => self.embed_with_model(text, model, tokenizer, device),
            EmbedderBackend::Stub => Ok(self.embed_stub(text)),
        }
    }

    fn embed_with_model(
        &self,
        text: &str,
        model: &Arc<Mutex<BertModel>>,
        tokenizer: &tokenizers::Tokenizer,
        device: &Device,
    ) -> Result<Vec<f32>, EmbeddingError> {
        let encoding =
            tokenizer
                .encode(text, true)
                .map_err(|e| EmbeddingError::TokenizationFailed {
                    reason: e.to_string(),
                })?;

        let mut tokens: Vec<u32> = encoding.get_ids().to_vec();
        if tokens.is_empty() {
            return Ok(vec![0.0; self.config.embedding_dim]);
        }
        tokens.truncate(self.config.max_seq_len);

        debug!(
            text_len = text.len(),
            token_count = tokens.len(),
            "Generating embedding"
        );

        let input_ids = Tensor::new(&tokens[..], device)?.unsqueeze(0)?;
        let token_type_ids = input_ids.zeros_like()?;

        let hidden_states = model
            .lock()
            .forward(&input_ids, &token_type_ids, None)
            .map_err(|e| EmbeddingError::InferenceFailed {
                reason: format!("forward pass failed: {e}"),
            })?;

        // Mean pooling over the token dimension: [1, seq, hidden] -> [hidden].
        let pooled = hidden_states.mean(1)?.squeeze(0)?;
        let mut embedding = pooled.to_vec1::<f32>()?;
        embedding.truncate(self.config.embedding_dim);

        Ok(l2_normalize(embedding))
    }

    /// Deterministic hash-seeded embedding used in stub mode. Identical texts
    /// always produce bit-identical vectors.
    fn embed_stub(&self, text: &str) -> Vec<f32> {
        let seed = crate::hashing::hash_to_u64(text.as_bytes());
        let mut state = seed;
        let mut embedding = Vec::with_capacity(self.config.embedding_dim);
        for _ in 0..self.config.embedding_dim {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            let value = ((state >> 32) as f32 / u32::MAX as f32) * 2.0 - 1.0;
            embedding.push(value);
        }
        l2_normalize(embedding)
    }

    /// Returns the configured output embedding dimension.
    #[inline]
    pub fn embedding_dim(&self) -> usize {
        self.config.embedding_dim
    }

    /// Identifier of the loaded model, used to tag cached vectors.
    #[inline]
    pub fn model_id(&self) -> &str {
        &self.config.model_id
    }

    /// Returns `true` if running in stub mode.
    pub fn is_stub(&self) -> bool {
        matches!(self.backend, EmbedderBackend::Stub)
    }

    /// Returns the embedder configuration.
    pub fn config(&self) -> &EmbedderConfig {
        &self.config
    }
}

fn l2_normalize(mut embedding: Vec<f32>) -> Vec<f32> {
    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut embedding {
            *x /= norm;
        }
    }
    embedding
}
