//! Embedder configuration.

use std::path::PathBuf;

use super::error::EmbeddingError;

/// Default output embedding dimension (MiniLM-class models).
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

/// Default max tokens per input text.
pub const DEFAULT_MAX_SEQ_LEN: usize = 256;

/// Configuration for [`BertEmbedder`](super::BertEmbedder).
///
/// A model directory must hold `config.json`, `tokenizer.json` and
/// `model.safetensors`. Use [`EmbedderConfig::stub`] for tests and
/// environments without model files.
#[derive(Debug, Clone)]
pub struct EmbedderConfig {
    /// Directory holding the model files.
    pub model_dir: PathBuf,
    /// Identifier of the model, used to tag cached vectors.
    pub model_id: String,
    /// Max tokens to consider per text.
    pub max_seq_len: usize,
    /// Output embedding dimension.
    pub embedding_dim: usize,
    /// If true, produce deterministic hash-seeded vectors with no model files.
    pub testing_stub: bool,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::new(),
            model_id: String::from("all-MiniLM-L6-v2"),
            max_seq_len: DEFAULT_MAX_SEQ_LEN,
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            testing_stub: false,
        }
    }
}

impl EmbedderConfig {
    /// Creates a config for a model directory, keeping the default model id.
    pub fn new<P: Into<PathBuf>>(model_dir: P) -> Self {
        Self {
            model_dir: model_dir.into(),
            ..Default::default()
        }
    }

    /// Creates a stub config (no model files; deterministic embeddings).
    pub fn stub() -> Self {
        Self {
            testing_stub: true,
            model_id: String::from("stub"),
            ..Default::default()
        }
    }

    /// Validates required fields for non-stub mode.
    pub fn validate(&self) -> Result<(), EmbeddingError> {
        if self.embedding_dim == 0 {
            return Err(EmbeddingError::InvalidConfig {
                reason: "embedding_dim must be non-zero".to_string(),
            });
        }
        if self.testing_stub {
            return Ok(());
        }
        if self.model_dir.as_os_str().is_empty() {
            return Err(EmbeddingError::InvalidConfig {
                reason: "model_dir is required (stubbing is disabled)".to_string(),
            });
        }
        if !self.model_dir.is_dir() {
            return Err(EmbeddingError::ModelNotFound {
                path: self.model_dir.clone(),
            });
        }
        Ok(())
    }

    /// Path to `config.json`.
    pub fn config_path(&self) -> PathBuf {
        self.model_dir.join("config.json")
    }

    /// Path to `tokenizer.json`.
    pub fn tokenizer_path(&self) -> PathBuf {
        self.model_dir.join("tokenizer.json")
    }

    /// Path to `model.safetensors`.
    pub fn weights_path(&self) -> PathBuf {
        self.model_dir.join("model.safetensors")
    }

    /// Returns `true` if all required model files exist.
    pub fn model_available(&self) -> bool {
        self.config_path().is_file()
            && self.tokenizer_path().is_file()
            && self.weights_path().is_file()
    }
}
