//! Embedding backend.
//!
//! - [`bert`] provides embedding generation (real model or deterministic stub).
//! - [`LazyEmbedder`] defers model loading to first use and guarantees the
//!   load happens at most once under concurrent access.

/// BERT sentence embedder.
pub mod bert;
/// Embedder configuration.
pub mod config;
/// Device selection (CPU / Metal / CUDA).
pub mod device;
mod error;


pub use bert::BertEmbedder;
pub use config::{DEFAULT_EMBEDDING_DIM, DEFAULT_MAX_SEQ_LEN, EmbedderConfig};
pub use error::EmbeddingError;

use std::sync::{Arc, OnceLock};

use tracing::warn;

/// Lazily-initialized, shared embedder handle.
///
/// Model loading is the most expensive startup step, so it is deferred until
/// the first semantic query. `OnceLock` guarantees initialization runs at
/// most once no matter how many concurrent requests race to it; a failed load
/// is also latched, so later callers get [`EmbeddingError::Unavailable`]
/// immediately instead of retrying a broken backend.
#[derive(Debug)]
pub struct LazyEmbedder {
    config: EmbedderConfig,
    cell: OnceLock<Result<Arc<BertEmbedder>, String>>,
}

impl LazyEmbedder {
    /// Creates a handle; no model work happens until [`LazyEmbedder::get`].
    pub fn new(config: EmbedderConfig) -> Self {
        Self {
            config,
            cell: OnceLock::new(),
        }
    }

    /// Returns the embedder, loading it on first call.
    pub fn get(&self) -> Result<Arc<BertEmbedder>, EmbeddingError> {
        let slot = self.cell.get_or_init(|| {
            BertEmbedder::load(self.config.clone())
                .map(Arc::new)
                .map_err(|e| {
                    let reason = e.to_string();
                    warn!(reason = %reason, "Embedding backend failed to initialize");
                    reason
                })
        });

        match slot {
            Ok(embedder) => Ok(Arc::clone(embedder)),
            Err(reason) => Err(EmbeddingError::Unavailable {
                reason: reason.clone(),
            }),
        }
    }

    /// Returns `true` if a load has been attempted (successful or not).
    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Identifier of the configured model.
    pub fn model_id(&self) -> &str {
        &self.config.model_id
    }
}
