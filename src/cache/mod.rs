//! Process-wide, content-addressed embedding cache.
//!
//! Vectors are keyed by record id and tagged wholesale with the dataset
//! fingerprint and embedding-model id that produced them. On any tag mismatch
//! the entire map is discarded and lazily rebuilt; stale and fresh vectors
//! are never mixed across dataset versions.

pub mod error;


pub use error::CacheError;

use std::collections::HashMap;
use std::path::Path;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::embedding::EmbeddingError;
use crate::hashing::Fingerprint;

#[derive(Debug, Default)]
struct CacheInner {
    fingerprint: Option<Fingerprint>,
    model_id: Option<String>,
    vectors: HashMap<u64, Vec<f32>>,
}

impl CacheInner {
    fn tags_match(&self, fingerprint: Fingerprint, model_id: &str) -> bool {
        self.fingerprint == Some(fingerprint) && self.model_id.as_deref() == Some(model_id)
    }
}

/// Shared embedding cache with atomic rebuild-on-staleness.
///
/// The tag check and the wholesale clear happen under one write lock, so a
/// reader never observes a half-rebuilt cache. Recomputation is idempotent:
/// two threads racing on the same record at worst both compute the same
/// vector, and one insert wins.
#[derive(Debug, Default)]
pub struct EmbeddingCache {
    inner: RwLock<CacheInner>,
}

impl EmbeddingCache {
    /// Creates an empty, untagged cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Discards every entry if the stored tags differ from the current
    /// dataset fingerprint and model id. Returns `true` if entries were
    /// discarded.
    pub fn invalidate_if_stale(&self, fingerprint: Fingerprint, model_id: &str) -> bool {
        let mut inner = self.inner.write();
        if inner.tags_match(fingerprint, model_id) {
            return false;
        }
        let invalidated = !inner.vectors.is_empty();
        if invalidated {
            info!(
                discarded = inner.vectors.len(),
                fingerprint = %fingerprint,
                model_id,
                "Embedding cache invalidated (tag mismatch)"
            );
        }
        inner.vectors.clear();
        inner.fingerprint = Some(fingerprint);
        inner.model_id = Some(model_id.to_string());
        invalidated
    }

    /// Returns the cached vector for `record_id` if the tags are current.
    pub fn get(&self, record_id: u64, fingerprint: Fingerprint, model_id: &str) -> Option<Vec<f32>> {
        let inner = self.inner.read();
        if !inner.tags_match(fingerprint, model_id) {
            return None;
        }
        inner.vectors.get(&record_id).cloned()
    }

    /// Returns the cached vector or computes, stores, and returns it.
    ///
    /// `compute` runs outside the lock; embedding latency never blocks
    /// concurrent readers.
    pub fn get_or_compute<F>(
        &self,
        record_id: u64,
        fingerprint: Fingerprint,
        model_id: &str,
        compute: F,
    ) -> Result<Vec<f32>, EmbeddingError>
    where
        F: FnOnce() -> Result<Vec<f32>, EmbeddingError>,
    {
        self.invalidate_if_stale(fingerprint, model_id);

        if let Some(vector) = self.get(record_id, fingerprint, model_id) {
            return Ok(vector);
        }

        let vector = compute()?;

        let mut inner = self.inner.write();
        // The dataset may have changed while we computed; an insert under
        // mismatched tags would poison the rebuilt cache.
        if inner.tags_match(fingerprint, model_id) {
            inner.vectors.insert(record_id, vector.clone());
        }
        Ok(vector)
    }

    /// Number of cached vectors.
    pub fn len(&self) -> usize {
        self.inner.read().vectors.len()
    }

    /// Returns `true` if no vectors are cached.
    pub fn is_empty(&self) -> bool {
        self.inner.read().vectors.is_empty()
    }

    /// Drops all entries and tags.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.vectors.clear();
        inner.fingerprint = None;
        inner.model_id = None;
    }

    /// Persists the cache as a JSON snapshot.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), CacheError> {
        let path = path.as_ref();
        let snapshot = {
            let inner = self.inner.read();
            Snapshot {
                fingerprint: inner.fingerprint.map(|fp| fp.to_hex()),
                model_id: inner.model_id.clone(),
                vectors: inner.vectors.clone(),
            }
        };

        let json =
            serde_json::to_vec(&snapshot).map_err(|source| CacheError::Malformed { source })?;
        std::fs::write(path, json).map_err(|source| CacheError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(path = %path.display(), entries = snapshot.vectors.len(), "Cache snapshot written");
        Ok(())
    }

    /// Restores a cache from a JSON snapshot.
    ///
    /// The restored entries are still subject to tag validation: a later
    /// [`EmbeddingCache::invalidate_if_stale`] against a different dataset or
    /// model discards them wholesale.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CacheError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| CacheError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let snapshot: Snapshot =
            serde_json::from_slice(&bytes).map_err(|source| CacheError::Malformed { source })?;

        debug!(path = %path.display(), entries = snapshot.vectors.len(), "Cache snapshot loaded");

        Ok(Self {
            inner: RwLock::new(CacheInner {
                fingerprint: snapshot.fingerprint.and_then(|hex| Fingerprint::from_hex(&hex)),
                model_id: snapshot.model_id,
                vectors: snapshot.vectors,
            }),
        })
    }
}

/// On-disk snapshot format.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    fingerprint: Option<String>,
    model_id: Option<String>,
    vectors: HashMap<u64, Vec<f32>>,
}
