//! Semantic matching via embedding cosine similarity.
//!
//! Candidate vectors come from the [`EmbeddingCache`]; the query is embedded
//! on demand and never cached, since queries are arbitrary. Similarity is a
//! relative ranking signal: the matcher returns the top-K candidates without
//! an absolute acceptance gate.


use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, warn};

use crate::cache::EmbeddingCache;
use crate::dataset::Record;
use crate::embedding::{BertEmbedder, EmbeddingError};
use crate::hashing::Fingerprint;
use crate::matching::MatchResult;

/// Default number of semantic results returned.
pub const DEFAULT_TOP_K: usize = 5;

/// Failures that make the whole semantic pass unusable. The pipeline treats
/// both variants as a signal to fall back to lexical scoring.
#[derive(Debug, Error)]
pub enum SemanticError {
    #[error("embedding backend unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("embedding work exceeded the caller deadline")]
    DeadlineExceeded,
}

impl From<EmbeddingError> for SemanticError {
    fn from(err: EmbeddingError) -> Self {
        SemanticError::Unavailable {
            reason: err.to_string(),
        }
    }
}

/// Result of one semantic scoring pass.
#[derive(Debug)]
pub struct SemanticOutcome {
    /// Top-K matches, similarity descending, record id ascending on ties.
    pub matches: Vec<MatchResult>,
    /// Candidates skipped because their vector failed to compute or had the
    /// wrong dimension. Skips never abort the pass.
    pub records_skipped: usize,
}

/// Embedding-based scorer consulting the shared cache.
#[derive(Debug)]
pub struct SemanticMatcher {
    embedder: Arc<BertEmbedder>,
    cache: Arc<EmbeddingCache>,
}

impl SemanticMatcher {
    pub fn new(embedder: Arc<BertEmbedder>, cache: Arc<EmbeddingCache>) -> Self {
        Self { embedder, cache }
    }

    /// Scores `candidates` against `query`, returning the `top_k` most
    /// similar.
    ///
    /// `deadline` bounds embedding work: once passed, the pass aborts with
    /// [`SemanticError::DeadlineExceeded`] rather than hang. Vectors cached
    /// before the deadline stay cached, so a retry resumes where this pass
    /// stopped.
    pub fn score(
        &self,
        query: &str,
        candidates: &[&Record],
        fingerprint: Fingerprint,
        top_k: usize,
        deadline: Option<Instant>,
    ) -> Result<SemanticOutcome, SemanticError> {
        let model_id = self.embedder.model_id();
        let query_vector = self.embedder.embed(query)?;
        let mut records_skipped = 0;
        let mut scored: Vec<MatchResult> = Vec::with_capacity(candidates.len());

        for record in candidates {
            if let Some(deadline) = deadline
                && Instant::now() >= deadline
            {
                warn!(
                    scored = scored.len(),
                    remaining = candidates.len() - scored.len() - records_skipped,
                    "Semantic scoring hit the caller deadline"
                );
                return Err(SemanticError::DeadlineExceeded);
            }

            let vector = self.cache.get_or_compute(record.id(), fingerprint, model_id, || {
                self.embedder.embed(record.text_blob())
            });

            let vector = match vector {
                Ok(vector) => vector,
                Err(e) => {
                    warn!(record_id = record.id(), error = %e, "Skipping candidate: embedding failed");
                    records_skipped += 1;
                    continue;
                }
            };

            match cosine_similarity(&query_vector, &vector) {
                Some(similarity) => {
                    scored.push(MatchResult::semantic(record.id(), similarity));
                }
                None => {
                    warn!(
                        record_id = record.id(),
                        "Skipping candidate: embedding dimension mismatch"
                    );
                    records_skipped += 1;
                }
            }
        }

        scored.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.record_id.cmp(&b.record_id))
        });
        scored.truncate(top_k);

        debug!(
            candidates = candidates.len(),
            matches = scored.len(),
            records_skipped,
            top_k,
            "Semantic scoring complete"
        );

        Ok(SemanticOutcome {
            matches: scored,
            records_skipped,
        })
    }

    /// The shared cache backing this matcher.
    pub fn cache(&self) -> &Arc<EmbeddingCache> {
        &self.cache
    }
}

/// Cosine similarity in [-1, 1]. Returns `None` on dimension mismatch or a
/// zero-magnitude vector.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f64> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        dot += f64::from(*x) * f64::from(*y);
        norm_a += f64::from(*x) * f64::from(*x);
        norm_b += f64::from(*y) * f64::from(*y);
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        return None;
    }
    Some((dot / denom).clamp(-1.0, 1.0))
}
