//! Ranking pipeline: filter, match, merge, truncate.
//!
//! Owns the process-wide mutable state (lazy embedder, embedding cache) as
//! explicit injected services; datasets and requests stay caller-owned and
//! immutable.

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};

use crate::cache::{CacheError, EmbeddingCache};
use crate::config::{Config, Strategy};
use crate::dataset::{Dataset, Record};
use crate::embedding::{EmbedderConfig, LazyEmbedder};
use crate::filter::FilterSpec;
use crate::lexical::LexicalMatcher;
use crate::matching::{MatchKind, MatchResult};
use crate::semantic::{SemanticError, SemanticMatcher, SemanticOutcome};

/// One retrieval request, scoped to a single call.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    /// Free-text query; empty means browse mode (filter only, unscored).
    pub query: String,
    /// Structured predicates applied before any matching.
    pub filter: FilterSpec,
    /// Strategy selection for this request.
    pub strategy: Strategy,
    /// Lexical acceptance cutoff (strictly greater than), 0-100 scale.
    pub threshold: f64,
    /// Semantic result cap.
    pub top_k: usize,
    /// Final result cap. A value of 0 is treated as 1.
    pub limit: usize,
    /// Budget for embedding work; `None` means unbounded.
    pub embed_timeout: Option<Duration>,
}

impl QueryRequest {
    /// Builds a request with the engine-default ranking configuration.
    pub fn new(query: impl Into<String>) -> Self {
        Self::with_config(query, &Config::default())
    }

    /// Builds a request taking ranking configuration from `config`.
    pub fn with_config(query: impl Into<String>, config: &Config) -> Self {
        Self {
            query: query.into(),
            filter: FilterSpec::new(),
            strategy: config.strategy,
            threshold: config.threshold,
            top_k: config.top_k,
            limit: config.limit,
            embed_timeout: Some(Duration::from_millis(config.embed_timeout_ms)),
        }
    }

    pub fn with_filter(mut self, filter: FilterSpec) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// A record with its attached score, ordered for presentation.
#[derive(Debug, Clone)]
pub struct RankedRecord {
    pub record: Record,
    /// Score on the producing strategy's own scale (lexical 0-100, semantic
    /// cosine), or normalized [0, 1] for hybrid merges. `None` in browse
    /// mode.
    pub score: Option<f64>,
    /// Strategy that produced the score. `None` in browse mode.
    pub kind: Option<MatchKind>,
}

/// Why a retrieval came back empty. Callers need the distinction to render
/// the correct message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyReason {
    /// The structured filters alone eliminated every record.
    NoCandidatesAfterFilter,
    /// Candidates existed but no strategy found a relevant match.
    NoRelevantMatches,
}

/// Ordered results plus aggregate counters for one retrieval call.
#[derive(Debug)]
pub struct Retrieval {
    pub results: Vec<RankedRecord>,
    /// Records that passed the structured filters.
    pub total_candidates: usize,
    /// Rows the dataset load dropped for unparseable dates.
    pub rows_dropped_for_bad_date: usize,
    /// Scored matches returned (0 in browse mode).
    pub matches_returned: usize,
    /// Candidates skipped due to per-record scoring failures.
    pub records_skipped: usize,
    /// Present when the semantic path was requested but fell back to
    /// lexical; carries the reason, surfaced as a warning, not an error.
    pub semantic_fallback: Option<String>,
    /// Present when `results` is empty.
    pub empty_reason: Option<EmptyReason>,
}

/// The retrieval engine: orchestrates filter, matchers, merge and truncate.
#[derive(Debug)]
pub struct RankingPipeline {
    config: Config,
    embedder: LazyEmbedder,
    cache: Arc<EmbeddingCache>,
}

impl RankingPipeline {
    /// Builds a pipeline from configuration, restoring a cache snapshot from
    /// `cache_location` when one exists.
    pub fn new(config: Config) -> Self {
        let cache = match &config.cache_location {
            Some(path) if path.exists() => match EmbeddingCache::load(path) {
                Ok(cache) => {
                    info!(path = %path.display(), entries = cache.len(), "Restored embedding cache snapshot");
                    cache
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Ignoring unreadable cache snapshot");
                    EmbeddingCache::new()
                }
            },
            _ => EmbeddingCache::new(),
        };

        let embedder_config = EmbedderConfig {
            model_dir: config.model_dir.clone().unwrap_or_default(),
            model_id: config.model_id.clone(),
            ..Default::default()
        };

        Self {
            config,
            embedder: LazyEmbedder::new(embedder_config),
            cache: Arc::new(cache),
        }
    }

    /// Builds a pipeline with injected services (custom embedder or shared
    /// cache).
    pub fn with_parts(config: Config, embedder: LazyEmbedder, cache: Arc<EmbeddingCache>) -> Self {
        Self {
            config,
            embedder,
            cache,
        }
    }

    /// Builds a pipeline whose embedder runs in deterministic stub mode.
    #[cfg(any(test, feature = "mock"))]
    pub fn new_stub(config: Config) -> Self {
        Self::with_parts(
            config,
            LazyEmbedder::new(EmbedderConfig::stub()),
            Arc::new(EmbeddingCache::new()),
        )
    }

    /// The shared embedding cache.
    pub fn cache(&self) -> &Arc<EmbeddingCache> {
        &self.cache
    }

    /// The pipeline configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Persists the embedding cache to `cache_location`, if configured.
    pub fn save_cache(&self) -> Result<(), CacheError> {
        if let Some(path) = &self.config.cache_location {
            self.cache.save(path)?;
        }
        Ok(())
    }

    /// Runs one retrieval: filter, score, merge, truncate.
    ///
    /// Never fails: semantic trouble degrades to lexical scoring and
    /// per-record failures are skipped and counted.
    #[instrument(skip(self, dataset, request), fields(
        query_len = request.query.len(),
        strategy = %request.strategy,
        limit = request.limit,
    ))]
    pub fn retrieve(&self, dataset: &Dataset, request: &QueryRequest) -> Retrieval {
        let candidates = crate::filter::apply(dataset, &request.filter);
        let total_candidates = candidates.len();
        debug!(total_candidates, "Filter stage complete");

        let mut retrieval = Retrieval {
            results: Vec::new(),
            total_candidates,
            rows_dropped_for_bad_date: dataset.rows_dropped_for_bad_date(),
            matches_returned: 0,
            records_skipped: 0,
            semantic_fallback: None,
            empty_reason: None,
        };

        // Hand-built requests bypass Config::validate, so a zero limit can
        // reach this point; clamped so an empty result always means an empty
        // candidate or match set, not a zero cap.
        let limit = request.limit.max(1);

        let query = request.query.trim();
        if query.is_empty() {
            // Browse mode: original dataset order, unscored.
            retrieval.results = candidates
                .iter()
                .take(limit)
                .map(|record| RankedRecord {
                    record: (*record).clone(),
                    score: None,
                    kind: None,
                })
                .collect();
            if retrieval.results.is_empty() {
                retrieval.empty_reason = Some(EmptyReason::NoCandidatesAfterFilter);
            }
            return retrieval;
        }

        if candidates.is_empty() {
            retrieval.empty_reason = Some(EmptyReason::NoCandidatesAfterFilter);
            return retrieval;
        }

        let deadline = request.embed_timeout.map(|budget| Instant::now() + budget);
        let mut merged = match request.strategy {
            Strategy::Lexical => self.run_lexical(query, &candidates, request),
            Strategy::Semantic | Strategy::Auto => {
                match self.run_semantic(query, &candidates, dataset, request, deadline) {
                    Ok(outcome) => {
                        retrieval.records_skipped += outcome.records_skipped;
                        outcome.matches
                    }
                    Err(e) => {
                        warn!(error = %e, "Semantic path unavailable, falling back to lexical");
                        retrieval.semantic_fallback = Some(e.to_string());
                        self.run_lexical(query, &candidates, request)
                    }
                }
            }
            Strategy::Hybrid => {
                let lexical = self.run_lexical(query, &candidates, request);
                match self.run_semantic(query, &candidates, dataset, request, deadline) {
                    Ok(outcome) => {
                        retrieval.records_skipped += outcome.records_skipped;
                        merge_hybrid(lexical, outcome.matches)
                    }
                    Err(e) => {
                        warn!(error = %e, "Semantic half of hybrid unavailable, keeping lexical");
                        retrieval.semantic_fallback = Some(e.to_string());
                        lexical
                    }
                }
            }
        };

        merged.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.record_id.cmp(&b.record_id))
        });
        merged.truncate(limit);

        let by_id: HashMap<u64, &Record> =
            candidates.iter().map(|record| (record.id(), *record)).collect();
        retrieval.results = merged
            .into_iter()
            .filter_map(|m| {
                by_id.get(&m.record_id).map(|record| RankedRecord {
                    record: (*record).clone(),
                    score: Some(m.score),
                    kind: Some(m.kind),
                })
            })
            .collect();
        retrieval.matches_returned = retrieval.results.len();

        if retrieval.results.is_empty() {
            retrieval.empty_reason = Some(EmptyReason::NoRelevantMatches);
        }

        info!(
            matches = retrieval.matches_returned,
            skipped = retrieval.records_skipped,
            fallback = retrieval.semantic_fallback.is_some(),
            "Retrieval complete"
        );
        retrieval
    }

    fn run_lexical(
        &self,
        query: &str,
        candidates: &[&Record],
        request: &QueryRequest,
    ) -> Vec<MatchResult> {
        LexicalMatcher::new(request.threshold).score(query, candidates)
    }

    fn run_semantic(
        &self,
        query: &str,
        candidates: &[&Record],
        dataset: &Dataset,
        request: &QueryRequest,
        deadline: Option<Instant>,
    ) -> Result<SemanticOutcome, SemanticError> {
        let embedder = self.embedder.get().map_err(|e| SemanticError::Unavailable {
            reason: e.to_string(),
        })?;

        // Model loading counts against the caller's budget too.
        if let Some(deadline) = deadline
            && Instant::now() >= deadline
        {
            return Err(SemanticError::DeadlineExceeded);
        }

        let matcher = SemanticMatcher::new(embedder, Arc::clone(&self.cache));
        matcher.score(
            query,
            candidates,
            dataset.fingerprint(),
            request.top_k,
            deadline,
        )
    }
}

/// Unions lexical and semantic matches by record id, keeping the best
/// normalized score per record. Output scores are on the normalized [0, 1]
/// scale.
fn merge_hybrid(lexical: Vec<MatchResult>, semantic: Vec<MatchResult>) -> Vec<MatchResult> {
    let mut best: HashMap<u64, MatchResult> = HashMap::new();
    for m in lexical.into_iter().chain(semantic) {
        let normalized = MatchResult {
            score: m.normalized_score(),
            ..m
        };
        best.entry(m.record_id)
            .and_modify(|current| {
                if normalized.score > current.score {
                    *current = normalized;
                }
            })
            .or_insert(normalized);
    }
    best.into_values().collect()
}
