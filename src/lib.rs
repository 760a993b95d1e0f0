//! Grantrank library crate.
//!
//! A retrieval and ranking engine for grant funding datasets: structured
//! attribute filtering combined with free-text relevance ranking over two
//! matching strategies (lexical fuzzy similarity and semantic embedding
//! similarity), with content-addressed caching of computed vectors.
//!
//! # Public API Surface
//!
//! ## Core Types (Stable)
//! - [`Config`], [`ConfigError`], [`Strategy`] - Engine configuration
//! - [`Dataset`], [`Record`], [`DatasetError`] - Canonical record store
//! - [`FilterSpec`], [`YearRange`] - Structured filtering
//! - [`RankingPipeline`], [`QueryRequest`], [`Retrieval`] - Retrieval calls
//!
//! ## Matching & Scoring
//! - [`LexicalMatcher`] - Fuzzy string scoring on a 0-100 scale
//! - [`SemanticMatcher`], [`cosine_similarity`] - Embedding similarity
//! - [`MatchResult`], [`MatchKind`] - Per-candidate scores
//!
//! ## Embedding & Caching
//! - [`BertEmbedder`], [`EmbedderConfig`], [`LazyEmbedder`] - Embedding
//!   generation (deterministic stub mode for tests)
//! - [`EmbeddingCache`] - Fingerprint-tagged vector cache with snapshots
//! - [`Fingerprint`] - BLAKE3 dataset content hash
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use grantrank::{Config, Dataset, FilterSpec, QueryRequest, RankingPipeline};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dataset = Dataset::load_path("grants.csv")?;
//! let pipeline = RankingPipeline::new(Config::from_env()?);
//!
//! let request = QueryRequest::new("youth environment")
//!     .with_filter(FilterSpec::new().with_funder("Green Trust"));
//! let retrieval = pipeline.retrieve(&dataset, &request);
//!
//! for ranked in &retrieval.results {
//!     println!("{}: {:?}", ranked.record.title(), ranked.score);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod dataset;
pub mod embedding;
pub mod filter;
pub mod hashing;
pub mod insights;
pub mod lexical;
pub mod matching;
pub mod pipeline;
pub mod semantic;

pub use cache::{CacheError, EmbeddingCache};
pub use config::{Config, ConfigError, Strategy};
pub use dataset::{Dataset, DatasetError, Record};
pub use embedding::{
    BertEmbedder, DEFAULT_EMBEDDING_DIM, DEFAULT_MAX_SEQ_LEN, EmbedderConfig, EmbeddingError,
    LazyEmbedder,
};
pub use filter::{FilterSpec, YearRange};
pub use hashing::{Fingerprint, FingerprintBuilder, hash_to_u64};
pub use lexical::{DEFAULT_THRESHOLD, LexicalMatcher, MAX_SCORE, score_text};
pub use matching::{MatchKind, MatchResult};
pub use pipeline::{EmptyReason, QueryRequest, RankedRecord, RankingPipeline, Retrieval};
pub use semantic::{
    DEFAULT_TOP_K, SemanticError, SemanticMatcher, SemanticOutcome, cosine_similarity,
};
