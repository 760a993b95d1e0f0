//! Environment-backed engine configuration.
//!
//! Every setting has a default. Override with `GRANTRANK_*` environment
//! variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Which matching strategy the pipeline runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Fuzzy string similarity only.
    Lexical,
    /// Embedding similarity only (falls back to lexical when unavailable).
    Semantic,
    /// Run both, union by record id, keep the best normalized score.
    Hybrid,
    /// Semantic when the embedding backend initializes, lexical otherwise.
    #[default]
    Auto,
}

impl FromStr for Strategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lexical" => Ok(Strategy::Lexical),
            "semantic" => Ok(Strategy::Semantic),
            "hybrid" => Ok(Strategy::Hybrid),
            "auto" => Ok(Strategy::Auto),
            _ => Err(ConfigError::UnknownStrategy {
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Strategy::Lexical => "lexical",
            Strategy::Semantic => "semantic",
            Strategy::Hybrid => "hybrid",
            Strategy::Auto => "auto",
        };
        f.write_str(name)
    }
}

/// Engine configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `GRANTRANK_*` overrides on top of
/// defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Lexical acceptance cutoff on the 0-100 scale (strictly greater than).
    /// Default: `60`.
    pub threshold: f64,

    /// Semantic result cap. Default: `5`.
    pub top_k: usize,

    /// Final result cap across all strategies. Default: `10`.
    pub limit: usize,

    /// Strategy selection. Default: [`Strategy::Auto`].
    pub strategy: Strategy,

    /// Identifier of the embedding model, used to tag cached vectors.
    pub model_id: String,

    /// Directory holding the embedding model files. `None` leaves the
    /// semantic path unavailable (lexical-only operation).
    pub model_dir: Option<PathBuf>,

    /// Optional path for the embedding cache snapshot.
    pub cache_location: Option<PathBuf>,

    /// Budget for embedding work within one retrieval call, in milliseconds.
    /// Default: `5000`.
    pub embed_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threshold: crate::lexical::DEFAULT_THRESHOLD,
            top_k: crate::semantic::DEFAULT_TOP_K,
            limit: 10,
            strategy: Strategy::Auto,
            model_id: String::from("all-MiniLM-L6-v2"),
            model_dir: None,
            cache_location: None,
            embed_timeout_ms: 5_000,
        }
    }
}

impl Config {
    const ENV_THRESHOLD: &'static str = "GRANTRANK_THRESHOLD";
    const ENV_TOP_K: &'static str = "GRANTRANK_TOP_K";
    const ENV_LIMIT: &'static str = "GRANTRANK_LIMIT";
    const ENV_STRATEGY: &'static str = "GRANTRANK_STRATEGY";
    const ENV_MODEL_ID: &'static str = "GRANTRANK_MODEL_ID";
    const ENV_MODEL_DIR: &'static str = "GRANTRANK_MODEL_DIR";
    const ENV_CACHE_LOCATION: &'static str = "GRANTRANK_CACHE_LOCATION";
    const ENV_EMBED_TIMEOUT_MS: &'static str = "GRANTRANK_EMBED_TIMEOUT_MS";

    /// Loads configuration from environment variables (falling back to
    /// defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let threshold = Self::parse_f64_from_env(Self::ENV_THRESHOLD, defaults.threshold)?;
        let top_k = Self::parse_usize_from_env(Self::ENV_TOP_K, defaults.top_k)?;
        let limit = Self::parse_usize_from_env(Self::ENV_LIMIT, defaults.limit)?;
        let strategy = match env::var(Self::ENV_STRATEGY) {
            Ok(value) => value.parse()?,
            Err(_) => defaults.strategy,
        };
        let model_id = env::var(Self::ENV_MODEL_ID).unwrap_or(defaults.model_id);
        let model_dir = Self::parse_optional_path_from_env(Self::ENV_MODEL_DIR);
        let cache_location = Self::parse_optional_path_from_env(Self::ENV_CACHE_LOCATION);
        let embed_timeout_ms =
            Self::parse_u64_from_env(Self::ENV_EMBED_TIMEOUT_MS, defaults.embed_timeout_ms)?;

        let config = Self {
            threshold,
            top_k,
            limit,
            strategy,
            model_id,
            model_dir,
            cache_location,
            embed_timeout_ms,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates ranges and paths (does not create directories).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=crate::lexical::MAX_SCORE).contains(&self.threshold) {
            return Err(ConfigError::ThresholdOutOfRange {
                value: self.threshold,
            });
        }
        if self.top_k == 0 {
            return Err(ConfigError::ZeroCount { name: "top_k" });
        }
        if self.limit == 0 {
            return Err(ConfigError::ZeroCount { name: "limit" });
        }
        if let Some(ref path) = self.model_dir
            && path.exists()
            && !path.is_dir()
        {
            return Err(ConfigError::NotADirectory { path: path.clone() });
        }
        Ok(())
    }

    fn parse_f64_from_env(name: &'static str, default: f64) -> Result<f64, ConfigError> {
        match env::var(name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::NumberParse { name, value }),
            Err(_) => Ok(default),
        }
    }

    fn parse_usize_from_env(name: &'static str, default: usize) -> Result<usize, ConfigError> {
        match env::var(name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::NumberParse { name, value }),
            Err(_) => Ok(default),
        }
    }

    fn parse_u64_from_env(name: &'static str, default: u64) -> Result<u64, ConfigError> {
        match env::var(name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::NumberParse { name, value }),
            Err(_) => Ok(default),
        }
    }

    fn parse_optional_path_from_env(name: &'static str) -> Option<PathBuf> {
        env::var(name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }
}
