//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A numeric environment variable could not be parsed.
    #[error("failed to parse {name}='{value}' as a number")]
    NumberParse { name: &'static str, value: String },

    /// Strategy string is not one of lexical|semantic|hybrid|auto.
    #[error("unknown strategy '{value}' (expected lexical, semantic, hybrid or auto)")]
    UnknownStrategy { value: String },

    /// Lexical threshold outside the 0-100 score scale.
    #[error("threshold {value} is outside the lexical score scale 0-100")]
    ThresholdOutOfRange { value: f64 },

    /// A count setting that must be positive was zero.
    #[error("{name} must be greater than zero")]
    ZeroCount { name: &'static str },

    /// Path exists but is not a directory (when a directory was expected).
    #[error("path is not a directory: {path}")]
    NotADirectory { path: PathBuf },
}
