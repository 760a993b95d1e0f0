//! Dataset loading error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading a dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Required canonical fields could not be resolved from the input
    /// headers. Carries every missing field, not just the first.
    #[error("missing required columns: {}", missing_fields.join(", "))]
    Schema { missing_fields: Vec<String> },

    /// The input file could not be opened.
    #[error("failed to open dataset at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV reader failed mid-stream (malformed quoting, IO error).
    #[error("failed to read dataset: {source}")]
    Read {
        #[source]
        source: csv::Error,
    },

    /// The input had no header row.
    #[error("dataset has no header row")]
    EmptyInput,
}

impl DatasetError {
    /// Builds a schema error from the unresolved field names.
    pub fn schema(missing: Vec<&'static str>) -> Self {
        DatasetError::Schema {
            missing_fields: missing.into_iter().map(String::from).collect(),
        }
    }
}

impl From<csv::Error> for DatasetError {
    fn from(source: csv::Error) -> Self {
        DatasetError::Read { source }
    }
}
