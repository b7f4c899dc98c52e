//! Error types for the evaluation harness.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our custom error.
pub type Result<T> = std::result::Result<T, EvalError>;

/// Errors that can occur while running an evaluation.
#[derive(Error, Debug)]
pub enum EvalError {
    /// Error reading or writing files.
    #[error("I/O error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Error during serialization/deserialization.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// No dataset registered under the requested name.
    #[error("Unknown dataset '{0}'")]
    UnknownDataset(String),

    /// A dataset violates a structural invariant.
    #[error("Invalid dataset '{name}': {reason}")]
    InvalidDataset { name: String, reason: String },

    /// Evaluation was requested for a dataset with zero items.
    /// The mean similarity would be undefined, so this is fatal.
    #[error("Dataset '{0}' contains no items")]
    EmptyDataset(String),

    /// Generation API returned an error response.
    #[error("Generation API error: {0}")]
    GenerationApi(String),

    /// HTTP request error.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The embedding backend failed. Similarity is the whole point of the
    /// harness, so this is fatal for the run rather than defaulted to zero.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// The embedding backend does not define an embedding for empty input.
    #[error("Embedding backend cannot embed empty input")]
    EmptyInput,
}

impl EvalError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<reqwest::Error> for EvalError {
    fn from(err: reqwest::Error) -> Self {
        EvalError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for EvalError {
    fn from(err: serde_json::Error) -> Self {
        EvalError::Serialization(err.to_string())
    }
}

impl From<candle_core::Error> for EvalError {
    fn from(err: candle_core::Error) -> Self {
        EvalError::Embedding(err.to_string())
    }
}
