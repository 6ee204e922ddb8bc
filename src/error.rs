//! Error types for biograph.

use thiserror::Error;

/// Result type for biograph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for biograph operations.
///
/// Only malformed layer input is fatal for a document; every other anomaly
/// (alignment gaps, unresolvable relation endpoints, unparseable dates,
/// duplicate identifiers) is recovered locally by a documented drop policy
/// and never surfaces here.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A layer record is missing a required field or carries an
    /// uninterpretable value. Aborts the current document.
    #[error("Malformed layer input: {0}")]
    MalformedLayer(String),

    /// Invalid input provided (bad path, empty bundle, unusable argument).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a malformed layer error.
    pub fn malformed_layer(msg: impl Into<String>) -> Self {
        Error::MalformedLayer(msg.into())
    }

    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }
}
