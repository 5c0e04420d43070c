//! Error types for gist.

use thiserror::Error;

/// Result type for gist operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for gist operations.
///
/// Only hard failures live here. Soft, per-metric conditions (empty text
/// handed to a readability formula, too few tokens for an n-gram model)
/// are reported in-band as [`crate::metrics::MetricValue::Unavailable`]
/// so that score reports can render partially.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Caller supplied blank or whitespace-only input text.
    #[error("empty input: nothing to transform")]
    EmptyInput,

    /// The underlying generator could not be loaded or failed mid-call.
    #[error("generator unavailable: {0}")]
    GenerationUnavailable(String),

    /// A caller-supplied deadline elapsed before generation completed.
    #[error("generation deadline exceeded")]
    GenerationTimeout,

    /// Invalid input provided (programmer error, not a data condition).
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Create a generation-unavailable error.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Error::GenerationUnavailable(msg.into())
    }

    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }
}
