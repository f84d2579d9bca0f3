//! Error types for the scoring stage
//!
//! Malformed model output is not an error here: it is a
//! [`ParseOutcome`](crate::parse::ParseOutcome) that scores zero. These
//! errors cover unreadable logs and failing embedding backends, both of
//! which abort the batch.

use std::path::PathBuf;
use vignette_core::LoadError;

/// Embedding backend failures
#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    /// Transport-level failure
    #[error("embedding request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("embedding backend returned {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Error message from the body, if any
        message: String,
    },

    /// Backend returned a different number of vectors than inputs
    #[error("embedding backend returned {got} vector(s) for {expected} input(s)")]
    CountMismatch {
        /// Inputs sent
        expected: usize,
        /// Vectors received
        got: usize,
    },

    /// Vectors of differing dimension
    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    Dimension {
        /// Dimension of the first vector
        expected: usize,
        /// Offending dimension
        got: usize,
    },

    /// Invalid backend settings
    #[error("invalid embedding backend: {0}")]
    Config(String),
}

/// Errors scoring a directory of evaluation logs
#[derive(Debug, thiserror::Error)]
pub enum ScoreError {
    /// Log unreadable or results unwritable
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Embedding failed while scoring a log
    #[error("embedding failed for log {path}: {source}")]
    Embed {
        /// Log being scored
        path: PathBuf,
        /// Underlying error
        #[source]
        source: EmbedError,
    },
}

impl ScoreError {
    /// Create embedding error for a log
    pub fn embed(path: impl Into<PathBuf>, source: EmbedError) -> Self {
        Self::Embed {
            path: path.into(),
            source,
        }
    }
}
