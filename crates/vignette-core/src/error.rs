//! Error types for the vignette pipeline
//!
//! Provides error handling for:
//! - Loading corpora, catalogs and logs (file → records)
//! - Catalog integrity (include not found in snippet)
//! - Substitution (unresolvable or residual placeholders)
//! - Configuration files
//!
//! Structural check failures are data, not errors, and never appear here.

use crate::catalog::IncludeViolation;
use crate::types::CaseCategory;
use std::path::PathBuf;

/// Unknown case-category name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown case category: '{0}'")]
pub struct ParseCategoryError(pub String);

/// Errors while reading or writing pipeline files
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// IO error on a pipeline file
    #[error("io error on {path}: {source}")]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Malformed JSON
    #[error("invalid json in {path}: {source}")]
    Json {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },

    /// Invalid file-name pattern
    #[error("invalid file pattern '{pattern}': {message}")]
    Pattern {
        /// Pattern as given
        pattern: String,
        /// Parser message
        message: String,
    },

    /// Directory name is not a case category
    #[error("category error: {0}")]
    Category(#[from] ParseCategoryError),
}

impl LoadError {
    /// Create IO error for path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create JSON error for path
    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}

/// Malformed snippet catalog
#[derive(Debug, Clone, thiserror::Error)]
pub enum CatalogError {
    /// One or more candidates have an `include` outside their `snippet`
    #[error("{count} catalog candidate(s) have an include missing from their snippet; first: {first}")]
    IncludeNotInSnippet {
        /// Number of offending candidates
        count: usize,
        /// First offending candidate in catalog order
        first: IncludeViolation,
        /// Every offending candidate
        violations: Vec<IncludeViolation>,
    },

    /// No entries loaded for a category that documents refer to
    #[error("no snippet catalog loaded for category '{0}'")]
    MissingCategory(CaseCategory),
}

/// Errors turning a document into a vignette
#[derive(Debug, Clone, thiserror::Error)]
pub enum SubstitutionError {
    /// Placeholder label has no registered candidates
    #[error("no snippet candidates for placeholder {label} in category '{category}' (document {model}/{document})")]
    NoCandidates {
        /// Document identifier
        document: String,
        /// Source model
        model: String,
        /// Case category
        category: CaseCategory,
        /// Placeholder label, e.g. "3"
        label: String,
    },

    /// Placeholder tokens survived the substitution pass
    #[error("{residual} placeholder token(s) remain after substitution in document {model}/{document}")]
    IncompleteSubstitution {
        /// Document identifier
        document: String,
        /// Source model
        model: String,
        /// Residual marker count
        residual: usize,
    },

    /// Catalog failed its integrity audit
    #[error("catalog integrity: {0}")]
    Catalog(#[from] CatalogError),
}

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file unreadable
    #[error("io error reading config {path}: {source}")]
    Io {
        /// Config path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for the schema
    #[error("invalid config {path}: {source}")]
    Toml {
        /// Config path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: toml::de::Error,
    },

    /// Values parse but are out of range
    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Combined pipeline error
#[derive(Debug, thiserror::Error)]
pub enum VignetteError {
    /// Load/store failure
    #[error("load error: {0}")]
    Load(#[from] LoadError),

    /// Catalog integrity failure
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Substitution failure
    #[error("substitution error: {0}")]
    Substitution(#[from] SubstitutionError),

    /// Configuration failure
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

impl VignetteError {
    /// Whether the error must abort the whole batch
    ///
    /// Every variant here is fatal; recoverable conditions (bad model output,
    /// failing checks) are absorbed into scores and check records instead.
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        true
    }
}

/// Result type alias for pipeline operations
pub type VignetteResult<T> = Result<T, VignetteError>;
