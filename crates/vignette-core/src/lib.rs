//! Vignette Core
//!
//! Shared data model for the vignette pipeline.
//!
//! # Overview
//!
//! - **Document**: generated text carrying `{INSERT_FACT_SNIPPET_n}` placeholders
//! - **SnippetCatalog**: candidate facts keyed by case category and placeholder label
//! - **Vignette**: a document with every placeholder resolved to literal text
//! - **PipelineConfig**: thresholds and paths shared by every stage
//!
//! # Pipeline
//!
//! ```text
//! responses/ → checks → ok_responses/ → insert → vignettes/ → finalise → dataset/
//!                                                                   ↓
//!                                             eval logs → score → results/
//! ```
//!
//! # Example
//!
//! ```rust
//! use vignette_core::placeholder;
//!
//! let text = "Opening.\n\n{INSERT_FACT_SNIPPET_1}\n\n{INSERT_FACT_SNIPPET_2}.";
//! let found = placeholder::scan(text);
//! assert_eq!(found.len(), 2);
//! assert_eq!(found[1].label, "2");
//! ```

#![warn(missing_docs)]

pub mod catalog;
pub mod config;
pub mod corpus;
pub mod error;
pub mod placeholder;
pub mod text;
pub mod types;

// Re-exports
pub use catalog::{IncludeAudit, IncludeViolation, SnippetCatalog};
pub use config::{
    EmbeddingBackendConfig, FinaliseConfig, GroundTruthField, PipelineConfig, ScoringConfig,
    SubstitutionConfig, ValidationConfig, CorpusConfig,
};
pub use error::{
    CatalogError, ConfigError, LoadError, ParseCategoryError, SubstitutionError, VignetteError,
    VignetteResult,
};
pub use types::{CaseCategory, Document, EvalSample, SnippetCandidate, Vignette};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for pipeline stages
    pub use crate::{
        CaseCategory, Document, PipelineConfig, SnippetCandidate, SnippetCatalog, Vignette,
        VignetteError, VignetteResult,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
