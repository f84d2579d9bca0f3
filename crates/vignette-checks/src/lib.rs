//! Vignette Checks
//!
//! Structural validation of generated documents before snippet insertion.
//!
//! # Overview
//!
//! Each check is an independent predicate over the document text that yields
//! one or more named values. A [`CheckSuite`] runs every registered check and
//! merges the values into a [`CheckRecord`]; only boolean values gate
//! `passes_all_checks`, numeric values are carried for analysis.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use vignette_checks::{CheckSuite, WhitespaceCounter};
//! use vignette_core::{CaseCategory, Document, ValidationConfig};
//!
//! let suite = CheckSuite::standard(&ValidationConfig::default(), Arc::new(WhitespaceCounter));
//! let doc = Document::new("temp_1", "gpt-4.1", CaseCategory::Shoplifting, "Too short.");
//! let record = suite.evaluate(&doc);
//! assert!(!record.passes_all_checks);
//! ```

#![warn(missing_docs)]

pub mod check;
pub mod checks;
pub mod error;
pub mod screen;
pub mod tokens;

// Re-exports
pub use check::{CheckOutcome, CheckRecord, CheckSuite, CheckValue, StructuralCheck};
pub use checks::{
    ClosingSentenceCheck, DisclosureCheck, DistanceCheck, HeadingCountCheck, MidSentenceCheck,
    SnippetInfo, SnippetInfoCheck, SpacingCheck, TokenCountCheck, WordCountCheck,
};
pub use error::CheckError;
pub use screen::{copy_passing, screen, PassTally, ScreeningReport};
pub use tokens::{TiktokenCounter, TokenCounter, WhitespaceCounter};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
