//! Vignette Insert
//!
//! Turns screened documents into vignettes: seeded snippet substitution,
//! heading/whitespace clean-up, and export of the evaluation dataset.
//!
//! # Determinism
//!
//! One [`SubstitutionEngine`] owns one pseudo-random stream, seeded once per
//! batch. The chosen candidates are a pure function of the seed, the catalog,
//! and the ordered document list.
//!
//! # Example
//!
//! ```rust
//! use vignette_core::{CaseCategory, Document, SnippetCandidate, SnippetCatalog};
//! use vignette_insert::SubstitutionEngine;
//!
//! let mut catalog = SnippetCatalog::new();
//! catalog.insert(
//!     CaseCategory::Shoplifting,
//!     "1",
//!     vec![SnippetCandidate::new("He took gin.", "took gin")],
//! );
//! let doc = Document::new("temp_1", "m", CaseCategory::Shoplifting, "{INSERT_FACT_SNIPPET_1}.");
//!
//! let mut engine = SubstitutionEngine::seeded(2025);
//! let vignette = engine.insert_snippets(&doc, &catalog).unwrap();
//! assert_eq!(vignette.vignette, "He took gin.");
//! assert_eq!(vignette.include, vec!["took gin".to_string()]);
//! ```

#![warn(missing_docs)]

pub mod engine;
pub mod finalise;
pub mod store;

// Re-exports
pub use engine::SubstitutionEngine;
pub use finalise::{
    build_dataset, collapse_whitespace, export_dataset, finalise, remove_headings, write_dataset,
};
pub use store::{load_vignettes, save_vignette};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
