//! Vignette Score
//!
//! Scores summarising models on how many inserted facts survive into their
//! extracted-sentence output.
//!
//! # Overview
//!
//! A model's output is pulled from its provider-specific message shape by an
//! [`OutputAdapter`], parsed into a list of sentences (repairing unescaped
//! quotes where needed), then compared with the ground-truth facts:
//!
//! - **Coverage**: sentences and facts are embedded together; a fact counts
//!   as covered when its best cosine similarity exceeds the threshold.
//! - **Includes**: the fraction of `include` strings found in the raw output
//!   after case and punctuation normalisation.
//!
//! # Example
//!
//! ```rust
//! use vignette_score::{CoverageScorer, HashEmbedder};
//!
//! let embedder = HashEmbedder::new(256, 42).unwrap();
//! let scorer = CoverageScorer::new(&embedder, 0.85);
//! let outputs = vec!["Mr H was found with a knife.".to_string()];
//! let truths = vec!["Mr H was found with a knife.".to_string()];
//! assert_eq!(scorer.score(&outputs, &truths).unwrap(), 1.0);
//! ```

#![warn(missing_docs)]

pub mod adapters;
pub mod coverage;
pub mod embed;
pub mod error;
pub mod includes;
pub mod log;
pub mod parse;

// Re-exports
pub use adapters::{AdapterRegistry, ContentBlock, MessageContent, OutputAdapter};
pub use coverage::{CoverageScorer, SimilarityMatrix};
pub use embed::{build_embedder, normalize, Embedder, HashEmbedder, OpenAiEmbedder};
pub use error::{EmbedError, ScoreError};
pub use includes::{includes_score, IncludesOptions, IncludesScore};
pub use log::{mean, EvalLog, EvaluationResult, LogEvaluator, LoggedSample, Target};
pub use parse::{escape_internal_quotes, parse_sentence_list, parse_string_dict, ParseOutcome};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
