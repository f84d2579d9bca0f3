//! Lexical includes scoring
//!
//! Fraction of expected facts found verbatim in the completion, after
//! optional case folding and punctuation removal.

use serde::{Deserialize, Serialize};
use vignette_core::ScoringConfig;

/// Normalisation applied to both sides before matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludesOptions {
    /// Lower-case both sides
    pub ignore_case: bool,
    /// Strip punctuation from both sides
    pub remove_punctuation: bool,
}

impl Default for IncludesOptions {
    fn default() -> Self {
        Self {
            ignore_case: true,
            remove_punctuation: true,
        }
    }
}

impl From<&ScoringConfig> for IncludesOptions {
    fn from(config: &ScoringConfig) -> Self {
        Self {
            ignore_case: config.ignore_case,
            remove_punctuation: config.remove_punctuation,
        }
    }
}

/// Lexical score with its explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncludesScore {
    /// Matched fraction
    pub value: f32,
    /// Targets found
    pub matched: Vec<String>,
    /// Targets not found
    pub missed: Vec<String>,
}

fn is_removed(c: char) -> bool {
    c.is_ascii_punctuation() || matches!(c, '—' | '£' | '’')
}

fn normalise(text: &str, options: IncludesOptions) -> String {
    let text = if options.ignore_case {
        text.to_lowercase()
    } else {
        text.to_string()
    };
    if options.remove_punctuation {
        text.chars().filter(|c| !is_removed(*c)).collect::<String>().trim().to_string()
    } else {
        text
    }
}

/// Score `targets` against `completion`; no targets scores 0.0
#[must_use]
pub fn includes_score(completion: &str, targets: &[String], options: IncludesOptions) -> IncludesScore {
    let haystack = normalise(completion, options);
    let (matched, missed): (Vec<String>, Vec<String>) = targets
        .iter()
        .cloned()
        .partition(|target| haystack.contains(&normalise(target, options)));
    let value = if targets.is_empty() {
        0.0
    } else {
        matched.len() as f32 / targets.len() as f32
    };
    IncludesScore {
        value,
        matched,
        missed,
    }
}
