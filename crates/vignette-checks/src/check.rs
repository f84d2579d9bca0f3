//! Check registry and aggregation
//!
//! Checks are registered on a [`CheckSuite`] and run independently. Their
//! named values are merged, in registration order, into one [`CheckRecord`]
//! per document. Aggregation only looks at [`CheckValue::Flag`] values, so
//! adding a check never requires touching this module.

use crate::checks::{
    ClosingSentenceCheck, DisclosureCheck, DistanceCheck, HeadingCountCheck, MidSentenceCheck,
    SnippetInfoCheck, SpacingCheck, TokenCountCheck, WordCountCheck,
};
use crate::tokens::TokenCounter;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use vignette_core::{CaseCategory, Document, ValidationConfig};

/// One named check value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CheckValue {
    /// Pass/fail gate
    Flag(bool),
    /// Descriptive statistic, never a gate
    Count(i64),
}

impl CheckValue {
    /// Gate value, if this is a flag
    #[inline]
    #[must_use]
    pub fn as_flag(self) -> Option<bool> {
        match self {
            Self::Flag(b) => Some(b),
            Self::Count(_) => None,
        }
    }

    /// Statistic value, if this is a count
    #[inline]
    #[must_use]
    pub fn as_count(self) -> Option<i64> {
        match self {
            Self::Count(n) => Some(n),
            Self::Flag(_) => None,
        }
    }
}

/// Named values produced by one check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckOutcome {
    values: Vec<(&'static str, CheckValue)>,
}

impl CheckOutcome {
    /// Create empty outcome
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a gate value
    #[must_use]
    pub fn flag(mut self, name: &'static str, value: bool) -> Self {
        self.values.push((name, CheckValue::Flag(value)));
        self
    }

    /// Add a statistic
    #[must_use]
    pub fn count(mut self, name: &'static str, value: i64) -> Self {
        self.values.push((name, CheckValue::Count(value)));
        self
    }

    /// Values in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, CheckValue)> + '_ {
        self.values.iter().copied()
    }
}

/// An independent predicate over document text
pub trait StructuralCheck: Send + Sync {
    /// Check name, for logs
    fn name(&self) -> &'static str;

    /// Evaluate against the raw text
    fn evaluate(&self, text: &str) -> CheckOutcome;
}

/// Merged check values for one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRecord {
    /// Source model
    pub model: String,
    /// Case category
    #[serde(rename = "case_type")]
    pub category: CaseCategory,
    /// Document identifier
    #[serde(rename = "filename")]
    pub id: String,
    /// Source file, when loaded from disk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Every check value, in registration order
    #[serde(flatten)]
    pub values: IndexMap<String, CheckValue>,
    /// Conjunction of every flag value
    pub passes_all_checks: bool,
}

impl CheckRecord {
    /// Value of a named check
    #[must_use]
    pub fn get(&self, name: &str) -> Option<CheckValue> {
        self.values.get(name).copied()
    }

    /// Gate value of a named check
    #[must_use]
    pub fn flag(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(CheckValue::as_flag)
    }

    /// Statistic value of a named check
    #[must_use]
    pub fn count(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(CheckValue::as_count)
    }

    /// Names of the flags that are false
    pub fn failed_checks(&self) -> impl Iterator<Item = &str> {
        self.values
            .iter()
            .filter(|(_, v)| v.as_flag() == Some(false))
            .map(|(k, _)| k.as_str())
    }
}

/// Ordered set of structural checks
#[derive(Default)]
pub struct CheckSuite {
    checks: Vec<Box<dyn StructuralCheck>>,
}

impl std::fmt::Debug for CheckSuite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckSuite")
            .field("checks", &self.check_names())
            .finish()
    }
}

impl CheckSuite {
    /// Create empty suite
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a check; values appear in registration order
    pub fn register<C: StructuralCheck + 'static>(&mut self, check: C) {
        self.checks.push(Box::new(check));
    }

    /// Register a check, builder style
    #[must_use]
    pub fn with_check<C: StructuralCheck + 'static>(mut self, check: C) -> Self {
        self.register(check);
        self
    }

    /// Full battery used to screen generated documents
    #[must_use]
    pub fn standard(config: &ValidationConfig, tokens: Arc<dyn TokenCounter>) -> Self {
        Self::new()
            .with_check(SnippetInfoCheck::new(config.expected_snippets))
            .with_check(DisclosureCheck::new(config.disclosure_phrase.clone()))
            .with_check(SpacingCheck::new(config.max_consecutive_snippets))
            .with_check(MidSentenceCheck::new(config.midsentence_window))
            .with_check(ClosingSentenceCheck::new(config.closing_sentence.clone()))
            .with_check(WordCountCheck)
            .with_check(TokenCountCheck::new(tokens))
            .with_check(DistanceCheck::new(
                config.expected_snippets,
                config.min_snippet_distance,
            ))
            .with_check(HeadingCountCheck::new(config.heading_words))
    }

    /// Names of registered checks
    #[must_use]
    pub fn check_names(&self) -> Vec<&'static str> {
        self.checks.iter().map(|c| c.name()).collect()
    }

    /// Number of registered checks
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// Whether no checks are registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Run every check and merge the results
    ///
    /// A later check writing an existing key overwrites the earlier value.
    #[must_use]
    pub fn evaluate(&self, document: &Document) -> CheckRecord {
        let mut values = IndexMap::new();
        for check in &self.checks {
            for (name, value) in check.evaluate(&document.text).iter() {
                values.insert(name.to_string(), value);
            }
        }
        let passes_all_checks = values.values().all(|v| v.as_flag() != Some(false));
        let record = CheckRecord {
            model: document.model.clone(),
            category: document.category,
            id: document.id.clone(),
            path: document.path.clone(),
            values,
            passes_all_checks,
        };
        tracing::debug!(
            model = %record.model,
            category = %record.category,
            id = %record.id,
            passes = record.passes_all_checks,
            "checked document"
        );
        record
    }
}
