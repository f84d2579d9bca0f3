//! Snippet catalog
//!
//! Candidate facts keyed by case category, then by placeholder label
//! ("1".."8"). Loaded once per run and audited before any substitution.

use crate::error::CatalogError;
use crate::types::{CaseCategory, SnippetCandidate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Candidate lists per category and placeholder label
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnippetCatalog {
    entries: BTreeMap<CaseCategory, BTreeMap<String, Vec<SnippetCandidate>>>,
}

impl SnippetCatalog {
    /// Create empty catalog
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the candidate list for one placeholder label
    ///
    /// Replaces any list previously registered under the same key.
    pub fn insert(
        &mut self,
        category: CaseCategory,
        label: impl Into<String>,
        candidates: Vec<SnippetCandidate>,
    ) {
        self.entries
            .entry(category)
            .or_default()
            .insert(label.into(), candidates);
    }

    /// Candidates for a placeholder label, if registered
    #[must_use]
    pub fn candidates(&self, category: CaseCategory, label: &str) -> Option<&[SnippetCandidate]> {
        self.entries
            .get(&category)
            .and_then(|labels| labels.get(label))
            .map(Vec::as_slice)
    }

    /// Mutable candidate list, for targeted edits
    pub fn candidates_mut(
        &mut self,
        category: CaseCategory,
        label: &str,
    ) -> Option<&mut Vec<SnippetCandidate>> {
        self.entries
            .get_mut(&category)
            .and_then(|labels| labels.get_mut(label))
    }

    /// Whether any labels are registered for the category
    #[must_use]
    pub fn has_category(&self, category: CaseCategory) -> bool {
        self.entries.get(&category).is_some_and(|labels| !labels.is_empty())
    }

    /// Categories with at least one label
    pub fn categories(&self) -> impl Iterator<Item = CaseCategory> + '_ {
        self.entries
            .iter()
            .filter(|(_, labels)| !labels.is_empty())
            .map(|(category, _)| *category)
    }

    /// Every candidate with its coordinates: (category, label, position, candidate)
    pub fn iter(&self) -> impl Iterator<Item = (CaseCategory, &str, usize, &SnippetCandidate)> {
        self.entries.iter().flat_map(|(category, labels)| {
            labels.iter().flat_map(move |(label, list)| {
                list.iter()
                    .enumerate()
                    .map(move |(pos, c)| (*category, label.as_str(), pos, c))
            })
        })
    }

    /// Total number of candidates
    #[must_use]
    pub fn candidate_count(&self) -> usize {
        self.entries
            .values()
            .flat_map(BTreeMap::values)
            .map(Vec::len)
            .sum()
    }

    /// Check every candidate's `include` is a literal substring of its `snippet`
    ///
    /// Visits the whole catalog and reports every offending entry.
    #[must_use]
    pub fn do_snippets_contain_includes(&self) -> IncludeAudit {
        let mut audit = IncludeAudit::default();
        for (category, label, position, candidate) in self.iter() {
            audit.checked += 1;
            if !candidate.include_is_contained() {
                tracing::warn!(
                    %category,
                    label,
                    position,
                    include = %candidate.include,
                    "include is not contained in its snippet"
                );
                audit.violations.push(IncludeViolation {
                    category,
                    label: label.to_string(),
                    position,
                    candidate: candidate.clone(),
                });
            }
        }
        audit
    }

    /// Fatal form of the include audit
    ///
    /// # Errors
    /// `CatalogError::IncludeNotInSnippet` carrying every offending entry.
    pub fn ensure_includes_contained(&self) -> Result<(), CatalogError> {
        self.do_snippets_contain_includes().into_result()
    }
}

/// Candidate whose `include` is missing from its `snippet`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludeViolation {
    /// Case category
    pub category: CaseCategory,
    /// Placeholder label
    pub label: String,
    /// Position within the label's candidate list
    pub position: usize,
    /// Offending candidate
    pub candidate: SnippetCandidate,
}

impl std::fmt::Display for IncludeViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}[{}] include {:?} not in snippet {:?}",
            self.category, self.label, self.position, self.candidate.include, self.candidate.snippet
        )
    }
}

/// Outcome of the include audit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncludeAudit {
    /// Candidates inspected
    pub checked: usize,
    /// Offending candidates, in catalog order
    pub violations: Vec<IncludeViolation>,
}

impl IncludeAudit {
    /// True when no candidate violates containment
    #[inline]
    #[must_use]
    pub fn all_contained(&self) -> bool {
        self.violations.is_empty()
    }

    /// Convert into a fatal error when any violation exists
    ///
    /// # Errors
    /// `CatalogError::IncludeNotInSnippet` when the audit found violations.
    pub fn into_result(self) -> Result<(), CatalogError> {
        match self.violations.first().cloned() {
            None => Ok(()),
            Some(first) => Err(CatalogError::IncludeNotInSnippet {
                count: self.violations.len(),
                first,
                violations: self.violations,
            }),
        }
    }
}
