//! Core types for the vignette pipeline
//!
//! Defines:
//! - Case categories
//! - Generated documents and finalised vignettes
//! - Snippet candidates and evaluation samples

use crate::error::ParseCategoryError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Legal-case category a document is generated for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseCategory {
    /// Shop theft and related public-order offending
    Shoplifting,
    /// Offending within a domestic relationship
    DomesticAbuse,
    /// Terrorism-related offending
    Terrorism,
}

impl CaseCategory {
    /// Every category, in directory-listing order
    pub const ALL: [CaseCategory; 3] = [
        CaseCategory::DomesticAbuse,
        CaseCategory::Shoplifting,
        CaseCategory::Terrorism,
    ];

    /// Directory / wire name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseCategory::Shoplifting => "shoplifting",
            CaseCategory::DomesticAbuse => "domestic_abuse",
            CaseCategory::Terrorism => "terrorism",
        }
    }
}

impl std::fmt::Display for CaseCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaseCategory {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shoplifting" => Ok(CaseCategory::Shoplifting),
            "domestic_abuse" => Ok(CaseCategory::DomesticAbuse),
            "terrorism" => Ok(CaseCategory::Terrorism),
            other => Err(ParseCategoryError(other.to_string())),
        }
    }
}

/// A generated document, read-only input to validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// File stem, stable across pipeline stages
    pub id: String,
    /// Identifier of the generating model
    pub model: String,
    /// Case category the document was generated for
    pub category: CaseCategory,
    /// Raw generated text
    pub text: String,
    /// Source file, when loaded from disk
    #[serde(skip)]
    pub path: Option<PathBuf>,
}

impl Document {
    /// Create an in-memory document
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        model: impl Into<String>,
        category: CaseCategory,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            model: model.into(),
            category,
            text: text.into(),
            path: None,
        }
    }

    /// Attach the source path
    #[inline]
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// One concrete fact option for a placeholder
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnippetCandidate {
    /// Literal replacement text
    pub snippet: String,
    /// Essential fact; must be a substring of `snippet`
    pub include: String,
}

impl SnippetCandidate {
    /// Create a candidate
    #[must_use]
    pub fn new(snippet: impl Into<String>, include: impl Into<String>) -> Self {
        Self {
            snippet: snippet.into(),
            include: include.into(),
        }
    }

    /// Whether `include` occurs literally inside `snippet`
    #[inline]
    #[must_use]
    pub fn include_is_contained(&self) -> bool {
        self.snippet.contains(&self.include)
    }
}

/// A document with every placeholder resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vignette {
    /// Source model
    pub model: String,
    /// Case category
    #[serde(rename = "case_type")]
    pub category: CaseCategory,
    /// Identifier of the source document
    #[serde(rename = "path")]
    pub id: String,
    /// Placeholder-bearing source text; dropped once finalised
    #[serde(rename = "text", default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Substituted text
    pub vignette: String,
    /// `include` of each chosen candidate, in resolution order
    pub include: Vec<String>,
    /// Chosen candidates, in resolution order
    pub choices: Vec<SnippetCandidate>,
}

/// Evaluation dataset entry for one finalised vignette
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalSample {
    /// Text shown to the summarising model
    pub input: String,
    /// Expected facts (`include` list)
    pub target: Vec<String>,
    /// Chosen candidates, for traceability
    pub choices: Vec<SnippetCandidate>,
}

impl From<&Vignette> for EvalSample {
    fn from(vignette: &Vignette) -> Self {
        Self {
            input: vignette.vignette.clone(),
            target: vignette.include.clone(),
            choices: vignette.choices.clone(),
        }
    }
}
