//! Pipeline configuration
//!
//! Every stage reads its thresholds from one `PipelineConfig`, loaded from an
//! optional TOML file. Missing keys fall back to the defaults below.

use crate::error::ConfigError;
use crate::placeholder::CLOSING_SENTENCE;
use crate::types::CaseCategory;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Which documents to load
    pub corpus: CorpusConfig,
    /// Structural validator thresholds
    pub validation: ValidationConfig,
    /// Snippet substitution settings
    pub substitution: SubstitutionConfig,
    /// Finalisation settings
    pub finalise: FinaliseConfig,
    /// Similarity scoring settings
    pub scoring: ScoringConfig,
}

impl PipelineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// IO and TOML errors, plus `ConfigError::Invalid` for out-of-range values.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&raw).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded pipeline config");
        Ok(config)
    }

    /// Load from a file if given, otherwise defaults
    ///
    /// # Errors
    /// As [`PipelineConfig::from_file`].
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// With substitution seed
    #[inline]
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.substitution.seed = seed;
        self
    }

    /// With similarity threshold
    #[inline]
    #[must_use]
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.scoring.threshold = threshold;
        self
    }

    /// With models to load
    #[inline]
    #[must_use]
    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.corpus.models = models;
        self
    }

    /// With categories to load
    #[inline]
    #[must_use]
    pub fn with_categories(mut self, categories: Vec<CaseCategory>) -> Self {
        self.corpus.categories = categories;
        self
    }

    /// Range checks that serde cannot express
    ///
    /// # Errors
    /// `ConfigError::Invalid` naming the offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(-1.0..=1.0).contains(&self.scoring.threshold) {
            return Err(ConfigError::Invalid(format!(
                "scoring.threshold must be within [-1, 1], got {}",
                self.scoring.threshold
            )));
        }
        for (key, (min_words, max_words)) in [
            ("validation.heading_words", self.validation.heading_words),
            ("finalise.heading_words", self.finalise.heading_words),
        ] {
            if min_words > max_words {
                return Err(ConfigError::Invalid(format!(
                    "{key} lower bound {min_words} exceeds upper bound {max_words}"
                )));
            }
        }
        if self.validation.expected_snippets == 0 {
            return Err(ConfigError::Invalid(
                "validation.expected_snippets must be positive".to_string(),
            ));
        }
        if let EmbeddingBackendConfig::Hash { dimensions, .. } = self.scoring.embedding {
            if dimensions == 0 {
                return Err(ConfigError::Invalid(
                    "scoring.embedding.dimensions must be positive".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Which generated documents to load
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// Model directory names
    pub models: Vec<String>,
    /// Category directory names
    pub categories: Vec<CaseCategory>,
    /// File-name glob inside each `<model>/<category>` directory
    pub pattern: String,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            models: vec![
                "gpt-4.1-2025-04-14".to_string(),
                "gpt-4.1-mini-2025-04-14".to_string(),
            ],
            categories: CaseCategory::ALL.to_vec(),
            pattern: "temp_*.txt".to_string(),
        }
    }
}

/// Structural validator thresholds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Required maximum placeholder index
    pub expected_snippets: u64,
    /// Longest allowed run of placeholders separated only by punctuation/whitespace
    pub max_consecutive_snippets: usize,
    /// Minimum characters between placeholder 1 and the last placeholder
    pub min_snippet_distance: i64,
    /// Characters inspected before each placeholder by the mid-sentence check
    pub midsentence_window: usize,
    /// Phrase whose presence discloses how the document was built
    pub disclosure_phrase: String,
    /// Sentence the document must end with
    pub closing_sentence: String,
    /// Word bounds for heading statistics
    pub heading_words: (usize, usize),
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            expected_snippets: 8,
            max_consecutive_snippets: 2,
            min_snippet_distance: 3000,
            midsentence_window: 30,
            disclosure_phrase: "red herring".to_string(),
            closing_sentence: CLOSING_SENTENCE.to_string(),
            heading_words: (2, 6),
        }
    }
}

/// Snippet substitution settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubstitutionConfig {
    /// Seed for the batch-wide candidate stream
    pub seed: u64,
}

impl Default for SubstitutionConfig {
    fn default() -> Self {
        Self { seed: 2025 }
    }
}

/// Finalisation settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinaliseConfig {
    /// Index of the last header line exempt from heading removal
    pub ignore_first_n: usize,
    /// Word bounds for a line to count as a heading
    pub heading_words: (usize, usize),
    /// Whether to collapse all whitespace runs to one space
    pub collapse_whitespace: bool,
}

impl Default for FinaliseConfig {
    fn default() -> Self {
        Self {
            ignore_first_n: 10,
            heading_words: (2, 6),
            collapse_whitespace: true,
        }
    }
}

/// Text of the expected candidates that scoring embeds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroundTruthField {
    /// The `include` fact (sample `target`)
    #[default]
    Include,
    /// The full inserted `snippet` (sample `choices`)
    Snippet,
}

impl std::str::FromStr for GroundTruthField {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "include" => Ok(Self::Include),
            "snippet" => Ok(Self::Snippet),
            other => Err(ConfigError::Invalid(format!(
                "ground truth must be 'include' or 'snippet', got '{other}'"
            ))),
        }
    }
}

/// Embedding backend selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum EmbeddingBackendConfig {
    /// Offline feature-hashing embedder
    Hash {
        /// Vector dimension
        dimensions: usize,
        /// Hash seed
        seed: u64,
    },
    /// OpenAI-compatible `/embeddings` endpoint
    #[serde(alias = "openai")]
    OpenAi {
        /// Model name sent with each request
        model: String,
        /// Base URL, e.g. `https://api.openai.com/v1`
        base_url: String,
        /// Environment variable holding the API key
        api_key_env: String,
        /// Inputs per request
        batch_size: usize,
    },
}

impl Default for EmbeddingBackendConfig {
    fn default() -> Self {
        Self::OpenAi {
            model: "BAAI/bge-large-en-v1.5".to_string(),
            base_url: "http://localhost:8080/v1".to_string(),
            api_key_env: "EMBEDDING_API_KEY".to_string(),
            batch_size: 32,
        }
    }
}

/// Similarity scoring settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// A ground-truth fact is covered when its best similarity exceeds this
    pub threshold: f32,
    /// Which candidate text to embed as ground truth
    pub ground_truth: GroundTruthField,
    /// Embedding backend
    pub embedding: EmbeddingBackendConfig,
    /// Case-fold before lexical matching
    pub ignore_case: bool,
    /// Strip punctuation before lexical matching
    pub remove_punctuation: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            threshold: 0.85,
            ground_truth: GroundTruthField::Include,
            embedding: EmbeddingBackendConfig::default(),
            ignore_case: true,
            remove_punctuation: true,
        }
    }
}
