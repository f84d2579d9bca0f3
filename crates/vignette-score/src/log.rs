//! Evaluation logs
//!
//! One log holds one model's outputs for many vignettes. Each sample is
//! scored twice: embedding coverage against the ground-truth facts, and
//! lexical inclusion of the `include` strings. Bad model output scores zero;
//! unreadable logs and backend failures abort.

use crate::adapters::{AdapterRegistry, MessageContent};
use crate::coverage::CoverageScorer;
use crate::error::{EmbedError, ScoreError};
use crate::includes::{includes_score, IncludesOptions};
use crate::parse::{parse_sentence_list, parse_string_dict};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use vignette_core::corpus;
use vignette_core::{GroundTruthField, SnippetCandidate};

/// Run-level metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvalHeader {
    /// Task identifier
    #[serde(default)]
    pub task: String,
    /// Dataset provenance
    #[serde(default)]
    pub dataset: DatasetInfo,
    /// Model identifier, e.g. `anthropic/claude-3-haiku-20240307`
    pub model: String,
    /// Generation settings
    #[serde(default)]
    pub model_generate_config: GenerateConfig,
}

/// Dataset provenance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetInfo {
    /// Dataset name
    #[serde(default)]
    pub name: Option<String>,
    /// Dataset location
    #[serde(default)]
    pub location: Option<String>,
}

/// Generation settings recorded with the run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateConfig {
    /// Completion token limit
    #[serde(default)]
    pub max_tokens: Option<u64>,
}

/// Expected facts: a single string or a list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Target {
    /// One fact
    One(String),
    /// Several facts
    Many(Vec<String>),
}

impl Default for Target {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl Target {
    /// Facts as a list
    #[must_use]
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Self::One(s) => vec![s.clone()],
            Self::Many(v) => v.clone(),
        }
    }
}

/// A chosen candidate, as an object or an encoded string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChoiceEntry {
    /// Structured candidate
    Candidate(SnippetCandidate),
    /// Encoded candidate
    Encoded(String),
}

impl ChoiceEntry {
    /// Decode into a candidate
    ///
    /// Strings are tried as JSON, then as a Python dict literal (`repr` of a
    /// candidate; `include` defaults to the snippet). Anything else is taken
    /// as the snippet text with an identical include.
    #[must_use]
    pub fn candidate(&self) -> SnippetCandidate {
        match self {
            Self::Candidate(c) => c.clone(),
            Self::Encoded(raw) => serde_json::from_str(raw)
                .ok()
                .or_else(|| decode_dict_literal(raw))
                .unwrap_or_else(|| {
                    tracing::warn!(choice = %raw, "undecodable choice, using it as the snippet");
                    SnippetCandidate::new(raw.clone(), raw.clone())
                }),
        }
    }
}

fn decode_dict_literal(raw: &str) -> Option<SnippetCandidate> {
    let mut fields = parse_string_dict(raw)?;
    let snippet = fields.remove("snippet")?;
    let include = fields.remove("include").unwrap_or_else(|| snippet.clone());
    Some(SnippetCandidate::new(snippet, include))
}

/// Chat message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message content
    #[serde(default)]
    pub content: MessageContent,
}

/// One completion choice
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputChoice {
    /// Assistant message
    #[serde(default)]
    pub message: ChatMessage,
}

/// Model output for a sample
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelOutput {
    /// Completion choices; the first is scored
    #[serde(default)]
    pub choices: Vec<OutputChoice>,
}

/// One evaluated vignette
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedSample {
    /// Model output
    #[serde(default)]
    pub output: ModelOutput,
    /// Expected `include` facts
    #[serde(default)]
    pub target: Target,
    /// Chosen candidates
    #[serde(default)]
    pub choices: Vec<ChoiceEntry>,
}

impl LoggedSample {
    /// Content of the first output choice
    #[must_use]
    pub fn content(&self) -> Option<&MessageContent> {
        self.output.choices.first().map(|c| &c.message.content)
    }

    /// Ground-truth texts for the selected field
    ///
    /// `Include` uses `target`, falling back to the candidates' includes when
    /// the target is empty.
    #[must_use]
    pub fn ground_truth(&self, field: GroundTruthField) -> Vec<String> {
        let candidates = || self.choices.iter().map(ChoiceEntry::candidate);
        match field {
            GroundTruthField::Include => {
                let target = self.target.to_vec();
                if target.is_empty() {
                    candidates().map(|c| c.include).collect()
                } else {
                    target
                }
            }
            GroundTruthField::Snippet => candidates().map(|c| c.snippet).collect(),
        }
    }
}

/// A whole evaluation log
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvalLog {
    /// Run metadata
    pub eval: EvalHeader,
    /// Samples
    #[serde(default)]
    pub samples: Vec<LoggedSample>,
}

impl EvalLog {
    /// Read a log file
    ///
    /// # Errors
    /// IO or JSON errors.
    pub fn read(path: &Path) -> Result<Self, ScoreError> {
        Ok(corpus::read_json(path)?)
    }
}

/// Per-log scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Task identifier
    pub task: String,
    /// Dataset name
    pub dataset: Option<String>,
    /// Dataset location
    pub dataset_location: Option<String>,
    /// Model identifier
    pub model: String,
    /// Completion token limit
    pub max_tokens: Option<u64>,
    /// Coverage score per sample
    pub scores: Vec<f32>,
    /// Lexical score per sample
    pub lexical_scores: Vec<f32>,
    /// Mean coverage score; 0.0 for no samples
    pub mean_score: f32,
}

/// Arithmetic mean; 0.0 for an empty slice
#[must_use]
pub fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f32>() / values.len() as f32
    }
}

/// Scores logs with one adapter registry and scorer
#[derive(Debug)]
pub struct LogEvaluator<'a> {
    adapters: AdapterRegistry,
    scorer: CoverageScorer<'a>,
    ground_truth: GroundTruthField,
    includes: IncludesOptions,
}

impl<'a> LogEvaluator<'a> {
    /// Create evaluator with the default adapters
    #[must_use]
    pub fn new(scorer: CoverageScorer<'a>) -> Self {
        Self {
            adapters: AdapterRegistry::with_defaults(),
            scorer,
            ground_truth: GroundTruthField::default(),
            includes: IncludesOptions::default(),
        }
    }

    /// With adapter registry
    #[must_use]
    pub fn with_adapters(mut self, adapters: AdapterRegistry) -> Self {
        self.adapters = adapters;
        self
    }

    /// With ground-truth field
    #[must_use]
    pub fn with_ground_truth(mut self, field: GroundTruthField) -> Self {
        self.ground_truth = field;
        self
    }

    /// With lexical matching options
    #[must_use]
    pub fn with_includes(mut self, options: IncludesOptions) -> Self {
        self.includes = options;
        self
    }

    /// Coverage and lexical score for one sample
    ///
    /// # Errors
    /// Embedding failures only.
    pub fn score_sample(&self, model: &str, sample: &LoggedSample) -> Result<(f32, f32), EmbedError> {
        let text = sample
            .content()
            .and_then(|content| self.adapters.extract(model, content))
            .unwrap_or_default();
        let outcome = parse_sentence_list(&text);
        if !outcome.is_ok() {
            tracing::warn!(%model, ?outcome, "unparseable model output scored zero");
        }
        let sentences = outcome.into_sentences();
        let truths = sample.ground_truth(self.ground_truth);
        let coverage = self.scorer.score(&sentences, &truths)?;
        let lexical = includes_score(&text, &sample.target.to_vec(), self.includes).value;
        Ok((coverage, lexical))
    }

    /// Score every sample in a log
    ///
    /// # Errors
    /// Embedding failures only.
    pub fn evaluate(&self, log: &EvalLog) -> Result<EvaluationResult, EmbedError> {
        let model = log.eval.model.as_str();
        let mut scores = Vec::with_capacity(log.samples.len());
        let mut lexical_scores = Vec::with_capacity(log.samples.len());
        for sample in &log.samples {
            let (coverage, lexical) = self.score_sample(model, sample)?;
            scores.push(coverage);
            lexical_scores.push(lexical);
        }
        Ok(EvaluationResult {
            task: log.eval.task.clone(),
            dataset: log.eval.dataset.name.clone(),
            dataset_location: log.eval.dataset.location.clone(),
            model: model.to_string(),
            max_tokens: log.eval.model_generate_config.max_tokens,
            mean_score: mean(&scores),
            scores,
            lexical_scores,
        })
    }

    /// Read, score and write one log to `<out_dir>/<file name>`
    ///
    /// # Errors
    /// Unreadable log, embedding failure, or unwritable result.
    pub fn evaluate_file(&self, path: &Path, out_dir: &Path) -> Result<EvaluationResult, ScoreError> {
        let log = EvalLog::read(path)?;
        tracing::info!(log = %path.display(), model = %log.eval.model, samples = log.samples.len(), "scoring log");
        let result = self.evaluate(&log).map_err(|e| ScoreError::embed(path, e))?;
        let out = out_dir.join(path.file_name().unwrap_or(path.as_os_str()));
        corpus::write_json(&out, &result)?;
        tracing::info!(
            out = %out.display(),
            mean_score = result.mean_score,
            "wrote evaluation result"
        );
        Ok(result)
    }

    /// Score every `*.json` log in a directory, in path order
    ///
    /// # Errors
    /// The first failing log aborts the batch.
    pub fn evaluate_dir(&self, logs_dir: &Path, out_dir: &Path) -> Result<Vec<(PathBuf, EvaluationResult)>, ScoreError> {
        let files = corpus::list_files(logs_dir, "*.json")?;
        let mut results = Vec::with_capacity(files.len());
        for path in files {
            let result = self.evaluate_file(&path, out_dir)?;
            results.push((path, result));
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::HashEmbedder;
    use pretty_assertions::assert_eq;

    const LOG: &str = r#"{
        "eval": {
            "task": "eval_shoplifting",
            "dataset": {"name": "shoplifting", "location": "./input/shoplifting.json"},
            "model": "openai/gpt-4o",
            "model_generate_config": {"max_tokens": 4096}
        },
        "samples": [
            {
                "output": {"choices": [{"message": {"content": "[\"He had a knife in his bag.\"]"}}]},
                "target": ["He had a knife in his bag."],
                "choices": ["{\"snippet\": \"Later, he had a knife in his bag.\", \"include\": \"He had a knife in his bag.\"}"]
            },
            {
                "output": {"choices": [{"message": {"content": "no list here"}}]},
                "target": ["He threatened staff."],
                "choices": [{"snippet": "He threatened staff.", "include": "He threatened staff."}]
            }
        ]
    }"#;

    #[test]
    fn log_parses_mixed_choice_shapes() {
        let log: EvalLog = serde_json::from_str(LOG).unwrap();
        assert_eq!(log.samples.len(), 2);
        let first = log.samples[0].choices[0].candidate();
        assert_eq!(first.snippet, "Later, he had a knife in his bag.");
        assert_eq!(
            log.samples[0].ground_truth(GroundTruthField::Snippet),
            vec!["Later, he had a knife in his bag.".to_string()]
        );
    }

    #[test]
    fn evaluates_with_hash_backend() {
        let log: EvalLog = serde_json::from_str(LOG).unwrap();
        let embedder = HashEmbedder::new(512, 1).unwrap();
        let evaluator = LogEvaluator::new(CoverageScorer::new(&embedder, 0.85));
        let result = evaluator.evaluate(&log).unwrap();
        assert_eq!(result.scores, vec![1.0, 0.0]);
        assert_eq!(result.lexical_scores, vec![1.0, 0.0]);
        assert!((result.mean_score - 0.5).abs() < f32::EPSILON);
        assert_eq!(result.max_tokens, Some(4096));
        assert_eq!(result.dataset.as_deref(), Some("shoplifting"));
    }

    #[test]
    fn empty_log_means_zero() {
        let log = EvalLog {
            eval: EvalHeader {
                model: "m".to_string(),
                ..EvalHeader::default()
            },
            samples: Vec::new(),
        };
        let embedder = HashEmbedder::new(8, 1).unwrap();
        let result = LogEvaluator::new(CoverageScorer::new(&embedder, 0.85))
            .evaluate(&log)
            .unwrap();
        assert_eq!(result.mean_score, 0.0);
        assert!(result.scores.is_empty());
    }

    #[test]
    fn repr_encoded_choice_is_decoded() {
        let sample: LoggedSample = serde_json::from_str(
            r#"{"target": [], "choices": ["{'snippet': 'He took three bottles of gin.', 'include': 'three bottles of gin'}"]}"#,
        )
        .unwrap();
        assert_eq!(
            sample.ground_truth(GroundTruthField::Snippet),
            vec!["He took three bottles of gin.".to_string()]
        );
        assert_eq!(
            sample.ground_truth(GroundTruthField::Include),
            vec!["three bottles of gin".to_string()]
        );
    }

    #[test]
    fn repr_choice_with_escapes_and_no_include() {
        let entry = ChoiceEntry::Encoded(r#"{'snippet': "It's \xa340 of whisky."}"#.to_string());
        assert_eq!(
            entry.candidate(),
            SnippetCandidate::new("It's £40 of whisky.", "It's £40 of whisky.")
        );
    }

    #[test]
    fn undecodable_choice_string_is_snippet() {
        let entry = ChoiceEntry::Encoded("He left by the back door.".to_string());
        let candidate = entry.candidate();
        assert_eq!(candidate.snippet, "He left by the back door.");
        assert_eq!(candidate.include, "He left by the back door.");
    }

    #[test]
    fn target_accepts_single_string() {
        let sample: LoggedSample = serde_json::from_str(r#"{"target": "one fact"}"#).unwrap();
        assert_eq!(sample.ground_truth(GroundTruthField::Include), vec!["one fact".to_string()]);
        assert!(sample.content().is_none());
    }

    #[test]
    fn mean_of_values() {
        assert_eq!(mean(&[]), 0.0);
        assert!((mean(&[0.5, 1.0]) - 0.75).abs() < f32::EPSILON);
    }
}
