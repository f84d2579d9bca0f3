//! Testing utilities for the vignette workspace
//!
//! Shared fixtures: well-formed documents, a small snippet catalog, and
//! helpers that lay them out on disk the way the pipeline expects.

#![allow(missing_docs)]

use std::collections::HashMap;
use std::path::Path;
use vignette_core::placeholder::{token, CLOSING_SENTENCE};
use vignette_core::{CaseCategory, Document, SnippetCandidate, SnippetCatalog};
use vignette_score::{EmbedError, Embedder};

pub const FILLER: &str = "The court considered the written submissions and the procedural history of the matter. ";

pub const OPENING: &str = "SENTENCING REMARKS\n\nThe defendant appears for sentence today.";

/// Filler paragraph of `sentences` sentences
pub fn filler(sentences: usize) -> String {
    FILLER.repeat(sentences).trim_end().to_string()
}

/// Document text that passes every structural check
///
/// `sentences` filler sentences separate consecutive placeholders; six or
/// more keep placeholder 1 and 8 over 3000 characters apart.
pub fn passing_text_with(sentences: usize) -> String {
    let mut text = String::from(OPENING);
    for n in 1..=8 {
        text.push_str("\n\n");
        text.push_str(&filler(sentences));
        text.push_str("\n\n");
        text.push_str(&token(n));
    }
    text.push_str("\n\nI turn now to the orders.\n\n");
    text.push_str(CLOSING_SENTENCE);
    text
}

pub fn passing_text() -> String {
    passing_text_with(6)
}

pub fn passing_document(id: &str, model: &str, category: CaseCategory) -> Document {
    Document::new(id, model, category, passing_text())
}

/// Candidates for one label; every include is contained in its snippet
pub fn candidates_for(category: CaseCategory, label: u64) -> Vec<SnippetCandidate> {
    (0..3)
        .map(|variant| {
            let include = format!("{category} fact {label} variant {variant}");
            SnippetCandidate::new(
                format!("The court notes that the {include} was established."),
                include,
            )
        })
        .collect()
}

/// Catalog covering labels 1..=8 in every category
pub fn sample_catalog() -> SnippetCatalog {
    let mut catalog = SnippetCatalog::new();
    for category in CaseCategory::ALL {
        for label in 1..=8 {
            catalog.insert(category, label.to_string(), candidates_for(category, label));
        }
    }
    catalog
}

/// Write documents to `<root>/<model>/<category>/<id>.txt`
pub fn write_corpus(root: &Path, documents: &[Document]) {
    for doc in documents {
        let dir = root.join(&doc.model).join(doc.category.as_str());
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(format!("{}.txt", doc.id)), &doc.text).unwrap();
    }
}

/// Write a catalog to `<root>/<category>/<label>.json`
pub fn write_catalog(root: &Path, catalog: &SnippetCatalog) {
    for category in catalog.categories() {
        let dir = root.join(category.as_str());
        std::fs::create_dir_all(&dir).unwrap();
        for label in 1..=8u64 {
            let label = label.to_string();
            if let Some(list) = catalog.candidates(category, &label) {
                let body = serde_json::to_string(list).unwrap();
                std::fs::write(dir.join(format!("{label}.json")), body).unwrap();
            }
        }
    }
}

/// Embedder with fixed vectors per text
///
/// Unknown texts map to `fallback`; every call is counted.
#[derive(Debug, Default)]
pub struct StubEmbedder {
    table: HashMap<String, Vec<f32>>,
    fallback: Vec<f32>,
    calls: std::sync::atomic::AtomicUsize,
}

impl StubEmbedder {
    pub fn new(fallback: Vec<f32>) -> Self {
        Self {
            fallback,
            ..Self::default()
        }
    }

    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.table.insert(text.to_string(), vector);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

impl Embedder for StubEmbedder {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|t| self.table.get(t).unwrap_or(&self.fallback).clone())
            .collect())
    }

    fn dimensions(&self) -> Option<usize> {
        Some(self.fallback.len())
    }

    fn name(&self) -> &str {
        "stub"
    }
}

/// Embedder that always fails
#[derive(Debug, Default)]
pub struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        Err(EmbedError::Status {
            status: 503,
            message: "backend unavailable".to_string(),
        })
    }

    fn dimensions(&self) -> Option<usize> {
        None
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Evaluation log JSON with one sample per `(output content, targets)` pair
pub fn eval_log_json(model: &str, samples: &[(serde_json::Value, Vec<&str>)]) -> String {
    let samples: Vec<serde_json::Value> = samples
        .iter()
        .map(|(content, targets)| {
            let choices: Vec<serde_json::Value> = targets
                .iter()
                .map(|t| serde_json::json!({"snippet": format!("It was said that {t}"), "include": t}))
                .collect();
            serde_json::json!({
                "output": {"choices": [{"message": {"content": content}}]},
                "target": targets,
                "choices": choices,
            })
        })
        .collect();
    serde_json::json!({
        "eval": {
            "task": "eval_vignettes",
            "dataset": {"name": "vignettes", "location": "./input/vignettes.json"},
            "model": model,
            "model_generate_config": {"max_tokens": 2048},
        },
        "samples": samples,
    })
    .to_string()
}
