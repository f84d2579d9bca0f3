//! Finalisation
//!
//! Removes signposting headings and flattens layout so inserted facts are
//! not trivially locatable, then groups vignettes into per-category
//! evaluation datasets.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use vignette_core::corpus;
use vignette_core::text::is_heading;
use vignette_core::{CaseCategory, EvalSample, FinaliseConfig, LoadError, Vignette};

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

/// Drop heading lines after the first `ignore_first_n + 1` lines
///
/// Every kept line is trimmed. Lines are split on `\n` only.
#[must_use]
pub fn remove_headings(text: &str, ignore_first_n: usize, words: (usize, usize)) -> String {
    text.split('\n')
        .enumerate()
        .filter(|(i, line)| *i <= ignore_first_n || !is_heading(line, words))
        .map(|(_, line)| line.trim())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Replace every whitespace run with one space
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").into_owned()
}

/// Clean a vignette's text and drop its template
#[must_use]
pub fn finalise(mut vignette: Vignette, config: &FinaliseConfig) -> Vignette {
    let mut text = remove_headings(&vignette.vignette, config.ignore_first_n, config.heading_words);
    if config.collapse_whitespace {
        text = collapse_whitespace(&text);
    }
    vignette.vignette = text;
    vignette.template = None;
    vignette
}

/// Group samples by category, preserving input order within each
#[must_use]
pub fn build_dataset(vignettes: &[Vignette]) -> BTreeMap<CaseCategory, Vec<EvalSample>> {
    let mut dataset: BTreeMap<CaseCategory, Vec<EvalSample>> = BTreeMap::new();
    for vignette in vignettes {
        dataset
            .entry(vignette.category)
            .or_default()
            .push(EvalSample::from(vignette));
    }
    dataset
}

/// Write each category's samples to `<dir>/<category>.json`
///
/// # Errors
/// IO or serialization errors.
pub fn write_dataset(
    dir: &Path,
    dataset: &BTreeMap<CaseCategory, Vec<EvalSample>>,
) -> Result<Vec<PathBuf>, LoadError> {
    let mut written = Vec::with_capacity(dataset.len());
    for (category, samples) in dataset {
        let path = dir.join(format!("{category}.json"));
        corpus::write_json(&path, samples)?;
        tracing::info!(%category, samples = samples.len(), path = %path.display(), "wrote dataset");
        written.push(path);
    }
    Ok(written)
}

/// Group finalised vignettes by category and write the dataset files
///
/// # Errors
/// IO or serialization errors.
pub fn export_dataset(dir: &Path, vignettes: &[Vignette]) -> Result<Vec<PathBuf>, LoadError> {
    write_dataset(dir, &build_dataset(vignettes))
}
