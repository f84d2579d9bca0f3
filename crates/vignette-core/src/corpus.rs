//! Corpus I/O
//!
//! Directory conventions:
//! - documents: `<root>/<model>/<category>/<pattern>` plain text
//! - catalog: `<root>/<category>/<label>.json`, each a JSON array of candidates
//! - records: `<root>/<model>/<category>/<id>.<ext>`
//!
//! Listings are sorted by path so batch order does not depend on the platform.

use crate::catalog::SnippetCatalog;
use crate::error::LoadError;
use crate::types::{CaseCategory, Document, SnippetCandidate};
use glob::Pattern;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Files in `dir` whose names match `pattern`, sorted
///
/// A missing directory yields an empty list.
///
/// # Errors
/// Invalid pattern or unreadable directory.
pub fn list_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, LoadError> {
    let matcher = Pattern::new(pattern).map_err(|e| LoadError::Pattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;
    if !dir.is_dir() {
        tracing::debug!(dir = %dir.display(), "directory absent, nothing to load");
        return Ok(Vec::new());
    }
    let entries = std::fs::read_dir(dir).map_err(|e| LoadError::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| LoadError::io(dir, e))?;
        let path = entry.path();
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| matcher.matches(name));
        if matches && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// File stem as a document identifier
#[must_use]
pub fn file_id(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Load generated documents for every (model, category) pair
///
/// Order: model, then category, then file name, following the argument order.
///
/// # Errors
/// Unreadable files or an invalid pattern.
pub fn load_documents(
    root: &Path,
    models: &[String],
    categories: &[CaseCategory],
    pattern: &str,
) -> Result<Vec<Document>, LoadError> {
    let mut documents = Vec::new();
    for model in models {
        for &category in categories {
            let dir = root.join(model).join(category.as_str());
            for path in list_files(&dir, pattern)? {
                let text = std::fs::read_to_string(&path).map_err(|e| LoadError::io(&path, e))?;
                documents.push(
                    Document::new(file_id(&path), model.clone(), category, text).with_path(path),
                );
            }
        }
    }
    tracing::info!(count = documents.len(), root = %root.display(), "loaded documents");
    Ok(documents)
}

/// Load the snippet catalog for the given categories
///
/// # Errors
/// Unreadable files or malformed JSON.
pub fn load_catalog(root: &Path, categories: &[CaseCategory]) -> Result<SnippetCatalog, LoadError> {
    let mut catalog = SnippetCatalog::new();
    for &category in categories {
        let dir = root.join(category.as_str());
        for path in list_files(&dir, "*.json")? {
            let candidates: Vec<SnippetCandidate> = read_json(&path)?;
            catalog.insert(category, file_id(&path), candidates);
        }
    }
    tracing::info!(
        candidates = catalog.candidate_count(),
        root = %root.display(),
        "loaded snippet catalog"
    );
    Ok(catalog)
}

/// Record path `<root>/<model>/<category>/<id>.<ext>`
#[must_use]
pub fn record_path(root: &Path, model: &str, category: CaseCategory, id: &str, ext: &str) -> PathBuf {
    root.join(model)
        .join(category.as_str())
        .join(format!("{id}.{ext}"))
}

/// Read and deserialize a JSON file
///
/// # Errors
/// IO or JSON errors, tagged with the path.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let raw = std::fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
    serde_json::from_str(&raw).map_err(|e| LoadError::json(path, e))
}

/// Serialize to compact JSON, creating parent directories
///
/// Non-ASCII text is written as-is.
///
/// # Errors
/// IO or serialization errors, tagged with the path.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), LoadError> {
    let body = serde_json::to_string(value).map_err(|e| LoadError::json(path, e))?;
    write_text(path, &body)
}

/// Write text, creating parent directories
///
/// # Errors
/// IO errors, tagged with the path.
pub fn write_text(path: &Path, body: &str) -> Result<(), LoadError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| LoadError::io(parent, e))?;
    }
    std::fs::write(path, body).map_err(|e| LoadError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_files_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["temp_2.txt", "temp_1.txt", "notes.txt", "temp_3.json"] {
            std::fs::write(dir.path().join(name), "x").unwrap();
        }
        let files = list_files(dir.path(), "temp_*.txt").unwrap();
        let names: Vec<_> = files.iter().map(|p| file_id(p)).collect();
        assert_eq!(names, vec!["temp_1", "temp_2"]);
    }

    #[test]
    fn list_files_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_files(&dir.path().join("absent"), "*.txt").unwrap().is_empty());
    }

    #[test]
    fn list_files_rejects_bad_pattern() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            list_files(dir.path(), "temp_[.txt"),
            Err(LoadError::Pattern { .. })
        ));
    }

    #[test]
    fn record_path_layout() {
        let path = record_path(Path::new("/out"), "gpt-4.1", CaseCategory::DomesticAbuse, "temp_4", "json");
        assert_eq!(path, PathBuf::from("/out/gpt-4.1/domestic_abuse/temp_4.json"));
    }

    #[test]
    fn write_json_keeps_pound_sign() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b.json");
        write_json(&path, &vec!["£40"]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[\"£40\"]");
    }
}
