//! Vignette records on disk: `<root>/<model>/<category>/<id>.json`

use std::path::{Path, PathBuf};
use vignette_core::corpus;
use vignette_core::{CaseCategory, LoadError, Vignette};

/// Write one vignette record; non-ASCII text is kept literal
///
/// # Errors
/// IO or serialization errors.
pub fn save_vignette(out: &Path, vignette: &Vignette) -> Result<PathBuf, LoadError> {
    let path = corpus::record_path(out, &vignette.model, vignette.category, &vignette.id, "json");
    corpus::write_json(&path, vignette)?;
    tracing::debug!(path = %path.display(), "saved vignette");
    Ok(path)
}

/// Load vignette records for every (model, category) pair, sorted by path
///
/// # Errors
/// Unreadable files or malformed JSON.
pub fn load_vignettes(
    root: &Path,
    models: &[String],
    categories: &[CaseCategory],
) -> Result<Vec<Vignette>, LoadError> {
    let mut vignettes = Vec::new();
    for model in models {
        for &category in categories {
            let dir = root.join(model).join(category.as_str());
            for path in corpus::list_files(&dir, "*.json")? {
                vignettes.push(corpus::read_json(&path)?);
            }
        }
    }
    tracing::info!(count = vignettes.len(), root = %root.display(), "loaded vignettes");
    Ok(vignettes)
}
