//! Snippet substitution engine
//!
//! Placeholders are resolved left to right. Each one draws the next value
//! from the engine's stream, so reordering or dropping earlier documents
//! changes later choices.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeSet;
use vignette_core::placeholder::{self, PLACEHOLDER_MARKER};
use vignette_core::{
    CaseCategory, CatalogError, Document, SnippetCandidate, SnippetCatalog, SubstitutionError,
    Vignette,
};

/// Resolves placeholders against a snippet catalog
#[derive(Debug, Clone)]
pub struct SubstitutionEngine<R = ChaCha8Rng> {
    rng: R,
}

impl SubstitutionEngine<ChaCha8Rng> {
    /// Engine over a ChaCha8 stream seeded once
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> SubstitutionEngine<R> {
    /// Engine over a caller-supplied stream
    #[inline]
    #[must_use]
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Give back the stream, e.g. to continue it elsewhere
    #[inline]
    pub fn into_rng(self) -> R {
        self.rng
    }

    /// Substitute every placeholder in one document
    ///
    /// The token plus one optional trailing period is replaced by the chosen
    /// candidate's snippet. The catalog is not audited here; use
    /// [`SubstitutionEngine::run_batch`] for the full precondition check.
    ///
    /// # Errors
    /// - `NoCandidates` when a placeholder label has no candidates
    /// - `IncompleteSubstitution` when the marker survives substitution
    pub fn insert_snippets(
        &mut self,
        document: &Document,
        catalog: &SnippetCatalog,
    ) -> Result<Vignette, SubstitutionError> {
        let text = &document.text;
        let mut output = String::with_capacity(text.len());
        let mut include = Vec::new();
        let mut choices = Vec::new();
        let mut cursor = 0;

        for caps in placeholder::substitution_pattern().captures_iter(text) {
            let (Some(whole), Some(label)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let choice = self.choose(document, catalog, label.as_str())?;
            output.push_str(&text[cursor..whole.start()]);
            output.push_str(&choice.snippet);
            cursor = whole.end();
            include.push(choice.include.clone());
            choices.push(choice);
        }
        output.push_str(&text[cursor..]);

        let residual = placeholder::count_markers(&output);
        if residual > 0 {
            tracing::error!(
                model = %document.model,
                id = %document.id,
                residual,
                marker = PLACEHOLDER_MARKER,
                "placeholder survived substitution"
            );
            return Err(SubstitutionError::IncompleteSubstitution {
                document: document.id.clone(),
                model: document.model.clone(),
                residual,
            });
        }

        tracing::debug!(
            model = %document.model,
            id = %document.id,
            inserted = choices.len(),
            "inserted snippets"
        );
        Ok(Vignette {
            model: document.model.clone(),
            category: document.category,
            id: document.id.clone(),
            template: Some(document.text.clone()),
            vignette: output,
            include,
            choices,
        })
    }

    /// Audit the catalog, then substitute every document in order
    ///
    /// # Errors
    /// The catalog audit or any per-document failure aborts the batch.
    pub fn run_batch(
        &mut self,
        documents: &[Document],
        catalog: &SnippetCatalog,
    ) -> Result<Vec<Vignette>, SubstitutionError> {
        catalog.ensure_includes_contained()?;
        let needed: BTreeSet<CaseCategory> = documents
            .iter()
            .filter(|d| !placeholder::scan(&d.text).is_empty())
            .map(|d| d.category)
            .collect();
        if let Some(missing) = needed.into_iter().find(|c| !catalog.has_category(*c)) {
            return Err(CatalogError::MissingCategory(missing).into());
        }

        let vignettes = documents
            .iter()
            .map(|d| self.insert_snippets(d, catalog))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::info!(count = vignettes.len(), "inserted snippets into documents");
        Ok(vignettes)
    }

    fn choose(
        &mut self,
        document: &Document,
        catalog: &SnippetCatalog,
        label: &str,
    ) -> Result<SnippetCandidate, SubstitutionError> {
        catalog
            .candidates(document.category, label)
            .and_then(|options| options.choose(&mut self.rng))
            .cloned()
            .ok_or_else(|| SubstitutionError::NoCandidates {
                document: document.id.clone(),
                model: document.model.clone(),
                category: document.category,
                label: label.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn catalog() -> SnippetCatalog {
        let mut catalog = SnippetCatalog::new();
        catalog.insert(
            CaseCategory::Shoplifting,
            "1",
            vec![SnippetCandidate::new("He took £40 of gin.", "£40 of gin")],
        );
        catalog.insert(
            CaseCategory::Shoplifting,
            "2",
            vec![SnippetCandidate::new("He had a knife.", "a knife")],
        );
        catalog
    }

    fn doc(text: &str) -> Document {
        Document::new("temp_1", "m", CaseCategory::Shoplifting, text)
    }

    #[test]
    fn replaces_token_and_one_period() {
        let mut engine = SubstitutionEngine::seeded(1);
        let v = engine
            .insert_snippets(
                &doc("A.\n\n{INSERT_FACT_SNIPPET_1}.\n\n{INSERT_FACT_SNIPPET_2}..\n\nEnd."),
                &catalog(),
            )
            .unwrap();
        assert_eq!(v.vignette, "A.\n\nHe took £40 of gin.\n\nHe had a knife..\n\nEnd.");
        assert_eq!(v.include, vec!["£40 of gin".to_string(), "a knife".to_string()]);
        assert_eq!(v.choices.len(), 2);
        assert!(v.template.is_some());
    }

    #[test]
    fn records_follow_scan_order() {
        let mut engine = SubstitutionEngine::seeded(1);
        let v = engine
            .insert_snippets(&doc("{INSERT_FACT_SNIPPET_2} {INSERT_FACT_SNIPPET_1}"), &catalog())
            .unwrap();
        assert_eq!(v.include, vec!["a knife".to_string(), "£40 of gin".to_string()]);
    }

    #[test]
    fn missing_label_fails_fast() {
        let mut engine = SubstitutionEngine::seeded(1);
        let err = engine
            .insert_snippets(&doc("{INSERT_FACT_SNIPPET_3}"), &catalog())
            .unwrap_err();
        assert!(matches!(err, SubstitutionError::NoCandidates { ref label, .. } if label == "3"));
    }

    #[test]
    fn empty_candidate_list_fails_fast() {
        let mut catalog = catalog();
        catalog.insert(CaseCategory::Shoplifting, "3", Vec::new());
        let mut engine = SubstitutionEngine::seeded(1);
        assert!(engine
            .insert_snippets(&doc("{INSERT_FACT_SNIPPET_3}"), &catalog)
            .is_err());
    }

    #[test]
    fn residual_marker_is_fatal() {
        let mut engine = SubstitutionEngine::seeded(1);
        let err = engine
            .insert_snippets(&doc("{INSERT_FACT_SNIPPET_1} INSERT_FACT_SNIPPET_x"), &catalog())
            .unwrap_err();
        assert!(matches!(
            err,
            SubstitutionError::IncompleteSubstitution { residual: 1, .. }
        ));
    }

    #[test]
    fn batch_audits_catalog_first() {
        let mut catalog = catalog();
        catalog.candidates_mut(CaseCategory::Shoplifting, "2").unwrap()[0].include =
            "a gun".to_string();
        let mut engine = SubstitutionEngine::seeded(1);
        let err = engine
            .run_batch(&[doc("{INSERT_FACT_SNIPPET_1}")], &catalog)
            .unwrap_err();
        assert!(matches!(
            err,
            SubstitutionError::Catalog(CatalogError::IncludeNotInSnippet { .. })
        ));
    }

    #[test]
    fn batch_requires_category_catalog() {
        let mut engine = SubstitutionEngine::seeded(1);
        let other = Document::new("temp_9", "m", CaseCategory::Terrorism, "{INSERT_FACT_SNIPPET_1}");
        let err = engine.run_batch(&[other], &catalog()).unwrap_err();
        assert!(matches!(
            err,
            SubstitutionError::Catalog(CatalogError::MissingCategory(CaseCategory::Terrorism))
        ));
    }

    #[test]
    fn document_without_placeholders_passes_through() {
        let mut engine = SubstitutionEngine::seeded(1);
        let v = engine.insert_snippets(&doc("Nothing here."), &catalog()).unwrap();
        assert_eq!(v.vignette, "Nothing here.");
        assert!(v.include.is_empty());
    }
}
