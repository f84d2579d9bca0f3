//! Batch screening
//!
//! Runs the suite over a document set, tallies pass/fail by model and
//! category, and copies passing documents into the insertion pool.

use crate::check::{CheckRecord, CheckSuite};
use crate::error::CheckError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use vignette_core::corpus;
use vignette_core::{CaseCategory, Document};

/// Pass/fail counts for one grouping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassTally {
    /// Documents passing every check
    pub passed: usize,
    /// Documents failing at least one check
    pub failed: usize,
}

impl PassTally {
    fn add(&mut self, passed: bool) {
        if passed {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
    }

    /// Total documents
    #[inline]
    #[must_use]
    pub fn total(&self) -> usize {
        self.passed + self.failed
    }
}

/// Check records plus aggregate summaries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreeningReport {
    /// One record per document, in input order
    pub records: Vec<CheckRecord>,
    /// Whole batch
    pub overall: PassTally,
    /// Per source model
    pub by_model: BTreeMap<String, PassTally>,
    /// Per case category
    pub by_category: BTreeMap<CaseCategory, PassTally>,
    /// Per model, then category
    pub by_model_category: BTreeMap<String, BTreeMap<CaseCategory, PassTally>>,
    /// Documents failing each flag
    pub check_failures: BTreeMap<String, usize>,
}

impl ScreeningReport {
    /// Build summaries from records
    #[must_use]
    pub fn from_records(records: Vec<CheckRecord>) -> Self {
        let mut report = Self::default();
        for record in &records {
            let passed = record.passes_all_checks;
            report.overall.add(passed);
            report.by_model.entry(record.model.clone()).or_default().add(passed);
            report.by_category.entry(record.category).or_default().add(passed);
            report
                .by_model_category
                .entry(record.model.clone())
                .or_default()
                .entry(record.category)
                .or_default()
                .add(passed);
            for name in record.failed_checks() {
                *report.check_failures.entry(name.to_string()).or_default() += 1;
            }
        }
        report.records = records;
        report
    }

    /// Records that pass every check
    pub fn passing(&self) -> impl Iterator<Item = &CheckRecord> {
        self.records.iter().filter(|r| r.passes_all_checks)
    }

    /// Emit the summary through tracing
    pub fn log_summary(&self) {
        for (model, tally) in &self.by_model {
            tracing::info!(%model, passed = tally.passed, failed = tally.failed, "screened by model");
        }
        for (category, tally) in &self.by_category {
            tracing::info!(%category, passed = tally.passed, failed = tally.failed, "screened by category");
        }
        for (check, failures) in &self.check_failures {
            tracing::info!(%check, failures, "check failures");
        }
        tracing::info!(
            total = self.overall.total(),
            passed = self.overall.passed,
            "screening complete"
        );
    }

    /// Write the report as JSON
    ///
    /// # Errors
    /// IO or serialization errors.
    pub fn write(&self, path: &Path) -> Result<(), CheckError> {
        corpus::write_json(path, self)?;
        Ok(())
    }
}

/// Run the suite over every document
#[must_use]
pub fn screen(suite: &CheckSuite, documents: &[Document]) -> ScreeningReport {
    let records = documents.iter().map(|d| suite.evaluate(d)).collect();
    ScreeningReport::from_records(records)
}

/// Copy passing documents to `<out>/<model>/<category>/<id>.txt`
///
/// `documents` must be the slice the report was built from. Returns the
/// number of documents written.
///
/// # Errors
/// `CheckError::ReportMismatch` on a length mismatch, or write failures.
pub fn copy_passing(
    report: &ScreeningReport,
    documents: &[Document],
    out: &Path,
) -> Result<usize, CheckError> {
    if report.records.len() != documents.len() {
        return Err(CheckError::ReportMismatch {
            records: report.records.len(),
            documents: documents.len(),
        });
    }
    let mut written = 0;
    for (record, document) in report.records.iter().zip(documents) {
        if !record.passes_all_checks {
            continue;
        }
        let path = corpus::record_path(out, &document.model, document.category, &document.id, "txt");
        corpus::write_text(&path, &document.text)?;
        written += 1;
    }
    tracing::info!(written, out = %out.display(), "copied passing documents");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::{CheckOutcome, StructuralCheck};

    struct ContainsOk;

    impl StructuralCheck for ContainsOk {
        fn name(&self) -> &'static str {
            "contains_ok"
        }

        fn evaluate(&self, text: &str) -> CheckOutcome {
            CheckOutcome::new().flag("contains_ok", text.contains("ok"))
        }
    }

    fn docs() -> Vec<Document> {
        vec![
            Document::new("temp_1", "a", CaseCategory::Shoplifting, "ok"),
            Document::new("temp_2", "a", CaseCategory::Terrorism, "bad"),
            Document::new("temp_3", "b", CaseCategory::Shoplifting, "ok too"),
        ]
    }

    #[test]
    fn tallies_by_grouping() {
        let suite = CheckSuite::new().with_check(ContainsOk);
        let report = screen(&suite, &docs());
        assert_eq!(report.overall, PassTally { passed: 2, failed: 1 });
        assert_eq!(report.by_model["a"], PassTally { passed: 1, failed: 1 });
        assert_eq!(report.by_category[&CaseCategory::Shoplifting].passed, 2);
        assert_eq!(report.by_model_category["a"][&CaseCategory::Terrorism].failed, 1);
        assert_eq!(report.check_failures["contains_ok"], 1);
        assert_eq!(report.passing().count(), 2);
    }

    #[test]
    fn copies_only_passing() {
        let dir = tempfile::tempdir().unwrap();
        let suite = CheckSuite::new().with_check(ContainsOk);
        let documents = docs();
        let report = screen(&suite, &documents);
        let written = copy_passing(&report, &documents, dir.path()).unwrap();
        assert_eq!(written, 2);
        let copied = dir.path().join("b/shoplifting/temp_3.txt");
        assert_eq!(std::fs::read_to_string(copied).unwrap(), "ok too");
        assert!(!dir.path().join("a/terrorism/temp_2.txt").exists());
    }

    #[test]
    fn copy_rejects_mismatched_documents() {
        let dir = tempfile::tempdir().unwrap();
        let documents = docs();
        let report = screen(&CheckSuite::new(), &documents[..1]);
        assert!(matches!(
            copy_passing(&report, &documents, dir.path()),
            Err(CheckError::ReportMismatch { records: 1, documents: 3 })
        ));
    }

    #[test]
    fn report_serializes_category_keys() {
        let report = screen(&CheckSuite::new().with_check(ContainsOk), &docs());
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["by_category"]["shoplifting"]["passed"], 2);
    }
}
