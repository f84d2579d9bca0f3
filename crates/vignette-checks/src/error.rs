//! Error types for the validator stage
//!
//! Failing checks are recorded as data; these errors cover setup and I/O only.

use vignette_core::LoadError;

/// Validator setup and output errors
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    /// Tokeniser tables could not be loaded
    #[error("tokenizer unavailable: {0}")]
    Tokenizer(String),

    /// Records and documents passed to `copy_passing` do not line up
    #[error("report has {records} record(s) but {documents} document(s) were given")]
    ReportMismatch {
        /// Records in the report
        records: usize,
        /// Documents supplied
        documents: usize,
    },

    /// Reading or writing pipeline files
    #[error(transparent)]
    Load(#[from] LoadError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatch_display() {
        let err = CheckError::ReportMismatch {
            records: 2,
            documents: 3,
        };
        assert_eq!(
            err.to_string(),
            "report has 2 record(s) but 3 document(s) were given"
        );
    }
}
