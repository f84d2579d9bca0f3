//! Token counting
//!
//! The token count shares its encoding with the cost estimator upstream
//! (`o200k_base`, the gpt-4o family encoding).

use crate::error::CheckError;
use tiktoken_rs::CoreBPE;

/// Counts tokens in a text
pub trait TokenCounter: Send + Sync {
    /// Number of tokens in `text`
    fn count(&self, text: &str) -> usize;

    /// Encoding name, for logs
    fn name(&self) -> &str;
}

/// BPE counter backed by tiktoken tables
pub struct TiktokenCounter {
    bpe: CoreBPE,
    name: &'static str,
}

impl TiktokenCounter {
    /// Counter for the gpt-4o family encoding
    ///
    /// # Errors
    /// `CheckError::Tokenizer` when the tables fail to load.
    pub fn o200k() -> Result<Self, CheckError> {
        let bpe = tiktoken_rs::o200k_base().map_err(|e| CheckError::Tokenizer(e.to_string()))?;
        Ok(Self {
            bpe,
            name: "o200k_base",
        })
    }
}

impl std::fmt::Debug for TiktokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TiktokenCounter")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl TokenCounter for TiktokenCounter {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }

    fn name(&self) -> &str {
        self.name
    }
}

/// Whitespace-split approximation; no tables required
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceCounter;

impl TokenCounter for WhitespaceCounter {
    fn count(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }

    fn name(&self) -> &str {
        "whitespace"
    }
}
