//! Structural checks
//!
//! Each check is a pure function over the text plus a thin struct that
//! registers it on a [`CheckSuite`](crate::CheckSuite). Record keys:
//!
//! | key | kind |
//! |-----|------|
//! | `num_snippets` | count: highest placeholder index, 0 if none |
//! | `num_snippets_ok` | flag: highest index equals the expected count |
//! | `snippets_in_order` | flag: labels already in lexicographic order |
//! | `snippets_unique` | flag: no label repeated |
//! | `has_no_disclosure_string` | flag |
//! | `passes_snippet_spacing_check` | flag |
//! | `snippets_not_midsentence` | flag |
//! | `ends_with_order` | flag |
//! | `word_count`, `token_count` | count |
//! | `snippet_distance` | count: chars from first to last placeholder, -1 if either is missing |
//! | `passes_snippet_distance_check` | flag |
//! | `heading_count` | count |

use crate::check::{CheckOutcome, StructuralCheck};
use crate::tokens::TokenCounter;
use std::collections::HashSet;
use std::sync::Arc;
use vignette_core::placeholder::{self, Placeholder};
use vignette_core::text;

/// Placeholder statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnippetInfo {
    /// Highest index seen, 0 if none
    pub num_snippets: u64,
    /// Highest index equals the expected count
    pub num_snippets_ok: bool,
    /// Labels appear in lexicographic order
    pub in_order: bool,
    /// No label appears twice
    pub unique: bool,
}

impl SnippetInfo {
    /// Compute from text
    ///
    /// Order compares label strings, not numbers, so `10` sorts before `9`.
    #[must_use]
    pub fn compute(text: &str, expected: u64) -> Self {
        let found = placeholder::scan(text);
        let labels: Vec<&str> = found.iter().map(|p| p.label.as_str()).collect();
        let num_snippets = found.iter().map(Placeholder::index).max().unwrap_or(0);
        let in_order = labels.windows(2).all(|w| w[0] <= w[1]);
        let distinct: HashSet<&str> = labels.iter().copied().collect();
        Self {
            num_snippets,
            num_snippets_ok: num_snippets == expected,
            in_order,
            unique: distinct.len() == labels.len(),
        }
    }
}

/// Whether the disclosure phrase is absent (case-insensitive)
#[must_use]
pub fn has_no_disclosure_string(text: &str, phrase: &str) -> bool {
    !text.to_lowercase().contains(&phrase.to_lowercase())
}

/// Whether no run of more than `max_consecutive` placeholders is separated
/// only by whitespace or `.,;:`
#[must_use]
pub fn passes_snippet_spacing_check(text: &str, max_consecutive: usize) -> bool {
    let found = placeholder::scan(text);
    let mut run = 0usize;
    let mut prev_end: Option<usize> = None;
    for p in &found {
        let joined = prev_end.is_some_and(|end| text[end..p.start].chars().all(is_separator));
        run = if joined { run + 1 } else { 1 };
        if run > max_consecutive {
            return false;
        }
        prev_end = Some(p.end);
    }
    true
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '.' | ',' | ';' | ':')
}

/// Whether every placeholder follows punctuation, a line break, or the start
///
/// Looks at up to `window` characters before each placeholder, ignoring
/// whitespace; an ASCII letter or digit there means the placeholder is glued
/// into a sentence.
#[must_use]
pub fn snippets_not_midsentence(text: &str, window: usize) -> bool {
    placeholder::scan(text).iter().all(|p| {
        let preceding = text[..p.start]
            .chars()
            .rev()
            .take(window)
            .find(|c| !c.is_whitespace());
        !preceding.is_some_and(|c| c.is_ascii_alphanumeric())
    })
}

/// Whether the text ends with `sentence`, allowing one trailing newline
#[must_use]
pub fn ends_with_sentence(text: &str, sentence: &str) -> bool {
    let body = text.strip_suffix('\n').unwrap_or(text);
    body.ends_with(sentence)
}

/// Characters from the first `{..._1}` to the first `{..._last}`
///
/// -1 when either token is missing.
#[must_use]
pub fn snippet_distance(text: &str, last_index: u64) -> i64 {
    let first = text.find(&placeholder::token(1));
    let last = text.find(&placeholder::token(last_index));
    match (first, last) {
        (Some(first), Some(last)) => {
            let first = placeholder::char_offset(text, first);
            let last = placeholder::char_offset(text, last);
            i64::try_from(last).unwrap_or(i64::MAX) - i64::try_from(first).unwrap_or(i64::MAX)
        }
        _ => -1,
    }
}

fn as_count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Placeholder count, order and uniqueness
#[derive(Debug, Clone, Copy)]
pub struct SnippetInfoCheck {
    expected: u64,
}

impl SnippetInfoCheck {
    /// Expect placeholders `1..=expected`
    #[must_use]
    pub fn new(expected: u64) -> Self {
        Self { expected }
    }
}

impl StructuralCheck for SnippetInfoCheck {
    fn name(&self) -> &'static str {
        "snippet_info"
    }

    fn evaluate(&self, text: &str) -> CheckOutcome {
        let info = SnippetInfo::compute(text, self.expected);
        CheckOutcome::new()
            .count(
                "num_snippets",
                i64::try_from(info.num_snippets).unwrap_or(i64::MAX),
            )
            .flag("num_snippets_ok", info.num_snippets_ok)
            .flag("snippets_in_order", info.in_order)
            .flag("snippets_unique", info.unique)
    }
}

/// Rejects documents that name their own construction
#[derive(Debug, Clone)]
pub struct DisclosureCheck {
    phrase: String,
}

impl DisclosureCheck {
    /// Reject documents containing `phrase`
    #[must_use]
    pub fn new(phrase: impl Into<String>) -> Self {
        Self {
            phrase: phrase.into(),
        }
    }
}

impl StructuralCheck for DisclosureCheck {
    fn name(&self) -> &'static str {
        "disclosure"
    }

    fn evaluate(&self, text: &str) -> CheckOutcome {
        CheckOutcome::new().flag(
            "has_no_disclosure_string",
            has_no_disclosure_string(text, &self.phrase),
        )
    }
}

/// Rejects clusters of adjacent placeholders
#[derive(Debug, Clone, Copy)]
pub struct SpacingCheck {
    max_consecutive: usize,
}

impl SpacingCheck {
    /// Allow runs of at most `max_consecutive`
    #[must_use]
    pub fn new(max_consecutive: usize) -> Self {
        Self { max_consecutive }
    }
}

impl StructuralCheck for SpacingCheck {
    fn name(&self) -> &'static str {
        "spacing"
    }

    fn evaluate(&self, text: &str) -> CheckOutcome {
        CheckOutcome::new().flag(
            "passes_snippet_spacing_check",
            passes_snippet_spacing_check(text, self.max_consecutive),
        )
    }
}

/// Rejects placeholders glued onto a preceding word
#[derive(Debug, Clone, Copy)]
pub struct MidSentenceCheck {
    window: usize,
}

impl MidSentenceCheck {
    /// Inspect `window` characters before each placeholder
    #[must_use]
    pub fn new(window: usize) -> Self {
        Self { window }
    }
}

impl StructuralCheck for MidSentenceCheck {
    fn name(&self) -> &'static str {
        "midsentence"
    }

    fn evaluate(&self, text: &str) -> CheckOutcome {
        CheckOutcome::new().flag(
            "snippets_not_midsentence",
            snippets_not_midsentence(text, self.window),
        )
    }
}

/// Requires the fixed closing sentence
#[derive(Debug, Clone)]
pub struct ClosingSentenceCheck {
    sentence: String,
}

impl ClosingSentenceCheck {
    /// Require the text to end with `sentence`
    #[must_use]
    pub fn new(sentence: impl Into<String>) -> Self {
        Self {
            sentence: sentence.into(),
        }
    }
}

impl StructuralCheck for ClosingSentenceCheck {
    fn name(&self) -> &'static str {
        "closing_sentence"
    }

    fn evaluate(&self, text: &str) -> CheckOutcome {
        CheckOutcome::new().flag("ends_with_order", ends_with_sentence(text, &self.sentence))
    }
}

/// Word count statistic
#[derive(Debug, Clone, Copy, Default)]
pub struct WordCountCheck;

impl StructuralCheck for WordCountCheck {
    fn name(&self) -> &'static str {
        "word_count"
    }

    fn evaluate(&self, text: &str) -> CheckOutcome {
        CheckOutcome::new().count("word_count", as_count(text::count_words(text)))
    }
}

/// Token count statistic
pub struct TokenCountCheck {
    counter: Arc<dyn TokenCounter>,
}

impl TokenCountCheck {
    /// Count with the given tokenizer
    #[must_use]
    pub fn new(counter: Arc<dyn TokenCounter>) -> Self {
        Self { counter }
    }
}

impl std::fmt::Debug for TokenCountCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCountCheck")
            .field("encoding", &self.counter.name())
            .finish()
    }
}

impl StructuralCheck for TokenCountCheck {
    fn name(&self) -> &'static str {
        "token_count"
    }

    fn evaluate(&self, text: &str) -> CheckOutcome {
        CheckOutcome::new().count("token_count", as_count(self.counter.count(text)))
    }
}

/// Minimum span between the first and last placeholder
#[derive(Debug, Clone, Copy)]
pub struct DistanceCheck {
    last_index: u64,
    minimum: i64,
}

impl DistanceCheck {
    /// Require at least `minimum` characters from `_1` to `_last_index`
    #[must_use]
    pub fn new(last_index: u64, minimum: i64) -> Self {
        Self {
            last_index,
            minimum,
        }
    }
}

impl StructuralCheck for DistanceCheck {
    fn name(&self) -> &'static str {
        "distance"
    }

    fn evaluate(&self, text: &str) -> CheckOutcome {
        let distance = snippet_distance(text, self.last_index);
        CheckOutcome::new()
            .count("snippet_distance", distance)
            .flag(
                "passes_snippet_distance_check",
                distance >= 0 && distance >= self.minimum,
            )
    }
}

/// Heading count statistic
#[derive(Debug, Clone, Copy)]
pub struct HeadingCountCheck {
    words: (usize, usize),
}

impl HeadingCountCheck {
    /// Count lines of `words` words that read as headings
    #[must_use]
    pub fn new(words: (usize, usize)) -> Self {
        Self { words }
    }
}

impl StructuralCheck for HeadingCountCheck {
    fn name(&self) -> &'static str {
        "heading_count"
    }

    fn evaluate(&self, text: &str) -> CheckOutcome {
        CheckOutcome::new().count("heading_count", as_count(text::count_headings(text, self.words)))
    }
}
