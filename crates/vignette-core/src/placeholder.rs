//! Placeholder grammar
//!
//! Documents mark fact positions with `{INSERT_FACT_SNIPPET_<digits>}`. The
//! token syntax is fixed and matched bit-exact; substitution additionally
//! consumes one trailing period.

use once_cell::sync::Lazy;
use regex::Regex;

/// Bare marker; any residual occurrence after substitution is an integrity error
pub const PLACEHOLDER_MARKER: &str = "INSERT_FACT_SNIPPET_";

/// Sentence every valid document must end with
pub const CLOSING_SENTENCE: &str = "These are the orders of the court.";

static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{INSERT_FACT_SNIPPET_(\d+)\}").expect("placeholder pattern"));

static SUBSTITUTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{INSERT_FACT_SNIPPET_(\d+)\}\.?").expect("substitution pattern"));

/// One placeholder occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Digits between the marker and the closing brace, as written
    pub label: String,
    /// Byte offset of the opening brace
    pub start: usize,
    /// Byte offset one past the closing brace
    pub end: usize,
}

impl Placeholder {
    /// Numeric value of the label; saturates on absurdly long digit runs
    #[must_use]
    pub fn index(&self) -> u64 {
        self.label.parse().unwrap_or(u64::MAX)
    }
}

/// All placeholder occurrences, left to right
#[must_use]
pub fn scan(text: &str) -> Vec<Placeholder> {
    PLACEHOLDER_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let digits = caps.get(1)?;
            Some(Placeholder {
                label: digits.as_str().to_string(),
                start: whole.start(),
                end: whole.end(),
            })
        })
        .collect()
}

/// Pattern used by substitution: the token plus an optional trailing period
#[inline]
#[must_use]
pub fn substitution_pattern() -> &'static Regex {
    &SUBSTITUTION_RE
}

/// Canonical token for an index, e.g. `{INSERT_FACT_SNIPPET_3}`
#[must_use]
pub fn token(index: u64) -> String {
    format!("{{{PLACEHOLDER_MARKER}{index}}}")
}

/// Occurrences of the bare marker, whether or not well-formed
#[must_use]
pub fn count_markers(text: &str) -> usize {
    text.matches(PLACEHOLDER_MARKER).count()
}

/// Character (not byte) offset of a byte position
#[must_use]
pub fn char_offset(text: &str, byte: usize) -> usize {
    text.get(..byte).map_or(0, |prefix| prefix.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_finds_labels_in_order() {
        let text = "A {INSERT_FACT_SNIPPET_2} b {INSERT_FACT_SNIPPET_10} c";
        let found = scan(text);
        let labels: Vec<_> = found.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["2", "10"]);
        assert_eq!(&text[found[0].start..found[0].end], "{INSERT_FACT_SNIPPET_2}");
        assert_eq!(found[1].index(), 10);
    }

    #[test]
    fn scan_ignores_malformed_tokens() {
        let text = "INSERT_FACT_SNIPPET_1 {INSERT_FACT_SNIPPET_} {INSERT_FACT_SNIPPET_x}";
        assert!(scan(text).is_empty());
        assert_eq!(count_markers(text), 3);
    }

    #[test]
    fn substitution_pattern_consumes_one_period() {
        let m = substitution_pattern()
            .find("x {INSERT_FACT_SNIPPET_1}.. y")
            .unwrap();
        assert_eq!(m.as_str(), "{INSERT_FACT_SNIPPET_1}.");
    }

    #[test]
    fn token_format() {
        assert_eq!(token(8), "{INSERT_FACT_SNIPPET_8}");
    }

    #[test]
    fn char_offset_counts_multibyte() {
        let text = "£5 {INSERT_FACT_SNIPPET_1}";
        let p = &scan(text)[0];
        assert_eq!(p.start, 4);
        assert_eq!(char_offset(text, p.start), 3);
    }

    #[test]
    fn index_saturates() {
        let p = Placeholder {
            label: "99999999999999999999999".to_string(),
            start: 0,
            end: 0,
        };
        assert_eq!(p.index(), u64::MAX);
    }
}
