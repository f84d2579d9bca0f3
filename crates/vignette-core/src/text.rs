//! Text utilities shared by validation and finalisation
//!
//! Heading detection follows court-report conventions: a short line whose
//! words are all title-cased or stopwords ("Facts of the Case").

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// English stopwords (NLTK list)
pub const ENGLISH_STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan",
    "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't",
    "wouldn", "wouldn't",
];

static STOPWORDS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ENGLISH_STOPWORDS.iter().copied().collect());

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[\w']+\b").expect("word pattern"));

/// Whether a lower-cased word is an English stopword
#[inline]
#[must_use]
pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(word.to_lowercase().as_str())
}

/// Title-case test: uppercase only after uncased characters, lowercase only
/// after cased ones, and at least one cased character overall
#[must_use]
pub fn is_title_word(word: &str) -> bool {
    let mut any_cased = false;
    let mut prev_cased = false;
    for c in word.chars() {
        if c.is_uppercase() {
            if prev_cased {
                return false;
            }
            prev_cased = true;
            any_cased = true;
        } else if c.is_lowercase() {
            if !prev_cased {
                return false;
            }
            prev_cased = true;
            any_cased = true;
        } else {
            prev_cased = false;
        }
    }
    any_cased
}

/// Whether a line reads as a section heading
///
/// `words` is the inclusive range of whitespace-separated words.
#[must_use]
pub fn is_heading(line: &str, words: (usize, usize)) -> bool {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let (min, max) = words;
    if tokens.len() < min || tokens.len() > max {
        return false;
    }
    tokens.iter().all(|w| is_title_word(w) || is_stopword(w))
}

/// Number of heading lines in the text
#[must_use]
pub fn count_headings(text: &str, words: (usize, usize)) -> usize {
    text.lines().filter(|line| is_heading(line, words)).count()
}

/// Rough word count: runs of word characters and apostrophes
#[must_use]
pub fn count_words(text: &str) -> usize {
    WORD_RE.find_iter(text).count()
}
