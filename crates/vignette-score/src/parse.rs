//! Lenient parsing of extracted-sentence lists
//!
//! Models are asked for a bare JSON array of strings but often wrap it in
//! prose or code fences, or leave quotes unescaped inside sentences. The
//! parser takes the span from the first `[` to the last `]`, tries strict
//! JSON, then one repair pass, and otherwise gives up with an empty list.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::iter::Peekable;
use std::str::Chars;

static WORD_THEN_QUOTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([a-zA-Z—]) ""#).expect("word-quote pattern"));
static QUOTE_THEN_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"" ([a-zA-Z—])"#).expect("quote-word pattern"));
static DOUBLED_QUOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r#""""#).expect("doubled pattern"));
static DASH_THEN_QUOTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(—)""#).expect("dash-quote pattern"));
static QUOTE_THEN_DASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""(—)"#).expect("quote-dash pattern"));

/// Result of parsing one model output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// Strict JSON parse of the bracketed span
    Parsed(Vec<String>),
    /// Parsed after re-escaping internal quotes
    Repaired(Vec<String>),
    /// No `[ ... ]` span in the output
    NoList,
    /// Bracketed span present but unparseable
    Malformed,
}

impl ParseOutcome {
    /// Extracted sentences; empty for failures
    #[must_use]
    pub fn into_sentences(self) -> Vec<String> {
        match self {
            Self::Parsed(list) | Self::Repaired(list) => list,
            Self::NoList | Self::Malformed => Vec::new(),
        }
    }

    /// Whether a list was recovered
    #[inline]
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Parsed(_) | Self::Repaired(_))
    }
}

/// Parse the sentence list out of raw model text
#[must_use]
pub fn parse_sentence_list(content: &str) -> ParseOutcome {
    let (Some(start), Some(end)) = (content.find('['), content.rfind(']')) else {
        return ParseOutcome::NoList;
    };
    if end < start {
        return ParseOutcome::Malformed;
    }
    let span = &content[start..=end];
    if let Some(list) = parse_list(span) {
        return ParseOutcome::Parsed(list);
    }
    match parse_list(&escape_internal_quotes(span)) {
        Some(list) => ParseOutcome::Repaired(list),
        None => ParseOutcome::Malformed,
    }
}

/// Replace double quotes that sit inside sentences with single quotes
///
/// A quote next to a letter or em-dash (with or without one space between)
/// is taken to be internal. Doubled quotes become `'"`.
#[must_use]
pub fn escape_internal_quotes(bad_json: &str) -> String {
    let text = WORD_THEN_QUOTE.replace_all(bad_json, "${1} '");
    let text = QUOTE_THEN_WORD.replace_all(&text, "' ${1}");
    let text = DOUBLED_QUOTE.replace_all(&text, "'\"");
    let text = DASH_THEN_QUOTE.replace_all(&text, "${1} '");
    QUOTE_THEN_DASH.replace_all(&text, "' ${1}").into_owned()
}

fn parse_list(span: &str) -> Option<Vec<String>> {
    let values: Vec<Value> = serde_json::from_str(span).ok()?;
    Some(
        values
            .into_iter()
            .map(|v| match v {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
    )
}

/// Decode a Python `dict[str, str]` literal, as written by `repr()`
///
/// Keys and values may be single- or double-quoted and use backslash escapes
/// (`\n`, `\'`, `\xhh`, `\uXXXX`, ...). Anything else is `None`.
#[must_use]
pub fn parse_string_dict(raw: &str) -> Option<BTreeMap<String, String>> {
    let mut chars = raw.trim().chars().peekable();
    if chars.next()? != '{' {
        return None;
    }
    let mut map = BTreeMap::new();
    loop {
        skip_whitespace(&mut chars);
        if chars.peek() == Some(&'}') {
            chars.next();
            break;
        }
        let key = quoted_string(&mut chars)?;
        skip_whitespace(&mut chars);
        if chars.next()? != ':' {
            return None;
        }
        skip_whitespace(&mut chars);
        let value = quoted_string(&mut chars)?;
        map.insert(key, value);
        skip_whitespace(&mut chars);
        match chars.next()? {
            ',' => {}
            '}' => break,
            _ => return None,
        }
    }
    skip_whitespace(&mut chars);
    chars.next().is_none().then_some(map)
}

fn skip_whitespace(chars: &mut Peekable<Chars<'_>>) {
    while chars.next_if(|c| c.is_whitespace()).is_some() {}
}

fn quoted_string(chars: &mut Peekable<Chars<'_>>) -> Option<String> {
    let quote = chars.next().filter(|c| matches!(c, '\'' | '"'))?;
    let mut out = String::new();
    loop {
        match chars.next()? {
            c if c == quote => return Some(out),
            '\\' => match chars.next()? {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                '0' => out.push('\0'),
                'x' => out.push(hex_char(chars, 2)?),
                'u' => out.push(hex_char(chars, 4)?),
                'U' => out.push(hex_char(chars, 8)?),
                '\n' => {}
                c @ ('\\' | '\'' | '"') => out.push(c),
                other => {
                    out.push('\\');
                    out.push(other);
                }
            },
            c => out.push(c),
        }
    }
}

fn hex_char(chars: &mut Peekable<Chars<'_>>, digits: usize) -> Option<char> {
    let mut code = 0u32;
    for _ in 0..digits {
        code = code * 16 + chars.next()?.to_digit(16)?;
    }
    char::from_u32(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn strict_list() {
        let out = parse_sentence_list(r#"["Mr H was found with a knife."]"#);
        assert_eq!(out, ParseOutcome::Parsed(vec!["Mr H was found with a knife.".to_string()]));
    }

    #[test]
    fn code_fenced_list() {
        let out = parse_sentence_list("```json\n[\"a\", \"b\"]\n```");
        assert_eq!(out.into_sentences(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn no_brackets_is_empty() {
        let out = parse_sentence_list("I cannot help with that.");
        assert_eq!(out, ParseOutcome::NoList);
        assert!(out.into_sentences().is_empty());
    }

    #[test]
    fn reversed_brackets_are_malformed() {
        assert_eq!(parse_sentence_list("] then ["), ParseOutcome::Malformed);
    }

    #[test]
    fn unescaped_quotes_are_repaired() {
        let raw = r#"["He kept a file titled "fallback_methods.docx" on the laptop."]"#;
        let out = parse_sentence_list(raw);
        assert_eq!(
            out,
            ParseOutcome::Repaired(vec![
                "He kept a file titled 'fallback_methods.docx' on the laptop.".to_string()
            ])
        );
    }

    #[test]
    fn unrepairable_is_malformed() {
        assert_eq!(parse_sentence_list("[\"a\", b, c]"), ParseOutcome::Malformed);
    }

    #[test]
    fn escape_handles_em_dashes() {
        assert_eq!(escape_internal_quotes("—\"x"), "— 'x");
        assert_eq!(escape_internal_quotes("x\"—"), "x' —");
    }

    #[test]
    fn non_string_items_are_stringified() {
        assert_eq!(
            parse_sentence_list("[1, \"a\"]").into_sentences(),
            vec!["1".to_string(), "a".to_string()]
        );
    }

    #[test]
    fn dict_literal_single_quotes() {
        let map = parse_string_dict("{'snippet': 'He took gin.', 'include': 'took gin'}").unwrap();
        assert_eq!(map["snippet"], "He took gin.");
        assert_eq!(map["include"], "took gin");
    }

    #[test]
    fn dict_literal_mixed_quotes_and_escapes() {
        let raw = r#"{'snippet': "He said 'no' \\ twice.\nThen left.", 'include': 'it\'s \xa340 and \u2014'}"#;
        let map = parse_string_dict(raw).unwrap();
        assert_eq!(map["snippet"], "He said 'no' \\ twice.\nThen left.");
        assert_eq!(map["include"], "it's £40 and —");
    }

    #[test]
    fn dict_literal_keeps_unicode_and_trailing_comma() {
        let map = parse_string_dict("  {'include': '£40 — gin',}  ").unwrap();
        assert_eq!(map["include"], "£40 — gin");
        assert!(parse_string_dict("{}").unwrap().is_empty());
    }

    #[test]
    fn dict_literal_rejects_other_shapes() {
        assert!(parse_string_dict("['a', 'b']").is_none());
        assert!(parse_string_dict("{'a': 1}").is_none());
        assert!(parse_string_dict("{'a': 'b'").is_none());
        assert!(parse_string_dict("{'a': 'b'} extra").is_none());
        assert!(parse_string_dict("{'a' 'b'}").is_none());
        assert!(parse_string_dict("He took gin.").is_none());
    }
}
