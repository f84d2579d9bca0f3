//! Property-based tests for the structural checks

use proptest::prelude::*;
use std::sync::Arc;
use vignette_checks::checks::{passes_snippet_spacing_check, snippets_not_midsentence};
use vignette_checks::{CheckSuite, WhitespaceCounter};
use vignette_core::placeholder::token;
use vignette_core::{CaseCategory, Document, ValidationConfig};
use vignette_test_utils::passing_text_with;

fn category() -> impl Strategy<Value = CaseCategory> {
    prop_oneof![
        Just(CaseCategory::Shoplifting),
        Just(CaseCategory::DomesticAbuse),
        Just(CaseCategory::Terrorism),
    ]
}

proptest! {
    #[test]
    fn well_formed_documents_always_pass(sentences in 6usize..20, category in category()) {
        let suite = CheckSuite::standard(&ValidationConfig::default(), Arc::new(WhitespaceCounter));
        let doc = Document::new("temp_1", "m", category, passing_text_with(sentences));
        let record = suite.evaluate(&doc);
        prop_assert!(record.passes_all_checks);
    }

    #[test]
    fn three_adjacent_placeholders_fail_spacing(
        start in 1u64..6,
        sep_a in "[ .,;:\n]{0,4}",
        sep_b in "[ .,;:\n]{0,4}",
    ) {
        let text = format!(
            "Preamble.\n\n{}{sep_a}{}{sep_b}{}\n\nClosing words.",
            token(start),
            token(start + 1),
            token(start + 2),
        );
        prop_assert!(!passes_snippet_spacing_check(&text, 2));
    }

    #[test]
    fn word_before_placeholder_is_midsentence(word in "[A-Za-z]{1,12}", gap in " {0,5}") {
        let text = format!("Preamble.\n\nThe {word}{gap}{}", token(1));
        prop_assert!(!snippets_not_midsentence(&text, 30));
    }

    #[test]
    fn paragraph_break_before_placeholder_is_fine(word in "[A-Za-z]{1,12}") {
        let text = format!("The {word}.\n\n{}", token(1));
        prop_assert!(snippets_not_midsentence(&text, 30));
    }
}
