//! End-to-end scoring of evaluation logs

use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;
use vignette_core::GroundTruthField;
use vignette_score::{
    CoverageScorer, EvalLog, EvaluationResult, HashEmbedder, LogEvaluator, ScoreError,
};
use vignette_test_utils::{eval_log_json, FailingEmbedder, StubEmbedder};

const KNIFE: &str = "Mr H was found with a knife.";
const KNIFE_TRUTH: &str = "Mr H carried a knife";
const STAFF_TRUTH: &str = "He threatened staff";

fn knife_embedder() -> StubEmbedder {
    StubEmbedder::new(vec![0.0, 0.0, 0.0, 1.0])
        .with(KNIFE, vec![1.0, 0.0, 0.0, 0.0])
        .with(KNIFE_TRUTH, vec![0.95, 0.31, 0.0, 0.0])
        .with(STAFF_TRUTH, vec![0.0, 0.0, 1.0, 0.0])
}

#[test]
fn one_sentence_covers_one_of_two_facts() {
    let embedder = knife_embedder();
    let scorer = CoverageScorer::new(&embedder, 0.85);
    let score = scorer
        .score(
            &[KNIFE.to_string()],
            &[KNIFE_TRUTH.to_string(), STAFF_TRUTH.to_string()],
        )
        .unwrap();
    assert!((score - 0.5).abs() < f32::EPSILON);
    assert_eq!(embedder.calls(), 1);
}

#[test]
fn output_without_list_scores_zero_without_embedding() {
    let embedder = knife_embedder();
    let evaluator = LogEvaluator::new(CoverageScorer::new(&embedder, 0.85));
    let log: EvalLog = serde_json::from_str(&eval_log_json(
        "openai/gpt-4o",
        &[(json!("I cannot help with that."), vec![KNIFE_TRUTH])],
    ))
    .unwrap();
    let result = evaluator.evaluate(&log).unwrap();
    assert_eq!(result.scores, vec![0.0]);
    assert_eq!(embedder.calls(), 0);
}

#[test]
fn block_content_goes_through_model_adapter() {
    let embedder = knife_embedder();
    let evaluator = LogEvaluator::new(CoverageScorer::new(&embedder, 0.85));
    let content = json!([
        {"type": "reasoning", "text": "thinking it over"},
        {"type": "text", "text": format!("[\"{KNIFE}\"]")},
    ]);
    let log: EvalLog = serde_json::from_str(&eval_log_json(
        "grok/grok-3-mini",
        &[(content, vec![KNIFE_TRUTH, STAFF_TRUTH])],
    ))
    .unwrap();
    let result = evaluator.evaluate(&log).unwrap();
    assert_eq!(result.scores, vec![0.5]);
    assert_eq!(result.model, "grok/grok-3-mini");
    assert_eq!(result.max_tokens, Some(2048));
}

#[test]
fn unescaped_quotes_are_repaired() {
    let embedder = HashEmbedder::new(512, 3).unwrap();
    let evaluator = LogEvaluator::new(CoverageScorer::new(&embedder, 0.85));
    let raw = r#"["He said "give me the money" to the clerk."]"#;
    let truth = "He said 'give me the money' to the clerk.";
    let log: EvalLog =
        serde_json::from_str(&eval_log_json("openai/gpt-4o", &[(json!(raw), vec![truth])])).unwrap();
    let result = evaluator.evaluate(&log).unwrap();
    assert_eq!(result.scores, vec![1.0]);
}

#[test]
fn snippet_ground_truth_uses_choices() {
    let embedder = HashEmbedder::new(512, 3).unwrap();
    let evaluator = LogEvaluator::new(CoverageScorer::new(&embedder, 0.85))
        .with_ground_truth(GroundTruthField::Snippet);
    let content = json!(format!("[\"It was said that {STAFF_TRUTH}\"]"));
    let log: EvalLog = serde_json::from_str(&eval_log_json(
        "openai/gpt-4o",
        &[(content, vec![STAFF_TRUTH])],
    ))
    .unwrap();
    let result = evaluator.evaluate(&log).unwrap();
    assert_eq!(result.scores, vec![1.0]);
    assert_eq!(result.lexical_scores, vec![1.0]);
}

#[test]
fn evaluate_dir_writes_one_result_per_log() {
    let logs = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    std::fs::write(
        logs.path().join("a.json"),
        eval_log_json(
            "openai/gpt-4o",
            &[
                (json!(format!("[\"{KNIFE}\"]")), vec![KNIFE_TRUTH, STAFF_TRUTH]),
                (json!("no list"), vec![STAFF_TRUTH]),
            ],
        ),
    )
    .unwrap();
    std::fs::write(
        logs.path().join("b.json"),
        eval_log_json("openai/gpt-4o-mini", &[]),
    )
    .unwrap();
    std::fs::write(logs.path().join("notes.txt"), "ignored").unwrap();

    let embedder = knife_embedder();
    let evaluator = LogEvaluator::new(CoverageScorer::new(&embedder, 0.85));
    let results = evaluator.evaluate_dir(logs.path(), out.path()).unwrap();
    assert_eq!(results.len(), 2);

    let a: EvaluationResult =
        serde_json::from_str(&std::fs::read_to_string(out.path().join("a.json")).unwrap()).unwrap();
    assert_eq!(a.scores, vec![0.5, 0.0]);
    assert!((a.mean_score - 0.25).abs() < f32::EPSILON);
    assert_eq!(a.dataset.as_deref(), Some("vignettes"));

    let b: EvaluationResult =
        serde_json::from_str(&std::fs::read_to_string(out.path().join("b.json")).unwrap()).unwrap();
    assert!(b.scores.is_empty());
    assert_eq!(b.mean_score, 0.0);
}

#[test]
fn backend_failure_aborts_and_names_log() {
    let logs = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let path = logs.path().join("a.json");
    std::fs::write(
        &path,
        eval_log_json("openai/gpt-4o", &[(json!(format!("[\"{KNIFE}\"]")), vec![KNIFE_TRUTH])]),
    )
    .unwrap();
    let embedder = FailingEmbedder;
    let evaluator = LogEvaluator::new(CoverageScorer::new(&embedder, 0.85));
    let err = evaluator.evaluate_file(&path, out.path()).unwrap_err();
    assert!(matches!(err, ScoreError::Embed { .. }));
    assert!(err.to_string().contains("a.json"));
    assert!(!out.path().join("a.json").exists());
}

#[test]
fn unreadable_log_is_load_error() {
    let logs = TempDir::new().unwrap();
    let path = logs.path().join("broken.json");
    std::fs::write(&path, "{not json").unwrap();
    let embedder = knife_embedder();
    let evaluator = LogEvaluator::new(CoverageScorer::new(&embedder, 0.85));
    let err = evaluator.evaluate_file(&path, logs.path()).unwrap_err();
    assert!(matches!(err, ScoreError::Load(_)));
}
