//! `vignette`: command-line driver for the vignette pipeline
//!
//! Each subcommand runs one stage over a directory tree:
//! `check` → `insert` → `finalise`, with `audit-catalog` as a standalone
//! catalog gate and `score` for evaluation logs produced downstream.

use anyhow::{bail, Context};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use vignette_checks::{copy_passing, screen, CheckSuite, TiktokenCounter};
use vignette_core::corpus;
use vignette_core::{CaseCategory, EmbeddingBackendConfig, GroundTruthField, PipelineConfig};
use vignette_insert::{export_dataset, finalise, load_vignettes, save_vignette, SubstitutionEngine};
use vignette_score::{build_embedder, CoverageScorer, IncludesOptions, LogEvaluator};

fn models_arg() -> Arg {
    Arg::new("models")
        .long("models")
        .value_delimiter(',')
        .num_args(1..)
        .help("Model directory names (comma separated)")
}

fn categories_arg() -> Arg {
    Arg::new("categories")
        .long("categories")
        .value_delimiter(',')
        .num_args(1..)
        .help("Case categories (comma separated)")
}

fn dir_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help(help)
}

fn build_cli() -> Command {
    Command::new("vignette")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Validate, complete and score synthetic sentencing-remark vignettes")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .help("Log filter, e.g. info or vignette_score=debug (overrides RUST_LOG)"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("check")
                .about("Run structural checks and copy passing documents")
                .arg(dir_arg("responses", "Generated documents, <model>/<category>/*.txt"))
                .arg(dir_arg("out", "Directory for passing documents"))
                .arg(models_arg())
                .arg(categories_arg())
                .arg(
                    Arg::new("report")
                        .long("report")
                        .value_parser(value_parser!(PathBuf))
                        .help("Write per-document check records as JSON"),
                ),
        )
        .subcommand(
            Command::new("audit-catalog")
                .about("Verify every include occurs in its snippet")
                .arg(dir_arg("snippets", "Snippet catalog, <category>/<label>.json"))
                .arg(categories_arg()),
        )
        .subcommand(
            Command::new("insert")
                .about("Substitute snippets into passing documents")
                .arg(dir_arg("in", "Passing documents, <model>/<category>/*.txt"))
                .arg(dir_arg("snippets", "Snippet catalog, <category>/<label>.json"))
                .arg(dir_arg("out", "Directory for vignettes"))
                .arg(models_arg())
                .arg(categories_arg())
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .value_parser(value_parser!(u64))
                        .help("Seed for candidate selection"),
                ),
        )
        .subcommand(
            Command::new("finalise")
                .about("Clean vignettes and export the evaluation dataset")
                .arg(dir_arg("in", "Vignettes, <model>/<category>/*.json"))
                .arg(dir_arg("out", "Directory for finalised vignettes"))
                .arg(dir_arg("dataset-dir", "Directory for <category>.json datasets"))
                .arg(models_arg())
                .arg(categories_arg()),
        )
        .subcommand(
            Command::new("score")
                .about("Score evaluation logs against their ground truth")
                .arg(dir_arg("logs", "Evaluation logs (*.json)"))
                .arg(dir_arg("out", "Directory for per-log results"))
                .arg(
                    Arg::new("threshold")
                        .long("threshold")
                        .value_parser(value_parser!(f32))
                        .help("Similarity a fact must exceed to count as covered"),
                )
                .arg(
                    Arg::new("backend")
                        .long("backend")
                        .value_parser(["hash", "openai"])
                        .help("Embedding backend"),
                )
                .arg(
                    Arg::new("ground-truth")
                        .long("ground-truth")
                        .value_parser(["include", "snippet"])
                        .help("Candidate text used as ground truth"),
                ),
        )
}

fn init_tracing(level: Option<&str>, json: bool) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

fn path<'a>(args: &'a ArgMatches, name: &str) -> anyhow::Result<&'a Path> {
    args.get_one::<PathBuf>(name)
        .map(PathBuf::as_path)
        .with_context(|| format!("missing --{name}"))
}

/// Config file, then per-command `--models` / `--categories` overrides
fn load_config(global: &ArgMatches, args: &ArgMatches) -> anyhow::Result<PipelineConfig> {
    let file = global.get_one::<PathBuf>("config");
    let mut config = PipelineConfig::load(file.map(PathBuf::as_path))
        .context("loading configuration")?;
    if let Some(models) = args.try_get_many::<String>("models").ok().flatten() {
        config = config.with_models(models.cloned().collect());
    }
    if let Some(names) = args.try_get_many::<String>("categories").ok().flatten() {
        let categories = names
            .map(|n| n.parse::<CaseCategory>())
            .collect::<Result<Vec<_>, _>>()?;
        config = config.with_categories(categories);
    }
    Ok(config)
}

fn run_check(config: &PipelineConfig, args: &ArgMatches) -> anyhow::Result<()> {
    let responses = path(args, "responses")?;
    let out = path(args, "out")?;
    let documents = corpus::load_documents(
        responses,
        &config.corpus.models,
        &config.corpus.categories,
        &config.corpus.pattern,
    )?;
    let counter = TiktokenCounter::o200k()?;
    let suite = CheckSuite::standard(&config.validation, Arc::new(counter));
    let report = screen(&suite, &documents);
    report.log_summary();
    if let Some(report_path) = args.get_one::<PathBuf>("report") {
        report
            .write(report_path)
            .with_context(|| format!("writing check report {}", report_path.display()))?;
    }
    let written = copy_passing(&report, &documents, out)?;
    println!("{written} of {} document(s) passed", documents.len());
    Ok(())
}

fn run_audit(config: &PipelineConfig, args: &ArgMatches) -> anyhow::Result<()> {
    let snippets = path(args, "snippets")?;
    let catalog = corpus::load_catalog(snippets, &config.corpus.categories)?;
    let audit = catalog.do_snippets_contain_includes();
    for violation in &audit.violations {
        tracing::error!(%violation, "include not found in snippet");
    }
    if !audit.all_contained() {
        bail!(
            "{} of {} candidate(s) fail the include check",
            audit.violations.len(),
            catalog.candidate_count()
        );
    }
    println!("all {} candidate(s) contain their include", catalog.candidate_count());
    Ok(())
}

fn run_insert(config: &PipelineConfig, args: &ArgMatches) -> anyhow::Result<()> {
    let input = path(args, "in")?;
    let snippets = path(args, "snippets")?;
    let out = path(args, "out")?;
    let seed = args
        .get_one::<u64>("seed")
        .copied()
        .unwrap_or(config.substitution.seed);
    let documents = corpus::load_documents(
        input,
        &config.corpus.models,
        &config.corpus.categories,
        &config.corpus.pattern,
    )?;
    let catalog = corpus::load_catalog(snippets, &config.corpus.categories)?;
    let vignettes = SubstitutionEngine::seeded(seed).run_batch(&documents, &catalog)?;
    for vignette in &vignettes {
        save_vignette(out, vignette)?;
    }
    tracing::info!(seed, count = vignettes.len(), out = %out.display(), "wrote vignettes");
    println!("wrote {} vignette(s)", vignettes.len());
    Ok(())
}

fn run_finalise(config: &PipelineConfig, args: &ArgMatches) -> anyhow::Result<()> {
    let input = path(args, "in")?;
    let out = path(args, "out")?;
    let dataset_dir = path(args, "dataset-dir")?;
    let vignettes: Vec<_> = load_vignettes(input, &config.corpus.models, &config.corpus.categories)?
        .into_iter()
        .map(|v| finalise(v, &config.finalise))
        .collect();
    for vignette in &vignettes {
        save_vignette(out, vignette)?;
    }
    let written = export_dataset(dataset_dir, &vignettes)?;
    println!(
        "finalised {} vignette(s) into {} dataset file(s)",
        vignettes.len(),
        written.len()
    );
    Ok(())
}

fn run_score(mut config: PipelineConfig, args: &ArgMatches) -> anyhow::Result<()> {
    let logs = path(args, "logs")?;
    let out = path(args, "out")?;
    if let Some(threshold) = args.get_one::<f32>("threshold") {
        config = config.with_threshold(*threshold);
    }
    if let Some(backend) = args.get_one::<String>("backend") {
        let selected_hash = matches!(config.scoring.embedding, EmbeddingBackendConfig::Hash { .. });
        match backend.as_str() {
            "hash" if !selected_hash => {
                config.scoring.embedding = EmbeddingBackendConfig::Hash {
                    dimensions: 1024,
                    seed: config.substitution.seed,
                };
            }
            "openai" if selected_hash => {
                config.scoring.embedding = EmbeddingBackendConfig::default();
            }
            _ => {}
        }
    }
    if let Some(field) = args.get_one::<String>("ground-truth") {
        config.scoring.ground_truth = field.parse::<GroundTruthField>()?;
    }
    config.validate()?;

    let embedder = build_embedder(&config.scoring.embedding)?;
    let evaluator = LogEvaluator::new(CoverageScorer::new(embedder.as_ref(), config.scoring.threshold))
        .with_ground_truth(config.scoring.ground_truth)
        .with_includes(IncludesOptions::from(&config.scoring));
    let results = evaluator.evaluate_dir(logs, out)?;
    for (log, result) in &results {
        println!(
            "{}\t{}\t{:.3}",
            log.display(),
            result.model,
            result.mean_score
        );
    }
    Ok(())
}

fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    let Some((name, args)) = matches.subcommand() else {
        bail!("no subcommand given");
    };
    let config = load_config(matches, args)?;
    match name {
        "check" => run_check(&config, args),
        "audit-catalog" => run_audit(&config, args),
        "insert" => run_insert(&config, args),
        "finalise" => run_finalise(&config, args),
        "score" => run_score(config, args),
        other => bail!("unknown subcommand '{other}'"),
    }
}

fn main() {
    let matches = build_cli().get_matches();
    init_tracing(
        matches.get_one::<String>("log-level").map(String::as_str),
        matches.get_flag("log-json"),
    );
    if let Err(err) = run(&matches) {
        tracing::error!(error = %format!("{err:#}"), "fatal");
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use vignette_core::Vignette;
    use vignette_test_utils::{
        eval_log_json, passing_document, sample_catalog, write_catalog, write_corpus,
    };

    fn matches(args: &[&str]) -> ArgMatches {
        build_cli().try_get_matches_from(args).unwrap()
    }

    fn dir(path: &Path) -> &str {
        path.to_str().unwrap()
    }

    #[test]
    fn cli_is_well_formed() {
        build_cli().debug_assert();
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let m = matches(&["vignette", "audit-catalog", "--snippets", "s", "--log-json"]);
        assert!(m.get_flag("log-json"));
    }

    #[test]
    fn unknown_category_is_rejected() {
        let m = matches(&["vignette", "audit-catalog", "--snippets", "s", "--categories", "arson"]);
        assert!(run(&m).is_err());
    }

    #[test]
    fn pipeline_end_to_end() {
        let root = TempDir::new().unwrap();
        let responses = root.path().join("responses");
        let pool = root.path().join("pool");
        let snippets = root.path().join("snippets");
        let vignettes = root.path().join("vignettes");
        let finalised = root.path().join("finalised");
        let dataset = root.path().join("dataset");

        let mut failing = passing_document("temp_2", "m1", CaseCategory::Shoplifting);
        failing.text.push_str(" red herring");
        write_corpus(
            &responses,
            &[passing_document("temp_1", "m1", CaseCategory::Shoplifting), failing],
        );
        write_catalog(&snippets, &sample_catalog());

        let common = ["--models", "m1", "--categories", "shoplifting"];
        let mut args = vec!["vignette", "check", "--responses", dir(&responses), "--out", dir(&pool)];
        args.extend(common);
        run(&matches(&args)).unwrap();
        assert!(pool.join("m1/shoplifting/temp_1.txt").exists());
        assert!(!pool.join("m1/shoplifting/temp_2.txt").exists());

        run(&matches(&["vignette", "audit-catalog", "--snippets", dir(&snippets)])).unwrap();

        let mut args = vec![
            "vignette", "insert", "--in", dir(&pool), "--snippets", dir(&snippets),
            "--out", dir(&vignettes), "--seed", "7",
        ];
        args.extend(common);
        run(&matches(&args)).unwrap();

        let mut args = vec![
            "vignette", "finalise", "--in", dir(&vignettes), "--out", dir(&finalised),
            "--dataset-dir", dir(&dataset),
        ];
        args.extend(common);
        run(&matches(&args)).unwrap();

        let body = std::fs::read_to_string(finalised.join("m1/shoplifting/temp_1.json")).unwrap();
        let vignette: Vignette = serde_json::from_str(&body).unwrap();
        assert_eq!(vignette.include.len(), 8);
        assert!(vignette.template.is_none());
        assert!(dataset.join("shoplifting.json").exists());
    }

    #[test]
    fn audit_fails_on_violation() {
        let root = TempDir::new().unwrap();
        write_catalog(root.path(), &sample_catalog());
        std::fs::write(
            root.path().join("terrorism/9.json"),
            r#"[{"snippet": "He fled.", "include": "He ran"}]"#,
        )
        .unwrap();
        let m = matches(&["vignette", "audit-catalog", "--snippets", dir(root.path())]);
        assert!(run(&m).is_err());
    }

    #[test]
    fn score_with_hash_backend() {
        let root = TempDir::new().unwrap();
        let logs = root.path().join("logs");
        let out = root.path().join("out");
        std::fs::create_dir_all(&logs).unwrap();
        std::fs::write(
            logs.join("run.json"),
            eval_log_json(
                "openai/gpt-4o",
                &[(serde_json::json!("[\"He took gin.\"]"), vec!["He took gin."])],
            ),
        )
        .unwrap();
        let m = matches(&[
            "vignette", "score", "--logs", dir(&logs), "--out", dir(&out),
            "--backend", "hash", "--ground-truth", "include", "--threshold", "0.9",
        ]);
        run(&m).unwrap();
        let body = std::fs::read_to_string(out.join("run.json")).unwrap();
        let result: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(result["mean_score"], serde_json::json!(1.0));
    }
}
