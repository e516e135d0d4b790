//! Subcommand handlers

use anyhow::{Context, Result};
use apidelta_core::{
    CommandLlmClient, ExtractionReport, FragmentExtractor, LlmTestGenerator, PipelineConfig,
    ReconciliationDriver, RevisionSelector, RunId, RunReport, Selection, TargetLanguage,
    DEFAULT_LLM_TIMEOUT_SECS, DEFAULT_PREFIX,
};
use apidelta_diff::PathDiffer;
use apidelta_loader::SpecLoader;
use apidelta_spec::{FragmentContext, PathKey};
use clap::ArgMatches;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

/// Exit code when the run finished but recorded per-item failures
const PARTIAL_FAILURE: u8 = 2;

pub(crate) async fn run(args: &ArgMatches, json: bool) -> Result<ExitCode> {
    let config = build_config(args)?;
    let mut driver = ReconciliationDriver::new(config.clone());

    if let Some(program) = args.get_one::<String>("llm-command") {
        let timeout = args.get_one::<u64>("llm-timeout").copied().unwrap_or(DEFAULT_LLM_TIMEOUT_SECS);
        let client = CommandLlmClient::new(program.clone())
            .with_args(args.get_many::<String>("llm-arg").into_iter().flatten().cloned())
            .with_timeout(Duration::from_secs(timeout));
        let generator = LlmTestGenerator::new(Arc::new(client), config.tests_path());
        driver = driver.with_generator(Arc::new(generator));
    } else {
        tracing::info!("no --llm-command given, skipping test generation");
    }

    let report = driver.run().await.context("reconciliation failed")?;
    if json {
        print_json(&report)?;
    } else {
        print_run(&report);
    }

    Ok(if report.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(PARTIAL_FAILURE)
    })
}

pub(crate) async fn diff(args: &ArgMatches, json: bool) -> Result<ExitCode> {
    let old_path = args.get_one::<PathBuf>("old").context("missing OLD")?;
    let new_path = args.get_one::<PathBuf>("new").context("missing NEW")?;

    let loader = SpecLoader::new();
    let old = loader.load(old_path).await?;
    let new = loader.load(new_path).await?;
    let differ = PathDiffer::new();

    if args.get_flag("changes") {
        let changes = differ.changes(&old, &new);
        if json {
            print_json(&changes)?;
        } else if changes.is_empty() {
            println!("no changes");
        } else {
            for change in &changes {
                println!("{change}");
            }
        }
        return Ok(ExitCode::SUCCESS);
    }

    let result = differ.diff(&old, &new);
    if json {
        print_json(&result)?;
    } else {
        println!("{result}");
        for path in &result.added {
            println!("  + {path}");
        }
        for path in &result.updated {
            println!("  ~ {path}");
        }
        for slug in &result.deleted {
            println!("  - {slug}");
        }
    }
    Ok(ExitCode::SUCCESS)
}

pub(crate) async fn extract(args: &ArgMatches, json: bool) -> Result<ExitCode> {
    let spec = args.get_one::<PathBuf>("spec").context("missing SPEC")?;
    let root = args
        .get_one::<PathBuf>("out")
        .cloned()
        .unwrap_or_else(std::env::temp_dir);
    let context = if args.get_flag("no-context") {
        FragmentContext::Minimal
    } else {
        FragmentContext::Document
    };
    let paths: BTreeSet<PathKey> = args
        .get_many::<String>("path")
        .into_iter()
        .flatten()
        .map(PathKey::new)
        .collect();

    let doc = SpecLoader::new().load(spec).await?;
    let extractor = FragmentExtractor::create(&root, RunId::new(), context).await?;
    let report = if paths.is_empty() {
        extractor.extract_all(&doc).await?
    } else {
        extractor
            .extract_selected(&doc, &paths, &BTreeSet::new())
            .await?
    };

    if json {
        print_json(&report)?;
    } else {
        print_extraction(&report);
    }
    Ok(if report.failed.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(PARTIAL_FAILURE)
    })
}

pub(crate) async fn latest(args: &ArgMatches, json: bool) -> Result<ExitCode> {
    let folder = args.get_one::<PathBuf>("specs").context("missing --specs")?;
    let prefix = args
        .get_one::<String>("prefix")
        .map_or(DEFAULT_PREFIX, String::as_str);

    let selection = RevisionSelector::new(prefix).select(folder).await?;
    if json {
        print_json(&selection)?;
    } else {
        print_selection(&selection);
    }
    Ok(ExitCode::SUCCESS)
}

/// Config file values, then flags (and their env fallbacks) on top
fn build_config(args: &ArgMatches) -> Result<PipelineConfig> {
    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => PipelineConfig::from_toml_file(path)?,
        None => PipelineConfig::new(),
    };

    if let Some(folder) = args.get_one::<PathBuf>("specs") {
        config = config.with_spec_folder(folder);
    }
    if let Some(folder) = args.get_one::<PathBuf>("target") {
        config = config.with_target_folder(folder);
    }
    if let Some(prefix) = args.get_one::<String>("prefix") {
        config = config.with_prefix(prefix);
    }
    if let Some(language) = args.get_one::<TargetLanguage>("language") {
        config = config.with_language(*language);
    }
    if let Some(dir) = args.get_one::<PathBuf>("tests-dir") {
        config = config.with_tests_dir(dir);
    }
    if let Some(root) = args.get_one::<PathBuf>("fragments-root") {
        config = config.with_fragment_root(root);
    }
    if args.get_flag("full") {
        config = config.with_force_full(true);
    }
    if args.get_flag("no-context") {
        config = config.with_context(false);
    }

    config.validate()?;
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_selection(selection: &Selection) {
    println!("current:  {}", selection.current.path.display());
    match &selection.previous {
        Some(previous) => println!("previous: {}", previous.path.display()),
        None => println!("previous: none (full extraction)"),
    }
}

fn print_extraction(report: &ExtractionReport) {
    println!(
        "{} fragments written to {}",
        report.len(),
        report.output_dir.display()
    );
    for failure in &report.failed {
        println!("  failed {}: {}", failure.operation, failure.error);
    }
}

fn print_run(report: &RunReport) {
    let states: Vec<&str> = report.states.iter().map(|s| s.as_str()).collect();
    println!("run {}: {}", report.run_id, states.join(" -> "));
    print_selection(&report.selection);
    if let Some(diff) = &report.diff {
        println!("diff: {diff}");
    }
    match &report.extraction {
        Some(extraction) => print_extraction(extraction),
        None => println!("nothing extracted"),
    }
    for path in &report.pruned.removed {
        println!("  pruned {}", path.display());
    }
    for (path, error) in &report.pruned.failed {
        println!("  prune failed {}: {error}", path.display());
    }
    println!(
        "{} tests generated, {} failed",
        report.generated.len(),
        report.generation_failures.len()
    );
    for failure in &report.generation_failures {
        println!("  generation failed {}: {}", failure.fragment.display(), failure.error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli;
    use pretty_assertions::assert_eq;

    fn run_args(argv: &[&str]) -> ArgMatches {
        let mut full = vec!["apidelta", "run"];
        full.extend_from_slice(argv);
        let matches = cli().try_get_matches_from(full).unwrap();
        matches.subcommand_matches("run").unwrap().clone()
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("apidelta.toml");
        std::fs::write(
            &file,
            "spec_folder = \"from-file\"\ntarget_folder = \"target\"\nprefix = \"Api\"\nlanguage = \"typescript\"\n",
        )
        .unwrap();

        let config = build_config(&run_args(&[
            "--config",
            file.to_str().unwrap(),
            "--specs",
            "from-flag",
            "--full",
        ]))
        .unwrap();

        assert_eq!(config.spec_folder, PathBuf::from("from-flag"));
        assert_eq!(config.target_folder, PathBuf::from("target"));
        assert_eq!(config.prefix, "Api");
        assert_eq!(config.language, TargetLanguage::TypeScript);
        assert!(config.force_full);
        assert!(config.include_context);
    }

    #[test]
    fn missing_target_fails_validation() {
        let result = build_config(&run_args(&["--specs", "specs"]));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn extract_writes_selected_paths() {
        let out = tempfile::tempdir().unwrap();
        let specs = apidelta_test_utils::SpecFolder::new();
        let spec = specs.add_revision(
            apidelta_test_utils::OLDER_TS,
            "yaml",
            &apidelta_test_utils::petstore_v1(),
        );

        let matches = cli()
            .try_get_matches_from([
                "apidelta",
                "extract",
                spec.to_str().unwrap(),
                "--path",
                "/pet/{petId}",
                "--out",
                out.path().to_str().unwrap(),
            ])
            .unwrap();
        let args = matches.subcommand_matches("extract").unwrap();

        extract(args, true).await.unwrap();

        let run_dir = std::fs::read_dir(out.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .find(|p| p.is_dir())
            .unwrap();
        let mut files: Vec<String> = std::fs::read_dir(run_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        files.sort();
        assert_eq!(files, ["pet_petId_DELETE.json", "pet_petId_GET.json"]);
    }
}
