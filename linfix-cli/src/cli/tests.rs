//! Unit tests for argument parsing and batch execution.

use super::{Cli, CliError, ExecutionSummary, FixtureKindArg, generator_builder, render_summary, run_cli};

use std::fs;
use std::path::Path;

use clap::Parser;
use clap::error::ErrorKind;
use linfix_core::{FixtureError, FixtureErrorCode, FixtureKind, VectorLayout};
use linfix_test_support::tracing::RecordingLayer;
use rstest::rstest;
use tempfile::TempDir;
use tracing_subscriber::layer::SubscriberExt;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn parse(dest: &Path, extra: &[&str]) -> Result<Cli, clap::Error> {
    let dest = dest.display().to_string();
    let mut args = vec!["linfix".to_owned(), "5".to_owned(), "3".to_owned(), dest, "1".to_owned()];
    args.extend(extra.iter().map(|arg| (*arg).to_owned()));
    Cli::try_parse_from(args)
}

fn entries(dir: &Path) -> usize {
    fs::read_dir(dir).map_or(0, Iterator::count)
}

#[test]
fn defaults_match_original_driver() -> TestResult {
    let dir = TempDir::new()?;
    let cli = parse(dir.path(), &[])?;
    assert_eq!((cli.rows, cli.cols, cli.num_matrices), (5, 3, 1));
    assert!(!cli.verbose);
    assert_eq!(cli.seed, None);
    assert!((cli.lambda - 3.0).abs() < f64::EPSILON);
    assert_eq!(cli.kind, FixtureKindArg::Masked);
    assert!(!cli.legacy_layout);
    Ok(())
}

#[rstest]
#[case::short(&["-v"])]
#[case::long(&["--verbose"])]
fn verbose_flag_is_accepted(#[case] extra: &[&str]) -> TestResult {
    let dir = TempDir::new()?;
    assert!(parse(dir.path(), extra)?.verbose);
    Ok(())
}

#[test]
fn optional_flags_configure_the_generator() -> TestResult {
    let dir = TempDir::new()?;
    let cli = parse(
        dir.path(),
        &["--seed", "9", "--lambda", "0.5", "--kind", "system", "--legacy-layout"],
    )?;
    let generator = generator_builder(&cli).build()?;
    let config = generator.config();
    assert_eq!(config.seed(), Some(9));
    assert!((config.ridge() - 0.5).abs() < f64::EPSILON);
    assert_eq!(config.kind(), FixtureKind::System);
    assert_eq!(config.layout(), VectorLayout::Legacy);
    Ok(())
}

#[rstest]
#[case::missing_count(&["linfix", "5", "3", "out"])]
#[case::non_numeric_rows(&["linfix", "five", "3", "out", "1"])]
#[case::negative_count(&["linfix", "5", "3", "out", "-1"])]
#[case::unknown_kind(&["linfix", "5", "3", "out", "1", "--kind", "plain"])]
fn malformed_arguments_are_rejected(#[case] args: &[&str]) {
    let err = Cli::try_parse_from(args).expect_err("arguments must be rejected");
    assert_ne!(err.kind(), ErrorKind::DisplayHelp);
}

#[rstest]
#[case(FixtureKindArg::Masked, "test_LS")]
#[case(FixtureKindArg::System, "test_LR")]
fn run_writes_requested_batch(#[case] kind: FixtureKindArg, #[case] prefix: &str) -> TestResult {
    let dir = TempDir::new()?;
    let mut cli = parse(dir.path(), &["--seed", "1"])?;
    cli.kind = kind;
    cli.num_matrices = 2;
    let summary = run_cli(cli)?;
    assert_eq!(summary.kind, FixtureKind::from(kind));
    let expected: Vec<_> = (0..2)
        .map(|i| dir.path().join(format!("{prefix}_5x3_{i}.test")))
        .collect();
    assert_eq!(summary.written, expected);
    assert_eq!(entries(dir.path()), 2);
    Ok(())
}

#[test]
fn one_column_fails_without_touching_destination() -> TestResult {
    let dir = TempDir::new()?;
    let mut cli = parse(dir.path(), &[])?;
    cli.cols = 1;
    let err = run_cli(cli).expect_err("one column must be rejected");
    assert!(matches!(
        err,
        CliError::Fixture(FixtureError::TooFewColumns { cols: 1 })
    ));
    assert_eq!(err.code(), FixtureErrorCode::TooFewColumns);
    assert_eq!(entries(dir.path()), 0);
    Ok(())
}

#[test]
fn missing_destination_reports_stable_code() -> TestResult {
    let dir = TempDir::new()?;
    let cli = parse(&dir.path().join("absent"), &[])?;
    let err = run_cli(cli).expect_err("destination must exist");
    assert_eq!(err.code().as_str(), "LINFIX_DESTINATION_MISSING");
    Ok(())
}

#[test]
fn zero_matrices_succeeds_with_empty_summary() -> TestResult {
    let dir = TempDir::new()?;
    let mut cli = parse(dir.path(), &[])?;
    cli.num_matrices = 0;
    let summary = run_cli(cli)?;
    assert!(summary.written.is_empty());
    assert_eq!(entries(dir.path()), 0);
    Ok(())
}

#[test]
fn render_summary_lists_each_path() -> TestResult {
    let summary = ExecutionSummary {
        kind: FixtureKind::Masked,
        written: vec!["a/test_LS_2x2_0.test".into(), "a/test_LS_2x2_1.test".into()],
    };
    let mut buffer = Vec::new();
    render_summary(&summary, &mut buffer)?;
    assert_eq!(
        String::from_utf8(buffer)?,
        "a/test_LS_2x2_0.test\na/test_LS_2x2_1.test\n"
    );
    Ok(())
}

#[test]
fn run_span_records_configuration() -> TestResult {
    let dir = TempDir::new()?;
    let cli = parse(dir.path(), &["--seed", "4"])?;
    let layer = RecordingLayer::default();
    let subscriber = tracing_subscriber::registry().with(layer.clone());
    tracing::subscriber::with_default(subscriber, || run_cli(cli))?;

    let span = layer.span_named("cli.run").ok_or("cli.run span recorded")?;
    assert_eq!(span.fields.get("rows"), Some(&"5".to_owned()));
    assert_eq!(span.fields.get("cols"), Some(&"3".to_owned()));
    assert_eq!(span.fields.get("count"), Some(&"1".to_owned()));
    assert_eq!(span.fields.get("seeded"), Some(&"true".to_owned()));
    assert!(layer.span_named("generator.write_batch").is_some());
    Ok(())
}
