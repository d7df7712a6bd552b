//! Argument parsing and batch execution for the linfix CLI.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use linfix_core::{
    DEFAULT_RIDGE, FixtureError, FixtureErrorCode, FixtureKind, GeneratorBuilder, VectorLayout,
};
use thiserror::Error;
use tracing::{Span, field, info, instrument};

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(
    name = "linfix",
    about = "Generate pseudorandom linear-regression and masked linear-system fixtures."
)]
pub struct Cli {
    /// Number of rows `n` of each design matrix.
    #[arg(value_name = "N")]
    pub rows: usize,

    /// Number of columns `d` of each design matrix; must be greater than one.
    #[arg(value_name = "D")]
    pub cols: usize,

    /// Existing directory that receives the fixture files.
    #[arg(value_name = "DEST_FOLDER")]
    pub dest_folder: PathBuf,

    /// Number of fixtures to write.
    #[arg(value_name = "NUM_MATRICES")]
    pub num_matrices: usize,

    /// Log at debug level, including one event per written fixture.
    #[arg(short, long)]
    pub verbose: bool,

    /// Seed for a reproducible batch; OS entropy is used when omitted.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Ridge constant added to the diagonal of the normal equations.
    #[arg(long = "lambda", default_value_t = DEFAULT_RIDGE)]
    pub lambda: f64,

    /// Fixture shape to write.
    #[arg(long, value_enum, default_value_t = FixtureKindArg::Masked)]
    pub kind: FixtureKindArg,

    /// Reproduce the original byte layout, including the unseparated
    /// plain-system vector.
    #[arg(long)]
    pub legacy_layout: bool,
}

/// Fixture shapes selectable from the command line.
#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
pub enum FixtureKindArg {
    /// Masked normal equations (`test_LS_*` files).
    Masked,
    /// Plain normal equations (`test_LR_*` files).
    System,
}

impl From<FixtureKindArg> for FixtureKind {
    fn from(value: FixtureKindArg) -> Self {
        match value {
            FixtureKindArg::Masked => Self::Masked,
            FixtureKindArg::System => Self::System,
        }
    }
}

/// Errors surfaced while executing the CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Generating or writing the batch failed.
    #[error(transparent)]
    Fixture(#[from] FixtureError),
}

impl CliError {
    /// Stable machine-readable code of the underlying failure.
    #[must_use]
    pub const fn code(&self) -> FixtureErrorCode {
        match self {
            Self::Fixture(err) => err.code(),
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionSummary {
    /// Shape of the written fixtures.
    pub kind: FixtureKind,
    /// Written files, in index order.
    pub written: Vec<PathBuf>,
}

/// Translates parsed arguments into a generator configuration.
#[must_use]
pub fn generator_builder(cli: &Cli) -> GeneratorBuilder {
    let layout = if cli.legacy_layout {
        VectorLayout::Legacy
    } else {
        VectorLayout::Separated
    };
    let builder = GeneratorBuilder::new()
        .with_rows(cli.rows)
        .with_cols(cli.cols)
        .with_ridge(cli.lambda)
        .with_kind(cli.kind.into())
        .with_layout(layout);
    match cli.seed {
        Some(seed) => builder.with_seed(seed),
        None => builder,
    }
}

/// Writes the batch described by `cli`.
///
/// Dimensions and the ridge constant are validated before the destination is
/// touched, so a rejected configuration never creates files.
///
/// # Errors
/// Returns [`CliError::Fixture`] when the configuration is rejected, the
/// destination is missing, or a file cannot be written.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use clap::Parser;
/// # use linfix_cli::cli::{Cli, run_cli};
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let dir = tempfile::tempdir()?;
/// let dest = dir.path().to_str().ok_or("temp path is UTF-8")?;
/// let cli = Cli::try_parse_from(["linfix", "5", "3", dest, "2", "--seed", "7"])?;
/// let summary = run_cli(cli)?;
/// assert_eq!(summary.written.len(), 2);
/// assert!(summary.written[0].ends_with("test_LS_5x3_0.test"));
/// # Ok(())
/// # }
/// ```
#[instrument(
    name = "cli.run",
    err,
    skip(cli),
    fields(rows = cli.rows, cols = cli.cols, count = cli.num_matrices, seeded = field::Empty),
)]
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    Span::current().record("seeded", cli.seed.is_some());
    let mut generator = generator_builder(&cli).build()?;
    let written = generator.write_batch(&cli.dest_folder, cli.num_matrices)?;
    let kind = generator.config().kind();
    info!(%kind, files = written.len(), "command completed");
    Ok(ExecutionSummary { kind, written })
}

/// Renders `summary` to `writer`, one written path per line.
///
/// # Errors
/// Returns [`io::Error`] if writing to the supplied writer fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use std::path::PathBuf;
/// # use linfix_cli::cli::{ExecutionSummary, render_summary};
/// # use linfix_core::FixtureKind;
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let summary = ExecutionSummary {
///     kind: FixtureKind::Masked,
///     written: vec![PathBuf::from("out/test_LS_5x3_0.test")],
/// };
/// let mut buffer = Vec::new();
/// render_summary(&summary, &mut buffer)?;
/// assert_eq!(String::from_utf8(buffer)?, "out/test_LS_5x3_0.test\n");
/// # Ok(())
/// # }
/// ```
pub fn render_summary(summary: &ExecutionSummary, mut writer: impl Write) -> io::Result<()> {
    for path in &summary.written {
        writeln!(writer, "{}", path.display())?;
    }
    Ok(())
}
