//! CLI entry point for the linfix fixture generator.
//!
//! Parses the flat argument list with clap, installs logging at the level the
//! verbosity flag selects, writes the requested batch, and prints one written
//! path per line. Failures are logged with their stable error code and mapped
//! to a non-zero exit status.

use std::io::{self, BufWriter, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use linfix_cli::{
    cli::{Cli, CliError, render_summary, run_cli},
    logging::{self, LoggingError},
};
use tracing::{error, field};

fn try_main(cli: Cli) -> Result<()> {
    let summary = run_cli(cli).context("failed to generate fixtures")?;
    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());
    render_summary(&summary, &mut writer).context("failed to render summary")?;
    writer.flush().context("failed to flush output")?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = logging::init_logging(cli.verbose) {
        report_logging_init_error(&err);
        return ExitCode::FAILURE;
    }

    if let Err(err) = try_main(cli) {
        let code = err
            .downcast_ref::<CliError>()
            .map(CliError::code)
            .map(|code| field::display(code.as_str()));
        error!(error = %format!("{err:#}"), code, "fixture generation failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

#[expect(
    clippy::print_stderr,
    reason = "Emit one-off diagnostic before tracing is initialized"
)]
fn report_logging_init_error(err: &LoggingError) {
    eprintln!("failed to initialize logging: {err}");
}
