//! Command-line interface orchestration for the linfix fixture generator.
//!
//! The CLI is a single flat command: four positionals describing the batch
//! plus flags for reproducibility, ridge strength, fixture shape, and the
//! byte-compatible legacy layout.

mod commands;

pub use commands::{
    Cli, CliError, ExecutionSummary, FixtureKindArg, generator_builder, render_summary, run_cli,
};

#[cfg(test)]
mod tests;
