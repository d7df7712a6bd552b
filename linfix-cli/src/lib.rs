//! Support library for the linfix fixture generator binary.
//!
//! Exposes argument parsing, batch orchestration, and logging setup so
//! integration tests can drive the generator without spawning a process.

pub mod cli;
pub mod logging;
