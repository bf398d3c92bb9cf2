//! # Batch Tool CLI
//!
//! Binary entry point for `batch-tool`. It parses the command line and
//! dispatches to the command modules; selection, the execution engine and the
//! Bitbucket clients all live in the library crate.
//!
//! Errors are reported by `anyhow` and turn into a non-zero exit status.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
