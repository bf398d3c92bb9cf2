//! # Completions Command Implementation
//!
//! Prints a completion script for `batch-tool` to stdout, generated with
//! `clap_complete` from the same clap definition the binary parses with.
//!
//! ```bash
//! batch-tool completions bash > ~/.local/share/bash-completion/completions/batch-tool
//! batch-tool completions zsh > ~/.zfunc/_batch-tool
//! batch-tool completions fish > ~/.config/fish/completions/batch-tool.fish
//! ```

use std::io;

use anyhow::Result;
use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};

use crate::cli::Cli;

/// Generate shell completion scripts
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// The shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Execute the `completions` command.
///
/// Needs no configuration, so it works before a config file exists.
pub fn execute(args: CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(args.shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}
