//! # Shell Command Implementation
//!
//! Runs an arbitrary `sh -c` command in every selected repository. The
//! command is hidden from help and always asks for confirmation first,
//! unless `--yes` is given. Confirmation happens before any worker starts.

use anyhow::Result;
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Confirm};

use batch_tool::batch::Exec;

use super::Context;

/// [!DANGEROUS!] Execute a shell command across repositories
#[derive(Args, Debug)]
pub struct ShellArgs {
    /// Shell command(s) to execute
    #[arg(short = 'c', long = "exec", value_name = "COMMAND")]
    pub exec: String,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    #[arg(value_name = "REPOSITORY", required = true)]
    pub repos: Vec<String>,
}

/// Execute the `shell` command.
pub fn execute(args: ShellArgs, ctx: &Context) -> Result<()> {
    let targets = ctx.select(&args.repos);
    if targets.is_empty() {
        return ctx.run_targets(&targets, &ctx.chain());
    }

    if !args.yes {
        println!("Executing command: {}", targets.join(" "));
        println!("  sh -c \"{}\"", args.exec);

        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Are you sure?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    let chain = ctx.chain().then(Exec::new("sh", ["-c", args.exec.as_str()]));
    ctx.run_targets(&targets, &chain)
}
