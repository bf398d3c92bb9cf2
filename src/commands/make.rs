//! # Make Command Implementation
//!
//! Runs `make <targets>` in every selected repository. Some make targets
//! touch shared resources and must be run with `--sync`.

use anyhow::Result;
use clap::Args;

use batch_tool::batch::Exec;

use super::Context;

/// Execute make across repositories
#[derive(Args, Debug)]
#[command(long_about = "Execute make across repositories\n\n\
The provided make targets will be called for each provided repository. Note that some \
make targets MUST be run synchronously using the '--sync' command line flag.")]
pub struct MakeArgs {
    /// Make target(s) to run
    #[arg(
        short,
        long = "target",
        value_name = "TARGET",
        value_delimiter = ',',
        default_value = "format"
    )]
    pub targets: Vec<String>,

    #[arg(value_name = "REPOSITORY", required = true)]
    pub repos: Vec<String>,
}

/// Execute the `make` command.
pub fn execute(args: MakeArgs, ctx: &Context) -> Result<()> {
    let chain = ctx.chain().then(Exec::new("make", args.targets));
    ctx.run(&args.repos, &chain)
}
