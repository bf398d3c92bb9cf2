//! # Labels Command Implementation
//!
//! This module implements the `labels` subcommand.
//!
//! - Without arguments it lists every label with its repositories.
//! - With filter arguments (`~label`, `!name`, `!~label`, plain names) it
//!   shows the set expression they form and the repositories it matches,
//!   without running anything.

use anyhow::Result;
use clap::Args;

use batch_tool::batch::arguments::expand_aliases;
use batch_tool::labels::{parse_tokens, render_labels, render_set, Resolver};
use batch_tool::suggestions;

use super::Context;

/// Inspect repository labels and test filters
#[derive(Args, Debug)]
pub struct LabelsArgs {
    /// Expand the labels referenced in the given filter
    #[arg(short, long)]
    pub verbose: bool,

    /// Repositories and labels (~label, !repo, !~label)
    #[arg(value_name = "FILTER")]
    pub filters: Vec<String>,
}

/// Execute the `labels` command.
pub fn execute(args: LabelsArgs, ctx: &Context) -> Result<()> {
    let index = ctx.label_index();

    if args.filters.is_empty() {
        println!("Available labels:");
        print!("{}", render_labels(&index, &[]));
        return Ok(());
    }

    let settings = &ctx.settings;
    let filters = expand_aliases(&args.filters, &settings.repos.aliases);
    let tokens = parse_tokens(&filters);
    let resolver = Resolver::new(&index, &settings.repos.unwanted_labels);

    print!(
        "{}",
        render_set(&resolver, &tokens, settings.repos.skip_unwanted, args.verbose)
    );

    let known: Vec<&str> = index.names().collect();
    for token in tokens.iter().filter(|t| t.is_label) {
        if index.get(&token.name).is_none() {
            eprintln!("warning: unknown label '~{}'", token.name);
            if let Some(hint) = suggestions::unknown_label(&token.name, &known) {
                eprintln!("{}", hint);
            }
        }
    }

    Ok(())
}
