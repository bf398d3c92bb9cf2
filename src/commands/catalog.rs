//! # Catalog Command Implementation
//!
//! This module implements the `catalog` subcommand, which prints the known
//! repositories with their visibility, labels and description.
//!
//! The catalog comes from the local cache file while it is younger than
//! `repos.cache.ttl`, otherwise from the Bitbucket API. `--refresh` skips the
//! cache and rewrites it.

use std::fmt::Write as _;

use anyhow::Result;
use clap::Args;
use console::style;

use batch_tool::catalog::{Catalog, Repository};
use batch_tool::config::Setting;
use batch_tool::suggestions;

use super::Context;

/// Print the repository catalog
#[derive(Args, Debug)]
pub struct CatalogArgs {
    /// Fetch the catalog from the server even if the cache is fresh
    #[arg(long)]
    pub refresh: bool,

    /// Print the catalog as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute the `catalog` command.
pub fn execute(args: CatalogArgs, ctx: &Context) -> Result<()> {
    if args.refresh {
        ctx.require(&[Setting::GitHost, Setting::GitProject, Setting::AuthToken])?;
    }

    let mut store = ctx.catalog_store()?;
    let catalog = if args.refresh {
        store.refresh()
    } else {
        store.load()
    }
    .map_err(|e| suggestions::catalog_unavailable(&e))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(catalog)?);
    } else {
        print!("{}", render(catalog, ctx.output.use_color));
    }

    Ok(())
}

/// One block per repository, in name order.
fn render(catalog: &Catalog, color: bool) -> String {
    let mut out = format!(
        "{} repositories, updated {}\n",
        catalog.len(),
        catalog.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    for repo in catalog.repositories.values() {
        let _ = writeln!(out, "\n{}", heading(repo, color));
        if !repo.labels.is_empty() {
            let labels: Vec<String> = repo.labels.iter().map(|l| format!("~{}", l)).collect();
            let _ = writeln!(out, "  labels: {}", labels.join(" "));
        }
        if !repo.description.is_empty() {
            let _ = writeln!(out, "  {}", repo.description);
        }
    }

    out
}

fn heading(repo: &Repository, color: bool) -> String {
    let visibility = if repo.public { "public" } else { "private" };
    let name = if color {
        style(&repo.name).bold().force_styling(true).to_string()
    } else {
        repo.name.clone()
    };
    format!("{} ({}/{}, {})", name, repo.project, repo.name, visibility)
}
