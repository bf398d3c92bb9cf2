//! # Git Command Implementation
//!
//! This module implements the `git` subcommand family. Every subcommand runs
//! against the selected repositories, cloning any that are missing first.
//!
//! - `git <repos>` / `git status <repos>`: short coloured status
//! - `git diff <repos>`
//! - `git update <repos>`: check out the default branch and pull
//! - `git branch -b <name> <repos>`: update, then switch to (or create and
//!   push) a branch
//! - `git commit -m <msg> <repos>`: stage everything, commit and push;
//!   refused on the default branch

use anyhow::Result;
use clap::{Args, Subcommand};

use batch_tool::git::{self, Checkout, Commit, SourceBranchGuard, Update};
use batch_tool::suggestions;

use super::Context;

/// Manage git branches and commits
#[derive(Args, Debug)]
#[command(args_conflicts_with_subcommands = true, subcommand_negates_reqs = true)]
pub struct GitArgs {
    #[command(subcommand)]
    pub command: Option<GitCommand>,

    /// Repositories to show the status of
    #[arg(value_name = "REPOSITORY", required = true)]
    pub repos: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum GitCommand {
    /// Git status of each repository
    Status(ReposArgs),

    /// Git diff of each repository
    Diff(ReposArgs),

    /// Update the default branch across repositories
    Update(ReposArgs),

    /// Check out a branch across repositories, creating it where missing
    #[command(alias = "checkout")]
    Branch(BranchArgs),

    /// Commit and push code changes across repositories
    Commit(CommitArgs),
}

/// Repositories, labels and aliases to operate on
#[derive(Args, Debug)]
pub struct ReposArgs {
    #[arg(value_name = "REPOSITORY", required = true)]
    pub repos: Vec<String>,
}

#[derive(Args, Debug)]
pub struct BranchArgs {
    /// Branch name
    #[arg(short, long)]
    pub branch: String,

    #[arg(value_name = "REPOSITORY", required = true)]
    pub repos: Vec<String>,
}

#[derive(Args, Debug)]
pub struct CommitArgs {
    /// Commit message (required for new commits)
    #[arg(short, long)]
    pub message: Option<String>,

    /// Amend the latest existing commit and force-push
    #[arg(short, long)]
    pub amend: bool,

    #[arg(value_name = "REPOSITORY", required = true)]
    pub repos: Vec<String>,
}

/// Execute the `git` command.
pub fn execute(args: GitArgs, ctx: &Context) -> Result<()> {
    let source = ctx.settings.git.default_branch.clone();

    match args.command {
        None => ctx.run(&args.repos, &ctx.chain().then(git::status())),
        Some(GitCommand::Status(a)) => ctx.run(&a.repos, &ctx.chain().then(git::status())),
        Some(GitCommand::Diff(a)) => ctx.run(&a.repos, &ctx.chain().then(git::diff())),
        Some(GitCommand::Update(a)) => ctx.run(&a.repos, &ctx.chain().then(Update::new(source))),
        Some(GitCommand::Branch(a)) => {
            let chain = ctx
                .chain()
                .then(Update::new(source))
                .then(Checkout::new(a.branch));
            ctx.run(&a.repos, &chain)
        }
        Some(GitCommand::Commit(a)) => {
            let message = a.message.filter(|m| !m.trim().is_empty());
            if message.is_none() && !a.amend {
                return Err(suggestions::commit_message_required());
            }

            let chain = ctx
                .chain()
                .then(SourceBranchGuard::new(source))
                .then(Commit {
                    message,
                    amend: a.amend,
                });
            ctx.run(&a.repos, &chain)
        }
    }
}
