//! # Pull Request Command Implementation
//!
//! This module implements the `pr` subcommand family against the Bitbucket
//! v1 REST API. Every operation acts on the pull request whose source is the
//! repository's current branch, and is refused while the repository is on
//! the default branch.
//!
//! - `pr <repos>`: show the pull request
//! - `pr new <repos>`: open one (first reviewer only unless `-a`)
//! - `pr edit <repos>`: change title, description or reviewers
//! - `pr merge <repos>`: merge it

use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Subcommand};

use batch_tool::batch::Chain;
use batch_tool::config::Setting;
use batch_tool::git::SourceBranchGuard;
use batch_tool::pr::{
    BitbucketPullRequests, CreatePullRequest, EditPullRequest, MergePullRequest,
    PullRequestOptions, PullRequestService, ShowPullRequest,
};

use super::Context;

/// Manage pull requests using the Bitbucket v1 API
#[derive(Args, Debug)]
#[command(subcommand_negates_reqs = true)]
pub struct PrArgs {
    #[command(subcommand)]
    pub command: Option<PrCommand>,

    /// Pull request title
    #[arg(short, long, global = true)]
    pub title: Option<String>,

    /// Pull request description
    #[arg(short, long, global = true)]
    pub description: Option<String>,

    /// Pull request reviewer (repeatable, or comma separated)
    #[arg(short, long = "reviewer", global = true, value_delimiter = ',')]
    pub reviewers: Vec<String>,

    #[arg(value_name = "REPOSITORY", required = true)]
    pub repos: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum PrCommand {
    /// Submit new pull requests
    New(NewArgs),

    /// Update existing pull requests
    Edit(EditArgs),

    /// Merge accepted pull requests
    Merge(ReposArgs),
}

#[derive(Args, Debug)]
pub struct ReposArgs {
    #[arg(value_name = "REPOSITORY", required = true)]
    pub repos: Vec<String>,
}

#[derive(Args, Debug)]
pub struct NewArgs {
    /// Use all provided reviewers for a new pull request
    #[arg(short, long = "all-reviewers")]
    pub all_reviewers: bool,

    #[arg(value_name = "REPOSITORY", required = true)]
    pub repos: Vec<String>,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Replace the reviewer list instead of appending to it
    #[arg(long)]
    pub no_append: bool,

    #[arg(value_name = "REPOSITORY", required = true)]
    pub repos: Vec<String>,
}

/// Execute the `pr` command.
pub fn execute(args: PrArgs, ctx: &Context) -> Result<()> {
    ctx.require(&[Setting::GitHost, Setting::AuthToken])?;

    let settings = &ctx.settings;
    let service: Arc<dyn PullRequestService> =
        Arc::new(BitbucketPullRequests::new(&settings.auth_token)?);
    let options = PullRequestOptions {
        branch: None,
        target_branch: settings.git.default_branch.clone(),
        title: args.title,
        description: args.description,
        reviewers: args.reviewers,
        default_reviewers: settings.repos.reviewers.clone(),
    };

    let guarded = || ctx.chain().then(SourceBranchGuard::new(&settings.git.default_branch));

    let (repos, chain): (Vec<String>, Chain) = match args.command {
        None => (
            args.repos,
            guarded().then(ShowPullRequest { service, options }),
        ),
        Some(PrCommand::New(a)) => (
            a.repos,
            guarded().then(CreatePullRequest {
                service,
                options,
                all_reviewers: a.all_reviewers,
            }),
        ),
        Some(PrCommand::Edit(a)) => (
            a.repos,
            guarded().then(EditPullRequest {
                service,
                options,
                no_append: a.no_append,
            }),
        ),
        Some(PrCommand::Merge(a)) => (
            a.repos,
            guarded().then(MergePullRequest { service, options }),
        ),
    };

    ctx.run(&repos, &chain)
}
