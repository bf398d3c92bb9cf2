//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use log::debug;

use batch_tool::config::Settings;
use batch_tool::defaults::CONFIG_ENV;
use batch_tool::output::OutputConfig;
use batch_tool::suggestions;

use crate::commands::{self, Context};

/// Batch Tool - Run git, make and pull-request operations across many repositories
#[derive(Parser, Debug)]
#[command(name = "batch-tool")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalArgs,
}

/// Flags shared by every subcommand.
#[derive(Args, Debug)]
struct GlobalArgs {
    /// Configuration file (default: batch-tool.yaml in ., /usr/local/etc/ or next to the binary)
    #[arg(long, global = true, value_name = "FILE", env = CONFIG_ENV)]
    config: Option<PathBuf>,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,

    /// Run repositories one at a time instead of concurrently
    #[arg(long, global = true)]
    sync: bool,

    /// Keep repositories in the order given instead of sorting them
    #[arg(long, global = true)]
    no_sort: bool,

    /// Do not exclude repositories carrying unwanted labels
    #[arg(long, global = true)]
    no_skip_unwanted: bool,

    /// Lines of output buffered per repository
    #[arg(long, global = true, value_name = "LINES")]
    buffer_size: Option<usize>,

    /// Bitbucket API token
    #[arg(long, global = true, value_name = "TOKEN", env = "AUTH_TOKEN", hide_env_values = true)]
    auth_token: Option<String>,
}

impl GlobalArgs {
    /// Apply command-line overrides on top of the file settings.
    fn apply(&self, settings: &mut Settings) {
        if self.sync {
            settings.sync = true;
        }
        if self.no_sort {
            settings.repos.sort = false;
        }
        if self.no_skip_unwanted {
            settings.repos.skip_unwanted = false;
        }
        if let Some(size) = self.buffer_size {
            settings.channels.buffer_size = size;
        }
        if let Some(token) = self.auth_token.as_ref().filter(|t| !t.is_empty()) {
            settings.auth_token = token.clone();
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the cached repository catalog
    Catalog(commands::catalog::CatalogArgs),

    /// Inspect labels and preview filter expressions
    Labels(commands::labels::LabelsArgs),

    /// Manage git branches and commits
    Git(commands::git::GitArgs),

    /// Execute make across repositories
    Make(commands::make::MakeArgs),

    /// [!DANGEROUS!] Execute a shell command across repositories
    #[command(hide = true, alias = "sh")]
    Shell(commands::shell::ShellArgs),

    /// Manage pull requests using the Bitbucket v1 API
    Pr(commands::pr::PrArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.global.log_level);
        let global = &self.global;

        match self.command {
            Commands::Catalog(args) => commands::catalog::execute(args, &global.context()?),
            Commands::Labels(args) => commands::labels::execute(args, &global.context()?),
            Commands::Git(args) => commands::git::execute(args, &global.context()?),
            Commands::Make(args) => commands::make::execute(args, &global.context()?),
            Commands::Shell(args) => commands::shell::execute(args, &global.context()?),
            Commands::Pr(args) => commands::pr::execute(args, &global.context()?),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

impl GlobalArgs {
    /// Load, override and validate settings.
    fn context(&self) -> Result<Context> {
        if let Some(path) = &self.config {
            if !path.exists() {
                return Err(suggestions::config_not_found(path));
            }
        }

        let (mut settings, source) = Settings::discover(self.config.as_deref())?;
        match &source {
            Some(path) => debug!("Loaded configuration from {}", path.display()),
            None => debug!("No configuration file found, using defaults"),
        }

        self.apply(&mut settings);
        settings.validate()?;

        Ok(Context {
            settings,
            output: OutputConfig::from_env_and_flag(&self.color),
        })
    }
}

/// Initialise `env_logger`; `RUST_LOG` wins over `--log-level`.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level.to_lowercase());
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init();
}
