//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `batch-tool` command-line tool. Each subcommand is defined in its own file.
//!
//! ## Structure
//!
//! Each command module typically contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and the shared
//!   [`Context`] and performs the command's logic.
//!
//! Commands that run against repositories build a [`Chain`] and hand it to
//! [`Context::run`], which selects the targets and drives the engine.

pub mod catalog;
pub mod completions;
pub mod git;
pub mod labels;
pub mod make;
pub mod pr;
pub mod shell;

use std::io;

use anyhow::Result;
use log::warn;

use batch_tool::batch::{select_targets, Chain, Engine};
use batch_tool::catalog::{Catalog, CatalogStore};
use batch_tool::config::{Setting, Settings};
use batch_tool::error::Error;
use batch_tool::labels::LabelIndex;
use batch_tool::output::OutputConfig;
use batch_tool::suggestions;

/// Settings and output preferences shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub settings: Settings,
    pub output: OutputConfig,
}

impl Context {
    /// Fail before any work starts if a required setting is empty.
    pub fn require(&self, settings: &[Setting]) -> Result<()> {
        self.settings.require(settings).map_err(|e| match e {
            Error::MissingSetting { key } => suggestions::missing_setting(&key),
            other => other.into(),
        })
    }

    /// A catalog store for the configured host and project.
    pub fn catalog_store(&self) -> Result<CatalogStore> {
        Ok(CatalogStore::from_settings(&self.settings)?)
    }

    /// Load the catalog, reporting a failure and continuing with an empty
    /// catalog.
    pub fn load_catalog(&self) -> Catalog {
        let loaded = self.catalog_store().and_then(|mut store| {
            let catalog = store.load().cloned();
            catalog.map_err(|e| suggestions::catalog_unavailable(&e))
        });

        match loaded {
            Ok(catalog) => catalog,
            Err(e) => {
                let reason = e.to_string();
                let first = reason.lines().next().unwrap_or_default();
                eprintln!("{}", self.output.error(first));
                warn!("{:#}", e);
                Catalog::default()
            }
        }
    }

    /// The label index over the catalog and the configured aliases.
    pub fn label_index(&self) -> LabelIndex {
        LabelIndex::build(&self.load_catalog(), &self.settings.repos.aliases)
    }

    /// The final target list for command arguments.
    pub fn select(&self, args: &[String]) -> Vec<String> {
        select_targets(args, &self.settings, || self.label_index())
    }

    /// A chain with this context's settings and output styling.
    pub fn chain(&self) -> Chain {
        Chain::new(&self.settings).with_output(self.output)
    }

    /// Run `chain` against the targets selected by `args`.
    pub fn run(&self, args: &[String], chain: &Chain) -> Result<()> {
        let targets = self.select(args);
        self.run_targets(&targets, chain)
    }

    /// Run `chain` against an already selected target list.
    pub fn run_targets(&self, targets: &[String], chain: &Chain) -> Result<()> {
        if targets.is_empty() {
            println!("No repositories selected");
            return Ok(());
        }

        let stdout = io::stdout();
        let mut out = stdout.lock();
        Engine::from_settings(&self.settings).run(targets, chain, &mut out)?;
        Ok(())
    }
}
