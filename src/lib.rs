//! # Batch Tool Library
//!
//! This library runs the same operations against many git repositories at
//! once and reports their output in a fixed, deterministic order. It is used
//! by the `batch-tool` command-line tool but can also drive batches from
//! other programs.
//!
//! ## Quick Example
//!
//! ```
//! use std::collections::BTreeMap;
//!
//! use batch_tool::catalog::{Catalog, Repository};
//! use batch_tool::labels::{parse_tokens, LabelIndex, Resolver};
//!
//! let catalog = Catalog::from_repositories([
//!     Repository::new("api", "PLAT").with_labels(["go"]),
//!     Repository::new("web", "PLAT").with_labels(["js"]),
//!     Repository::new("legacy", "PLAT").with_labels(["go", "deprecated"]),
//! ]);
//! let index = LabelIndex::build(&catalog, &BTreeMap::new());
//!
//! let unwanted = vec!["deprecated".to_string()];
//! let resolver = Resolver::new(&index, &unwanted);
//! let selected = resolver.resolve(&parse_tokens(&["~go", "web"]), true);
//!
//! assert_eq!(selected.into_iter().collect::<Vec<_>>(), vec!["api", "web"]);
//! ```
//!
//! ## Core Concepts
//!
//! - **Configuration (`config`, `defaults`)**: the `batch-tool.yaml` settings,
//!   their defaults and up-front validation.
//! - **Targets (`target`)**: where a repository lives locally and remotely.
//! - **Catalog (`catalog`)**: the known repositories and their labels, cached
//!   on disk with a time-to-live and refreshed from Bitbucket (`api`).
//! - **Labels (`labels`)**: the label index and the set algebra that turns
//!   filter expressions into repository names.
//! - **Batches (`batch`)**: tasks, per-repository chains and the engine that
//!   runs them concurrently while printing in order.
//! - **Operations (`git`, `pr`)**: the concrete tasks the commands run.
//!
//! ## Execution Flow
//!
//! 1.  **Selection**: expand aliases, resolve filter tokens, dedup and sort.
//! 2.  **Fan-out**: start one worker per repository, each with its own
//!     bounded output buffer.
//! 3.  **Chain**: each worker prints a header, clones the repository if
//!     needed and runs its tasks, stopping at the first failure.
//! 4.  **Fan-in**: buffers are printed one after another in selection order.

pub mod api;
pub mod batch;
pub mod catalog;
pub mod config;
pub mod defaults;
pub mod error;
pub mod git;
pub mod labels;
pub mod output;
pub mod pr;
pub mod suggestions;
pub mod target;

#[cfg(test)]
mod resolver_proptest;
