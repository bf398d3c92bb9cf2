//! # Batch Execution
//!
//! Runs the same chain of tasks against many repositories at once while
//! printing their output in a fixed order.
//!
//! ## Key Components
//!
//! - **[`arguments`]**: alias expansion, filter resolution, dedup and sort of
//!   the target list.
//! - **[`buffer`]**: bounded single-writer, single-reader line queues.
//! - **[`task`]**: the [`Task`] trait and [`Exec`], which streams a
//!   subprocess's output.
//! - **[`chain`]**: a repository's header, clone preamble, tasks, error line
//!   and trailing blank line.
//! - **[`engine`]**: one worker per target, drained in target order.
//!
//! ## Example
//!
//! ```
//! use batch_tool::batch::{Chain, Engine, Mode, Sink};
//! use batch_tool::config::Settings;
//! use batch_tool::target::Target;
//!
//! let chain = Chain::new(&Settings::default())
//!     .without_preamble()
//!     .then(|target: &Target, sink: &Sink| sink.push(format!("hello {}", target.name)));
//!
//! let mut out = Vec::new();
//! let targets = vec!["b".to_string(), "a".to_string()];
//! Engine::new(10, Mode::Parallel).run(&targets, &chain, &mut out).unwrap();
//!
//! let text = String::from_utf8(out).unwrap();
//! assert_eq!(text, "------ b ------\nhello b\n\n------ a ------\nhello a\n\n");
//! ```

pub mod arguments;
pub mod buffer;
pub mod chain;
pub mod engine;
pub mod task;

pub use arguments::select_targets;
pub use buffer::{bounded, Drain, Sink};
pub use chain::{Chain, CloneIfMissing, Preamble};
pub use engine::{Engine, Mode};
pub use task::{Exec, Task};
