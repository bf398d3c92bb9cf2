//! Per-repository task chains.
//!
//! A [`Chain`] is the complete unit of work for one repository:
//!
//! 1. push the section header,
//! 2. run the preamble (by default: clone the repository if it has no local
//!    checkout),
//! 3. run each task in order, stopping at the first failure,
//! 4. push `ERROR: <reason>` if anything failed,
//! 5. push a blank separator line and close the sink.
//!
//! A chain never returns an error and never lets a task's panic escape;
//! every failure becomes a line in that repository's own section.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use log::{debug, warn};

use super::buffer::Sink;
use super::task::Task;
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::git;
use crate::output::OutputConfig;
use crate::target::Target;

/// Work performed before a chain's tasks.
pub trait Preamble: Send + Sync {
    fn ensure(&self, target: &Target, sink: &Sink) -> Result<()>;
}

/// Clone the repository when its checkout directory does not exist.
#[derive(Debug, Clone, Copy, Default)]
pub struct CloneIfMissing;

impl Preamble for CloneIfMissing {
    fn ensure(&self, target: &Target, sink: &Sink) -> Result<()> {
        if target.is_present() {
            return Ok(());
        }

        sink.push("Repository not found, cloning...")?;
        git::clone(target, sink)
    }
}

/// Ordered tasks plus preamble, run once per repository.
pub struct Chain {
    settings: Settings,
    preamble: Option<Box<dyn Preamble>>,
    tasks: Vec<Box<dyn Task>>,
    output: OutputConfig,
}

impl Chain {
    /// An empty chain with the clone-if-missing preamble and plain output.
    pub fn new(settings: &Settings) -> Self {
        Self {
            settings: settings.clone(),
            preamble: Some(Box::new(CloneIfMissing)),
            tasks: Vec::new(),
            output: OutputConfig::without_color(),
        }
    }

    /// Append a task.
    pub fn then(mut self, task: impl Task + 'static) -> Self {
        self.tasks.push(Box::new(task));
        self
    }

    /// Replace the preamble.
    pub fn with_preamble(mut self, preamble: impl Preamble + 'static) -> Self {
        self.preamble = Some(Box::new(preamble));
        self
    }

    /// Run tasks against the repository as found, without a preamble.
    pub fn without_preamble(mut self) -> Self {
        self.preamble = None;
        self
    }

    pub fn with_output(mut self, output: OutputConfig) -> Self {
        self.output = output;
        self
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Run the chain for `name`, writing into and finally closing `sink`.
    pub fn run(&self, name: &str, mut sink: Sink) {
        let target = Target::parse(name, &self.settings);

        // A failed push means the reader is gone; the remaining pushes are
        // attempted anyway so that the chain always reaches close().
        let _ = sink.push(self.output.header(name));

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.execute(&target, &sink)));
        let failure = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(payload) => Some(format!("task panicked: {}", panic_message(payload.as_ref()))),
        };

        if let Some(reason) = failure {
            debug!("{}: {}", name, reason);
            let _ = sink.push(self.output.error(&reason));
        }

        let _ = sink.push("");

        if let Err(e) = sink.close() {
            warn!("{}", e);
        }
    }

    fn execute(&self, target: &Target, sink: &Sink) -> Result<()> {
        if target.name.is_empty() {
            return Err(Error::InvalidTarget {
                raw: target.raw.clone(),
            });
        }

        if let Some(preamble) = &self.preamble {
            preamble.ensure(target, sink)?;
        }

        for task in &self.tasks {
            task.run(target, sink)?;
        }

        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown cause")
}
