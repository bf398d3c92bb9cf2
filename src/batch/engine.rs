//! Fan-out / fan-in execution with ordered output.
//!
//! The engine starts one worker per target, gives each a bounded buffer, and
//! prints the buffers one after another in the order the targets were given.
//! Work runs concurrently; output never interleaves.
//!
//! ## Modes
//!
//! - [`Mode::Parallel`]: every worker starts immediately. A worker whose
//!   buffer fills before the printer reaches it blocks until its turn.
//! - [`Mode::Serial`]: one worker at a time. Each target's buffer is drained
//!   completely before the next worker starts.

use std::io::Write;
use std::thread;

use log::{debug, error};

use super::buffer::{bounded, Drain, Sink};
use super::chain::Chain;
use crate::config::Settings;
use crate::defaults;
use crate::error::Result;

/// How workers are scheduled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Parallel,
    Serial,
}

/// Runs a chain against many targets and prints their output in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Engine {
    capacity: usize,
    mode: Mode,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(defaults::BUFFER_SIZE, Mode::Parallel)
    }
}

impl Engine {
    /// `capacity` is the number of unread lines each target may buffer; it
    /// is raised to one if zero is given.
    pub fn new(capacity: usize, mode: Mode) -> Self {
        Self {
            capacity: capacity.max(1),
            mode,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let mode = if settings.sync {
            Mode::Serial
        } else {
            Mode::Parallel
        };
        Self::new(settings.channels.buffer_size, mode)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Run `chain` for each target, writing every line to `out`.
    pub fn run<W: Write>(&self, targets: &[String], chain: &Chain, out: &mut W) -> Result<()> {
        self.run_with(targets, |name, sink| chain.run(name, sink), out)
    }

    /// Run `worker` for each target, writing every line to `out`.
    ///
    /// The worker owns the sink it is handed and is expected to close it
    /// (dropping it counts). The only error returned is a failure to write
    /// to `out`; worker failures are whatever lines the worker chose to push.
    pub fn run_with<W, F>(&self, targets: &[String], worker: F, out: &mut W) -> Result<()>
    where
        W: Write,
        F: Fn(&str, Sink) + Sync,
    {
        debug!(
            "running {} target(s) in {:?} mode, buffer capacity {}",
            targets.len(),
            self.mode,
            self.capacity
        );

        match self.mode {
            Mode::Parallel => self.run_parallel(targets, &worker, out),
            Mode::Serial => self.run_serial(targets, &worker, out),
        }
    }

    fn run_parallel<W, F>(&self, targets: &[String], worker: &F, out: &mut W) -> Result<()>
    where
        W: Write,
        F: Fn(&str, Sink) + Sync,
    {
        thread::scope(|scope| -> Result<()> {
            let mut drains = Vec::with_capacity(targets.len());
            let mut handles = Vec::with_capacity(targets.len());

            for name in targets {
                let (sink, drain) = bounded(name, self.capacity);
                let handle = thread::Builder::new()
                    .name(format!("batch:{}", name))
                    .spawn_scoped(scope, move || worker(name.as_str(), sink))?;
                debug!("{}: worker started", name);
                drains.push(drain);
                handles.push(handle);
            }

            // Returning early drops the remaining drains, which makes every
            // blocked worker's next push fail so the scope can join it.
            for (name, drain) in targets.iter().zip(drains) {
                print_section(name, drain, out)?;
            }

            for (name, handle) in targets.iter().zip(handles) {
                if handle.join().is_err() {
                    error!("{}: worker panicked", name);
                }
            }

            Ok(())
        })
    }

    fn run_serial<W, F>(&self, targets: &[String], worker: &F, out: &mut W) -> Result<()>
    where
        W: Write,
        F: Fn(&str, Sink) + Sync,
    {
        for name in targets {
            thread::scope(|scope| -> Result<()> {
                let (sink, drain) = bounded(name, self.capacity);
                let handle = thread::Builder::new()
                    .name(format!("batch:{}", name))
                    .spawn_scoped(scope, move || worker(name.as_str(), sink))?;
                debug!("{}: worker started", name);

                let printed = print_section(name, drain, out);

                if handle.join().is_err() {
                    error!("{}: worker panicked", name);
                }

                printed
            })?;
        }

        Ok(())
    }
}

fn print_section<W: Write>(name: &str, drain: Drain, out: &mut W) -> Result<()> {
    let mut lines = 0usize;
    for line in drain {
        writeln!(out, "{}", line)?;
        lines += 1;
    }
    out.flush()?;
    debug!("{}: printed {} line(s)", name, lines);
    Ok(())
}
