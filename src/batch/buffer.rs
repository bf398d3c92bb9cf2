//! Bounded per-repository output buffers.
//!
//! Each repository gets one buffer with exactly one writer (the [`Sink`],
//! owned by the worker running that repository's chain) and one reader (the
//! [`Drain`], owned by the engine's printing loop).
//!
//! - [`Sink::push`] blocks while the buffer is full.
//! - [`Sink::close`] may be called once; a second call is an error. Dropping
//!   the sink also closes it.
//! - Iterating a [`Drain`] blocks until a line is available and ends once the
//!   sink is closed and every buffered line has been read.

use std::sync::mpsc::{self, Receiver, SyncSender};

use crate::error::{Error, Result};

/// Create a buffer holding at most `capacity` unread lines.
pub fn bounded(target: &str, capacity: usize) -> (Sink, Drain) {
    let (sender, receiver) = mpsc::sync_channel(capacity);
    (
        Sink {
            target: target.to_string(),
            sender: Some(sender),
        },
        Drain { receiver },
    )
}

/// Writing side of a repository's output buffer.
#[derive(Debug)]
pub struct Sink {
    target: String,
    sender: Option<SyncSender<String>>,
}

impl Sink {
    /// The repository this buffer belongs to.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Append one line, blocking while the buffer is full.
    pub fn push(&self, line: impl Into<String>) -> Result<()> {
        let sender = self.sender.as_ref().ok_or_else(|| Error::SinkAlreadyClosed {
            target: self.target.clone(),
        })?;

        sender.send(line.into()).map_err(|_| Error::OutputClosed {
            target: self.target.clone(),
        })
    }

    /// Append every line of `text`.
    pub fn push_text(&self, text: &str) -> Result<()> {
        for line in text.lines() {
            self.push(line)?;
        }
        Ok(())
    }

    /// Signal that no more lines will follow.
    pub fn close(&mut self) -> Result<()> {
        match self.sender.take() {
            Some(sender) => {
                drop(sender);
                Ok(())
            }
            None => Err(Error::SinkAlreadyClosed {
                target: self.target.clone(),
            }),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_none()
    }
}

/// Reading side of a repository's output buffer.
#[derive(Debug)]
pub struct Drain {
    receiver: Receiver<String>,
}

impl Iterator for Drain {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.receiver.recv().ok()
    }
}
