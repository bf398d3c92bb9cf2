//! Git tasks.
//!
//! Everything here shells out to the system `git`, so SSH keys, credential
//! helpers and `~/.gitconfig` all apply exactly as they do on the command
//! line. Long-running read commands ([`status`], [`diff`], [`clone`]) stream
//! their output through [`Exec`]; the mutating tasks run short git commands
//! one after another and forward what each prints.

use std::fs;
use std::path::Path;
use std::process::Command;

use log::debug;

use crate::batch::{Exec, Sink, Task};
use crate::error::{Error, Result};
use crate::target::Target;

/// Clone `target` into its checkout path, streaming clone progress.
pub fn clone(target: &Target, sink: &Sink) -> Result<()> {
    let parent = target.path.parent().ok_or_else(|| Error::NotFound {
        what: format!("no parent directory for {}", target.path.display()),
    })?;
    fs::create_dir_all(parent)?;

    let path = target.path.to_string_lossy().into_owned();
    Exec::new("git", ["clone", "--progress", target.clone_url.as_str(), path.as_str()])
        .stream_in(parent, sink)
}

/// `git status -sb`, coloured.
pub fn status() -> Exec {
    Exec::new("git", ["-c", "color.status=always", "status", "-sb"])
}

/// `git diff`.
pub fn diff() -> Exec {
    Exec::new("git", ["diff"])
}

/// Run git in `dir` and return its stdout.
///
/// A non-zero exit becomes [`Error::GitCommand`] carrying git's stderr.
pub fn run_git(dir: &Path, target: &str, args: &[&str]) -> Result<String> {
    debug!("{}: git {}", target, args.join(" "));

    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|e| Error::GitCommand {
            command: args.join(" "),
            target: target.to_string(),
            stderr: e.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(Error::GitCommand {
            command: args.join(" "),
            target: target.to_string(),
            stderr: if stderr.is_empty() {
                output.status.to_string()
            } else {
                stderr
            },
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// The branch currently checked out in `target`.
pub fn current_branch(target: &Target) -> Result<String> {
    let out = run_git(&target.path, &target.raw, &["rev-parse", "--abbrev-ref", "HEAD"])?;
    Ok(out.trim().to_string())
}

/// Refuses to continue while the repository is on the source branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBranchGuard {
    pub source: String,
}

impl SourceBranchGuard {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

impl Task for SourceBranchGuard {
    fn run(&self, target: &Target, _sink: &Sink) -> Result<()> {
        let branch = current_branch(target)?;
        if branch == self.source.trim() {
            return Err(Error::OnSourceBranch { branch });
        }
        Ok(())
    }
}

/// Check out the source branch and pull it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    pub source: String,
}

impl Update {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

impl Task for Update {
    fn run(&self, target: &Target, sink: &Sink) -> Result<()> {
        run_git(&target.path, &target.raw, &["checkout", &self.source])?;
        let pulled = run_git(&target.path, &target.raw, &["pull"])?;
        sink.push_text(&pulled)
    }
}

/// Check out `branch`, creating it and its upstream if it does not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkout {
    pub branch: String,
}

impl Checkout {
    pub fn new(branch: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
        }
    }
}

impl Task for Checkout {
    fn run(&self, target: &Target, sink: &Sink) -> Result<()> {
        let dir = &target.path;

        match run_git(dir, &target.raw, &["checkout", &self.branch]) {
            Ok(out) => sink.push_text(&out),
            Err(e) => {
                debug!("{}: {}; creating branch {}", target, e, self.branch);
                let created = run_git(dir, &target.raw, &["checkout", "-b", &self.branch])?;
                sink.push_text(&created)?;
                let pushed = run_git(dir, &target.raw, &["push", "-u", "origin", &self.branch])?;
                sink.push_text(&pushed)
            }
        }
    }
}

/// Stage everything, commit and push.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Commit {
    pub message: Option<String>,
    /// Amend the latest commit and force-push.
    pub amend: bool,
}

impl Commit {
    /// The arguments passed to `git commit`.
    pub fn commit_args(&self) -> Vec<&str> {
        let mut args = vec!["commit"];
        let message = self.message.as_deref().filter(|m| !m.is_empty());

        if let Some(message) = message {
            args.extend(["-m", message]);
        }

        if self.amend {
            args.extend(["--amend", "--reset-author"]);
            if message.is_none() {
                args.push("--no-edit");
            }
        }

        args
    }

    pub fn push_args(&self) -> Vec<&str> {
        if self.amend {
            vec!["push", "-f"]
        } else {
            vec!["push"]
        }
    }
}

impl Task for Commit {
    fn run(&self, target: &Target, sink: &Sink) -> Result<()> {
        let dir = &target.path;

        run_git(dir, &target.raw, &["add", "."])?;
        let committed = run_git(dir, &target.raw, &self.commit_args())?;
        sink.push_text(&committed)?;
        let pushed = run_git(dir, &target.raw, &self.push_args())?;
        sink.push_text(&pushed)
    }
}
