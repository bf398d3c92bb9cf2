//! Atomic units of work on one repository.
//!
//! A [`Task`] receives the located repository and a shared reference to the
//! repository's output [`Sink`]. It may push any number of lines but cannot
//! close the sink; closing belongs to the chain that owns it.
//!
//! [`Exec`] covers most commands: it runs an external program in the
//! repository's checkout and forwards stdout and stderr line by line while
//! the program is still running.

use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command, Stdio};

use log::debug;

use super::buffer::Sink;
use crate::error::{Error, Result};
use crate::target::Target;

/// One step of a chain.
pub trait Task: Send + Sync {
    fn run(&self, target: &Target, sink: &Sink) -> Result<()>;
}

impl<F> Task for F
where
    F: Fn(&Target, &Sink) -> Result<()> + Send + Sync,
{
    fn run(&self, target: &Target, sink: &Sink) -> Result<()> {
        self(target, sink)
    }
}

/// Runs an external program inside the repository checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exec {
    program: String,
    args: Vec<String>,
}

impl Exec {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// The command line as shown in error messages.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run in `dir`, streaming the program's output into `sink`.
    ///
    /// stdout and stderr share one pipe, so lines arrive in the order the
    /// program wrote them. Fails when the program cannot be started, when
    /// the sink stops accepting lines, or when the program exits
    /// unsuccessfully.
    pub fn stream_in(&self, dir: &Path, sink: &Sink) -> Result<()> {
        debug!("{}: running {} in {}", sink.target(), self.command_line(), dir.display());

        let (reader, writer) = os_pipe::pipe()?;
        let errors = writer.try_clone()?;

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(writer)
            .stderr(errors);

        let spawned = command.spawn();
        // the command still holds both write ends; the reader only sees EOF
        // once they are closed
        drop(command);

        let mut child = spawned.map_err(|e| Error::Command {
            command: self.command_line(),
            message: e.to_string(),
        })?;

        let forwarded = forward(reader, sink);
        if forwarded.is_err() {
            let _ = child.kill();
        }

        let status = child.wait()?;
        forwarded?;

        if !status.success() {
            return Err(Error::Command {
                command: self.command_line(),
                message: status.to_string(),
            });
        }

        Ok(())
    }
}

impl Task for Exec {
    fn run(&self, target: &Target, sink: &Sink) -> Result<()> {
        self.stream_in(&target.path, sink)
    }
}

fn forward(pipe: impl Read, sink: &Sink) -> Result<()> {
    let mut reader = BufReader::new(pipe);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }

        let line = String::from_utf8_lossy(&buf);
        sink.push(line.trim_end_matches(['\n', '\r']))?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::buffer::bounded;
    use crate::config::Settings;

    fn target_in(dir: &Path) -> Target {
        let mut settings = Settings::default();
        settings.workspace = dir.to_path_buf();
        settings.git.host = "h".to_string();
        settings.git.project = "p".to_string();
        let target = Target::parse("repo", &settings);
        std::fs::create_dir_all(&target.path).unwrap();
        target
    }

    #[test]
    fn test_command_line() {
        let exec = Exec::new("git", ["status", "-sb"]);
        assert_eq!(exec.command_line(), "git status -sb");
    }

    #[test]
    fn test_closure_is_a_task() {
        let temp = tempfile::TempDir::new().unwrap();
        let target = target_in(temp.path());
        let (sink, drain) = bounded("repo", 4);

        let task = |target: &Target, sink: &Sink| sink.push(format!("hello {}", target.name));
        task.run(&target, &sink).unwrap();
        drop(sink);

        assert_eq!(drain.collect::<Vec<_>>(), vec!["hello repo"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_exec_streams_stdout_and_stderr() {
        let temp = tempfile::TempDir::new().unwrap();
        let target = target_in(temp.path());
        let (sink, drain) = bounded("repo", 16);

        Exec::new("sh", ["-c", "echo out; echo err >&2; pwd"])
            .run(&target, &sink)
            .unwrap();
        drop(sink);

        let lines: Vec<String> = drain.collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[..2], ["out", "err"]);
        assert!(lines[2].ends_with("h/p/repo"));
    }

    #[cfg(unix)]
    #[test]
    fn test_exec_keeps_interleaved_stdout_and_stderr_in_order() {
        let temp = tempfile::TempDir::new().unwrap();
        let target = target_in(temp.path());

        for _ in 0..50 {
            let (sink, drain) = bounded("repo", 16);
            Exec::new("sh", ["-c", "echo 1; echo 2 >&2; echo 3; echo 4 >&2"])
                .run(&target, &sink)
                .unwrap();
            drop(sink);

            assert_eq!(drain.collect::<Vec<_>>(), vec!["1", "2", "3", "4"]);
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_exec_failure_reports_status_after_output() {
        let temp = tempfile::TempDir::new().unwrap();
        let target = target_in(temp.path());
        let (sink, drain) = bounded("repo", 16);

        let err = Exec::new("sh", ["-c", "echo partial; exit 3"])
            .run(&target, &sink)
            .unwrap_err();
        drop(sink);

        assert!(matches!(err, Error::Command { .. }));
        assert!(err.to_string().contains('3'));
        assert_eq!(drain.collect::<Vec<_>>(), vec!["partial"]);
    }

    #[test]
    fn test_exec_missing_program() {
        let temp = tempfile::TempDir::new().unwrap();
        let target = target_in(temp.path());
        let (sink, _drain) = bounded("repo", 1);

        let err = Exec::new("definitely-not-a-real-program-xyz", Vec::<String>::new())
            .run(&target, &sink)
            .unwrap_err();
        assert!(err.to_string().starts_with("definitely-not-a-real-program-xyz"));
    }

    #[cfg(unix)]
    #[test]
    fn test_exec_stops_when_reader_is_gone() {
        let temp = tempfile::TempDir::new().unwrap();
        let target = target_in(temp.path());
        let (sink, drain) = bounded("repo", 1);
        drop(drain);

        let err = Exec::new("sh", ["-c", "echo one; echo two"])
            .run(&target, &sink)
            .unwrap_err();
        assert!(matches!(err, Error::OutputClosed { .. }));
    }
}
