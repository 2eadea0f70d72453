//! Runs `git` as an external process and classifies its output.
//!
//! Failure detection is textual: any captured line containing `fatal` or
//! `error` (any case) aborts the operation, whatever the exit code says.
//! The exit code is still carried along so a success-with-matches case can
//! be told apart from a real failure.

pub mod remote;

use std::process::Command;

use thiserror::Error;
use tracing::{debug, instrument, warn};

const FAILURE_MARKERS: [&str; 2] = ["fatal", "error"];

#[derive(Debug, Error)]
pub enum GitError {
    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Script aborted ! `{command}` reported:\n{}", .flagged.join("\n"))]
    Aborted {
        command: String,
        exit_code: Option<i32>,
        flagged: Vec<String>,
    },
}

impl GitError {
    /// True when the output matched a failure marker but git itself
    /// exited with status 0.
    pub fn is_suspected_false_positive(&self) -> bool {
        matches!(self, GitError::Aborted { exit_code: Some(0), .. })
    }
}

/// Raw outcome of one external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Exit code, `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    /// Captured stdout lines followed by stderr lines.
    pub lines: Vec<String>,
}

impl CommandResult {
    pub fn new(exit_code: Option<i32>, lines: Vec<String>) -> Self {
        Self { exit_code, lines }
    }

    pub fn exited_cleanly(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Lines containing one of the failure markers.
    pub fn flagged_lines(&self) -> Vec<String> {
        self.lines
            .iter()
            .filter(|line| {
                let lower = line.to_lowercase();
                FAILURE_MARKERS.iter().any(|marker| lower.contains(marker))
            })
            .cloned()
            .collect()
    }
}

/// Executes one version-control command with the given arguments.
pub trait CommandRunner {
    /// Shell-free rendering of the command, used in messages.
    fn describe(&self, args: &[&str]) -> String;

    fn run(&self, args: &[&str]) -> Result<CommandResult, GitError>;
}

/// Runs the configured git binary in the current working directory.
#[derive(Debug, Clone)]
pub struct SystemGit {
    program: String,
}

impl SystemGit {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl CommandRunner for SystemGit {
    fn describe(&self, args: &[&str]) -> String {
        std::iter::once(self.program.as_str())
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn run(&self, args: &[&str]) -> Result<CommandResult, GitError> {
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|source| GitError::Spawn {
                command: self.describe(args),
                source,
            })?;

        let lines = String::from_utf8_lossy(&output.stdout)
            .lines()
            .chain(String::from_utf8_lossy(&output.stderr).lines())
            .map(str::to_string)
            .collect();

        Ok(CommandResult::new(output.status.code(), lines))
    }
}

/// Command executor: runs through a [`CommandRunner`], echoes output on
/// request and turns flagged output into [`GitError::Aborted`].
#[derive(Debug)]
pub struct Git<R> {
    runner: R,
}

impl<R: CommandRunner> Git<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    #[cfg(test)]
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Run without classifying the output.
    #[instrument(skip(self))]
    pub fn capture(&self, args: &[&str]) -> Result<CommandResult, GitError> {
        let result = self.runner.run(args)?;
        debug!(exit_code = ?result.exit_code, lines = result.lines.len(), "command finished");
        Ok(result)
    }

    /// Run, optionally echo the captured lines, and abort if any line
    /// looks like a failure.
    pub fn exec(&self, args: &[&str], echo: bool) -> Result<Vec<String>, GitError> {
        let result = self.capture(args)?;

        if echo {
            for line in &result.lines {
                println!("{line}");
            }
        }

        let flagged = result.flagged_lines();
        if flagged.is_empty() {
            return Ok(result.lines);
        }

        let command = self.runner.describe(args);
        if result.exited_cleanly() {
            warn!(%command, "output matched a failure marker although git exited with 0");
        }

        Err(GitError::Aborted {
            command,
            exit_code: result.exit_code,
            flagged,
        })
    }
}
