//! Command-invocation harness
//!
//! Runs the gigalixir CLI and captures what it printed. Scenarios only talk
//! to the [`CliHarness`] trait so they can be driven by a scripted fake.

mod process;
mod workspace;

pub use process::ProcessHarness;
pub use workspace::Workspace;

use std::path::PathBuf;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::common::{Error, Result};

/// One CLI invocation to perform
#[derive(Debug, Clone, PartialEq)]
pub struct CliRequest {
    pub args: Vec<String>,
    /// Text written to the CLI's stdin (prompt answers)
    pub stdin: Option<String>,
    /// Working directory; the harness default applies when unset
    pub cwd: Option<PathBuf>,
}

impl CliRequest {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            stdin: None,
            cwd: None,
        }
    }

    pub fn input(mut self, text: impl Into<String>) -> Self {
        self.stdin = Some(text.into());
        self
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Subcommand name, used in log lines and errors
    pub fn command(&self) -> &str {
        self.args.first().map(String::as_str).unwrap_or("")
    }

    /// Arguments joined for display
    pub fn display(&self) -> String {
        self.args.join(" ")
    }
}

/// Captured result of a finished invocation
#[derive(Debug, Clone)]
pub struct Invocation {
    pub command: String,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl Invocation {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Fail with `CommandFailed` unless the CLI exited with code 0
    pub fn ensure_success(self) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(Error::command_failed(
                &self.command,
                self.exit_code,
                &self.stderr,
            ))
        }
    }

    /// Decode stdout as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.stdout).map_err(|e| {
            Error::unexpected_output(
                &self.command,
                format!("invalid JSON ({}): {}", e, self.stdout.trim()),
            )
        })
    }

    pub fn trimmed_stdout(&self) -> &str {
        self.stdout.trim_end()
    }
}

/// Something that can run the gigalixir CLI
#[async_trait]
pub trait CliHarness: Send + Sync {
    async fn invoke(&self, request: CliRequest) -> Result<Invocation>;
}
