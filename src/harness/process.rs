//! Child-process implementation of the harness

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::{CliHarness, CliRequest, Invocation};
use crate::common::{Error, Result};

/// Runs the real CLI binary
///
/// `HOME` is set on each child so the CLI keeps its credentials inside the
/// scenario workspace. This process's own environment is never modified.
#[derive(Debug, Clone)]
pub struct ProcessHarness {
    program: PathBuf,
    /// Exported as `HOME`; also the default working directory
    home: PathBuf,
}

impl ProcessHarness {
    pub fn new(program: impl Into<PathBuf>, home: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            home: home.into(),
        }
    }
}

#[async_trait]
impl CliHarness for ProcessHarness {
    async fn invoke(&self, request: CliRequest) -> Result<Invocation> {
        let cwd = request.cwd.clone().unwrap_or_else(|| self.home.clone());
        tracing::debug!("$ {} {}", self.program.display(), request.display());

        let mut child = Command::new(&self.program)
            .args(&request.args)
            .current_dir(&cwd)
            .env("HOME", &self.home)
            .stdin(if request.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Spawn {
                program: self.program.display().to_string(),
                source: e,
            })?;

        if let Some(input) = &request.stdin {
            if let Some(mut stdin) = child.stdin.take() {
                // The CLI may exit before reading every prompt answer
                if let Err(e) = stdin.write_all(input.as_bytes()).await {
                    if e.kind() != std::io::ErrorKind::BrokenPipe {
                        return Err(e.into());
                    }
                }
            }
        }

        let output = child.wait_with_output().await?;
        let invocation = Invocation {
            command: request.command().to_string(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        tracing::debug!(
            command = %invocation.command,
            exit_code = ?invocation.exit_code,
            "CLI finished"
        );
        Ok(invocation)
    }
}
