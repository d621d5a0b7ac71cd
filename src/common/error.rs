//! Error types for the smoke runner
//!
//! Messages are written for the operator watching a run: they name the
//! command or resource involved and, where the remote platform may be left
//! in a half-provisioned state, say what has to be cleaned up.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the smoke runner
#[derive(Error, Debug)]
pub enum Error {
    // === Precondition Errors ===
    #[error("Precondition violated: {0}")]
    Precondition(String),

    // === CLI Errors ===
    #[error("gigalixir CLI not found: {0}")]
    CliNotFound(String),

    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Command '{command}' exited with code {code:?}: {stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Unexpected output from '{command}': {message}")]
    UnexpectedOutput { command: String, message: String },

    #[error("Shell command '{command}' failed with exit code {code:?}")]
    ShellCommand { command: String, code: Option<i32> },

    // === Assertion Errors ===
    #[error("Assertion failed: {0}")]
    Assertion(String),

    // === Convergence Errors ===
    #[error("Timed out waiting for {what} after {attempts} attempts. Clean up manually: {cleanup}")]
    ConvergenceTimeout {
        what: String,
        attempts: u32,
        cleanup: String,
    },

    // === Environment Errors ===
    #[error("Missing credential: environment variable {0} is not set")]
    MissingCredential(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Transport Errors ===
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Run Errors ===
    #[error("{failed} of {total} scenarios failed")]
    ScenariosFailed { failed: usize, total: usize },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of why a scenario stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The account was not in the state the scenario requires
    Precondition,
    /// A command failed or its output did not match expectations
    CommandFailure,
    /// A polling loop ran out of attempts
    ConvergenceTimeout,
    /// The local environment is unusable (credentials, binaries, config)
    Environment,
}

impl Error {
    /// Create a command failed error
    pub fn command_failed(command: &str, code: Option<i32>, stderr: &str) -> Self {
        Self::CommandFailed {
            command: command.to_string(),
            code,
            stderr: stderr.trim().to_string(),
        }
    }

    /// Create an unexpected output error
    pub fn unexpected_output(command: &str, message: impl Into<String>) -> Self {
        Self::UnexpectedOutput {
            command: command.to_string(),
            message: message.into(),
        }
    }

    /// Create a convergence timeout error
    pub fn convergence_timeout(what: &str, attempts: u32, cleanup: &str) -> Self {
        Self::ConvergenceTimeout {
            what: what.to_string(),
            attempts,
            cleanup: cleanup.to_string(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Error::Precondition(_) => FailureKind::Precondition,
            Error::ConvergenceTimeout { .. } => FailureKind::ConvergenceTimeout,
            Error::CommandFailed { .. }
            | Error::UnexpectedOutput { .. }
            | Error::ShellCommand { .. }
            | Error::Assertion(_)
            | Error::ScenariosFailed { .. }
            | Error::Http(_)
            | Error::Json(_) => FailureKind::CommandFailure,
            Error::CliNotFound(_)
            | Error::Spawn { .. }
            | Error::MissingCredential(_)
            | Error::Config(_)
            | Error::ConfigParse(_)
            | Error::FileRead { .. }
            | Error::Io(_)
            | Error::Internal(_) => FailureKind::Environment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kinds() {
        assert_eq!(
            Error::Precondition("dirty".into()).kind(),
            FailureKind::Precondition
        );
        assert_eq!(
            Error::command_failed("apps", Some(1), "boom").kind(),
            FailureKind::CommandFailure
        );
        assert_eq!(
            Error::convergence_timeout("database", 30, "delete it").kind(),
            FailureKind::ConvergenceTimeout
        );
        assert_eq!(
            Error::MissingCredential("GIGALIXIR_EMAIL".into()).kind(),
            FailureKind::Environment
        );
    }

    #[test]
    fn test_command_failed_trims_stderr() {
        let err = Error::command_failed("apps", Some(2), "  unauthorized\n");
        assert_eq!(
            err.to_string(),
            "Command 'apps' exited with code Some(2): unauthorized"
        );
    }
}
