//! gigalixir-smoke - end-to-end smoke tests for the gigalixir CLI
//!
//! This library drives the external `gigalixir` command-line client through
//! complete platform workflows, polling remote state until it converges.

pub mod cli;
pub mod commands;
pub mod common;
pub mod harness;
pub mod platform;
pub mod poll;
pub mod probe;
pub mod scenario;
pub mod vcs;

// Re-export commonly used types for tests
pub use common::{Error, FailureKind, Result};
pub use scenario::{ScenarioContext, ScenarioKind, ScenarioReport};
