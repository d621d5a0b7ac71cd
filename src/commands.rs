//! CLI command definitions
//!
//! Defines the clap commands for the smoke runner.

use clap::{Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::scenario::ScenarioKind;

#[derive(Subcommand)]
pub enum Commands {
    /// Run smoke scenarios against the live platform
    ///
    /// Credentials are read from GIGALIXIR_EMAIL and GIGALIXIR_PASSWORD.
    Run {
        /// Scenario to run
        #[arg(value_enum, default_value = "all")]
        scenario: ScenarioSelection,

        /// Configuration file (default: platform config dir)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Path or name of the gigalixir CLI
        #[arg(long)]
        cli: Option<PathBuf>,

        /// Keep the scenario workspace for inspection
        #[arg(long)]
        keep_workspace: bool,

        /// Also write logs to this file
        #[arg(long)]
        log_file: Option<PathBuf>,

        /// Write logs to the default log directory
        #[arg(long, conflicts_with = "log_file")]
        log: bool,

        /// Verbose output (debug logs, git output)
        #[arg(long, short)]
        verbose: bool,
    },

    /// List available scenarios
    Scenarios,

    /// Print the effective configuration
    Config {
        /// Configuration file (default: platform config dir)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScenarioSelection {
    Databases,
    Deploy,
    All,
}

impl ScenarioSelection {
    pub fn kinds(self) -> Vec<ScenarioKind> {
        match self {
            ScenarioSelection::Databases => vec![ScenarioKind::Databases],
            ScenarioSelection::Deploy => vec![ScenarioKind::Deploy],
            ScenarioSelection::All => ScenarioKind::all().to_vec(),
        }
    }
}
