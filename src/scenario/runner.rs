//! Scenario runner implementation
//!
//! Builds an isolated workspace, wires the real CLI, git and HTTP client
//! into a [`ScenarioContext`], and reports each step as it completes.

use std::path::PathBuf;
use std::sync::Arc;

use colored::Colorize;

use crate::common::config::Config;
use crate::common::{FailureKind, Result};
use crate::harness::{ProcessHarness, Workspace};
use crate::platform::{Credentials, GigalixirCli};
use crate::probe::{Endpoint, HttpEndpoint};
use crate::vcs::{GitCli, Vcs};

use super::{databases, deploy, ScenarioKind};

/// Result of a scenario run
#[derive(Debug)]
pub struct ScenarioReport {
    pub name: String,
    pub passed: bool,
    pub steps_run: usize,
    pub steps_total: usize,
    pub error: Option<String>,
    pub failure: Option<FailureKind>,
}

/// Everything a scenario talks to
pub struct ScenarioContext {
    pub config: Config,
    pub credentials: Credentials,
    pub cli: GigalixirCli,
    pub vcs: Arc<dyn Vcs>,
    pub endpoint: Arc<dyn Endpoint>,
    /// Scenario working directory (also the CLI's home)
    pub workdir: PathBuf,
}

/// Options for running against the live platform
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Resolved path of the gigalixir CLI
    pub cli_program: PathBuf,
    pub verbose: bool,
}

/// Prints completed steps and counts them
#[derive(Debug)]
pub struct StepLog {
    completed: usize,
    quiet: bool,
}

impl StepLog {
    pub fn new() -> Self {
        Self {
            completed: 0,
            quiet: false,
        }
    }

    /// A log that counts without printing
    pub fn quiet() -> Self {
        Self {
            completed: 0,
            quiet: true,
        }
    }

    pub fn pass(&mut self, description: impl AsRef<str>) {
        self.completed += 1;
        if !self.quiet {
            println!(
                "  {} Step {}: {}",
                "✓".green(),
                self.completed,
                description.as_ref().dimmed()
            );
        }
    }

    pub fn completed(&self) -> usize {
        self.completed
    }
}

impl Default for StepLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Run a scenario against the live platform
///
/// Errors that stop the scenario from starting (credentials, workspace) are
/// returned as `Err`; failures inside the scenario produce a failed report.
pub async fn run_scenario(
    kind: ScenarioKind,
    config: &Config,
    options: &RunOptions,
) -> Result<ScenarioReport> {
    let credentials = Credentials::from_env(&config.credentials)?;
    let workspace = Workspace::create(config.workspace.preserve)?;
    tracing::debug!("Workspace: {}", workspace.path().display());

    let harness = ProcessHarness::new(&options.cli_program, workspace.path());
    let ctx = ScenarioContext {
        config: config.clone(),
        credentials,
        cli: GigalixirCli::new(Arc::new(harness)),
        vcs: Arc::new(GitCli::new(workspace.path()).verbose(options.verbose)),
        endpoint: Arc::new(HttpEndpoint::new()),
        workdir: workspace.path().to_path_buf(),
    };

    Ok(run_with(kind, &ctx, &mut StepLog::new()).await)
}

/// Run a scenario with an already wired context
pub async fn run_with(
    kind: ScenarioKind,
    ctx: &ScenarioContext,
    steps: &mut StepLog,
) -> ScenarioReport {
    let steps_total = kind.steps_total();

    if !steps.quiet {
        println!(
            "\n{} {}",
            "Running Scenario:".blue().bold(),
            kind.name().white().bold()
        );
        println!("  {}", kind.description().dimmed());
        println!("\n{}", "Steps:".cyan());
    }

    let result = match kind {
        ScenarioKind::Databases => databases::run(ctx, steps).await,
        ScenarioKind::Deploy => deploy::run(ctx, steps).await,
    };

    match result {
        Ok(()) => {
            if !steps.quiet {
                println!(
                    "\n{} {}\n",
                    "✓".green().bold(),
                    "Scenario Passed".green().bold()
                );
            }
            ScenarioReport {
                name: kind.name().to_string(),
                passed: true,
                steps_run: steps.completed(),
                steps_total,
                error: None,
                failure: None,
            }
        }
        Err(e) => {
            let step_num = steps.completed() + 1;
            if !steps.quiet {
                println!("  {} Step {}: {}", "✗".red(), step_num, e);
            }
            tracing::error!(scenario = kind.name(), step = step_num, "{}", e);
            ScenarioReport {
                name: kind.name().to_string(),
                passed: false,
                steps_run: step_num,
                steps_total,
                error: Some(e.to_string()),
                failure: Some(e.kind()),
            }
        }
    }
}
