//! CLI command handling
//!
//! Dispatches CLI commands and prints the run summary.

use std::path::Path;

use colored::Colorize;

use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::scenario::{run_scenario, RunOptions, ScenarioKind, ScenarioReport};

/// Dispatch a CLI command
pub async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Run {
            scenario,
            config,
            cli,
            keep_workspace,
            verbose,
            ..
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(cli) = cli {
                config.cli.program = cli;
            }
            if keep_workspace {
                config.workspace.preserve = true;
            }

            let options = RunOptions {
                cli_program: config.resolve_cli()?,
                verbose,
            };
            tracing::debug!("Using CLI at {}", options.cli_program.display());

            let mut reports = Vec::new();
            for kind in scenario.kinds() {
                reports.push(run_scenario(kind, &config, &options).await?);
            }

            print_summary(&reports);

            let failed = reports.iter().filter(|r| !r.passed).count();
            if failed > 0 {
                return Err(Error::ScenariosFailed {
                    failed,
                    total: reports.len(),
                });
            }
            Ok(())
        }

        Commands::Scenarios => {
            for kind in ScenarioKind::all() {
                println!(
                    "{:<10} {} ({} steps)",
                    kind.name().bold(),
                    kind.description(),
                    kind.steps_total()
                );
            }
            Ok(())
        }

        Commands::Config { config } => {
            let config = load_config(config.as_deref())?;
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

fn print_summary(reports: &[ScenarioReport]) {
    println!("{}", "Summary:".cyan());
    for report in reports {
        if report.passed {
            println!(
                "  {} {} ({}/{} steps)",
                "✓".green(),
                report.name,
                report.steps_run,
                report.steps_total
            );
        } else {
            println!(
                "  {} {} failed at step {}/{}: {}",
                "✗".red(),
                report.name,
                report.steps_run,
                report.steps_total,
                report.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
}
