//! gigalixir-smoke - end-to-end smoke tests for the gigalixir CLI
//!
//! Drives the real CLI against the live platform: logs in, provisions and
//! deletes a database, deploys and hot-upgrades an app, then scales it down.

use clap::Parser;
use gigalixir_smoke::commands::Commands;
use gigalixir_smoke::common::{logging, paths};
use gigalixir_smoke::cli;

#[derive(Parser)]
#[command(name = "gigalixir-smoke", about = "End-to-end smoke tests for the gigalixir CLI")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging; the guard flushes the log file on exit
    let guard = match &cli.command {
        Commands::Run {
            verbose,
            log_file,
            log,
            ..
        } => {
            let log_file = match (log_file, log) {
                (Some(path), _) => Some(path.clone()),
                (None, true) => match paths::ensure_log_dir() {
                    Ok(Some(dir)) => Some(dir.join("smoke.log")),
                    Ok(None) => {
                        eprintln!("Error: could not determine log directory");
                        std::process::exit(1);
                    }
                    Err(e) => {
                        eprintln!("Error: could not create log directory: {e}");
                        std::process::exit(1);
                    }
                },
                (None, false) => None,
            };
            match log_file {
                Some(path) => match logging::init_with_file(*verbose, &path) {
                    Ok(guard) => Some(guard),
                    Err(e) => {
                        eprintln!("Error: could not open log file {}: {e}", path.display());
                        std::process::exit(1);
                    }
                },
                None => {
                    logging::init_cli(*verbose);
                    None
                }
            }
        }
        _ => {
            logging::init_cli(false);
            None
        }
    };

    if let Err(e) = cli::dispatch(cli.command).await {
        eprintln!("Error: {e}");
        drop(guard);
        std::process::exit(1);
    }
}
