//! # DORA Metrics CLI
//!
//! Command-line interface for computing DORA metrics from exported events.
//!
//! This binary reads a JSON snapshot of normalised pull requests, deployments
//! and incidents, applies the filters from the metrics configuration and
//! prints the deployment frequency, lead time, mean time to recovery and
//! change failure rate as JSON.
//!
//! # Commands
//!
//! - `report` - Compute the DORA metrics for an interval
//! - `config` - Manage configuration files
//!
//! # Examples
//!
//! ```bash
//! # Compute the metrics for May 2024
//! dora-metrics report --input events.json --from 2024-05-01T00:00:00Z --to 2024-05-31T23:59:59Z --pretty
//!
//! # Initialize configuration
//! dora-metrics config init
//! ```
//!
//! Logging is controlled through the `DORA_METRICS_LOG` environment variable,
//! for example `DORA_METRICS_LOG=dora_metrics_core=debug`.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

use clap::{Parser, Subcommand};
use tracing::{error, info, instrument};

/// Command implementations for the CLI.
mod commands;

/// Configuration management for the CLI.
mod config;

/// Error types specific to the CLI.
mod errors;

use commands::{config_cmd::ConfigCommands, report::ReportArgs};
use errors::CliError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Command-line interface structure for DORA Metrics.
///
/// This struct defines the top-level CLI interface using clap's derive API.
/// It includes global options like verbose logging and the main command structure.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// The subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

/// Available commands for the DORA Metrics CLI.
#[derive(Subcommand)]
enum Commands {
    /// Compute the DORA metrics for an interval
    Report(ReportArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Main entry point for the DORA Metrics CLI.
///
/// This function initializes logging, parses command-line arguments,
/// and dispatches to the appropriate command handler.
///
/// # Errors
///
/// This function can return errors in the following cases:
/// - Invalid timestamps or a reversed interval
/// - Configuration errors, including invalid filter patterns
/// - A missing or malformed event snapshot
/// - Failures while writing the report
#[tokio::main]
#[instrument]
async fn main() -> Result<(), CliError> {
    // Logs go to stderr so the JSON report on stdout stays parseable
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_env("DORA_METRICS_LOG"))
        .init();

    let cli = Cli::parse();

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    match cli.command {
        Commands::Report(args) => {
            if let Err(e) = commands::report::execute(args).await {
                error!("Error computing DORA metrics: {}", e);
                return Err(e);
            }
        }
        Commands::Config(cmd) => {
            if let Err(e) = commands::config_cmd::execute(cmd).await {
                error!("Error executing config command: {}", e);
                return Err(e);
            }
        }
    }

    Ok(())
}
