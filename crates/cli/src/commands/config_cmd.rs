use clap::Subcommand;
use dora_metrics_core::config::MetricsConfig;
use tracing::debug;

use crate::config::{get_config_path, load_config, save_config};
use crate::errors::CliError;

#[cfg(test)]
#[path = "config_cmd_tests.rs"]
mod tests;

/// Subcommands for the config command
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Create initial configuration file
    Init {
        /// Path to save the configuration file
        #[arg(short, long)]
        path: Option<String>,
    },

    /// Check configuration syntax and filter patterns
    Validate {
        /// Path to the configuration file
        #[arg(short, long)]
        path: Option<String>,
    },

    /// Show the effective configuration
    Show {
        /// Path to the configuration file
        #[arg(short, long)]
        path: Option<String>,
    },
}

/// Execute the config command
pub async fn execute(cmd: ConfigCommands) -> Result<(), CliError> {
    match cmd {
        ConfigCommands::Init { path } => init_config(path.as_deref()),
        ConfigCommands::Validate { path } => validate_config(path.as_deref()),
        ConfigCommands::Show { path } => show_config(path.as_deref()),
    }
}

/// Initialize a new configuration file
fn init_config(path: Option<&str>) -> Result<(), CliError> {
    let config_path = get_config_path(path);
    debug!("Initializing configuration at {:?}", config_path);

    if config_path.exists() {
        return Err(CliError::ConfigError(format!(
            "Configuration file already exists at {:?}",
            config_path
        )));
    }

    save_config(&MetricsConfig::default(), &config_path)?;

    println!("Configuration initialized at {:?}", config_path);
    Ok(())
}

/// Validate a configuration file
fn validate_config(path: Option<&str>) -> Result<(), CliError> {
    let config_path = get_config_path(path);
    debug!("Validating configuration at {:?}", config_path);

    let explicit = config_path.to_string_lossy().into_owned();
    load_config(Some(explicit.as_str()))?;

    println!("Configuration is valid");
    Ok(())
}

/// Print the configuration a report would use
fn show_config(path: Option<&str>) -> Result<(), CliError> {
    let config = load_config(path)?;

    let config_str = toml::to_string_pretty(&config)
        .map_err(|e| CliError::ConfigError(format!("Failed to serialize configuration: {}", e)))?;
    println!("{}", config_str);

    Ok(())
}
