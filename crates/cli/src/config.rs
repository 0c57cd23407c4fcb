use std::{
    fs,
    path::{Path, PathBuf},
};

use dora_metrics_core::config::{load_metrics_config, MetricsConfig, DEFAULT_CONFIG_FILE};
use tracing::{debug, info};

use crate::errors::CliError;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Get the path to the configuration file
pub fn get_config_path(config_path: Option<&str>) -> PathBuf {
    if let Some(path) = config_path {
        PathBuf::from(path)
    } else {
        // Look for config in current directory
        let current_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        current_dir.join(DEFAULT_CONFIG_FILE)
    }
}

/// Load the metrics configuration used by a command.
///
/// An explicitly given path must exist. Without a path the default file in
/// the current directory is used when present, otherwise the built-in
/// defaults apply.
pub fn load_config(config_path: Option<&str>) -> Result<MetricsConfig, CliError> {
    let path = get_config_path(config_path);
    if config_path.is_none() && !path.exists() {
        debug!("No configuration file at {:?}, using defaults", path);
        return Ok(MetricsConfig::default());
    }

    debug!("Loading configuration from {:?}", path);
    Ok(load_metrics_config(&path)?)
}

/// Save configuration to the specified file
pub fn save_config(config: &MetricsConfig, path: &Path) -> Result<(), CliError> {
    debug!("Saving configuration to {:?}", path);

    let content = toml::to_string_pretty(config)
        .map_err(|e| CliError::ConfigError(format!("Failed to serialize configuration: {}", e)))?;

    // Create parent directories if they don't exist
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| CliError::ConfigError(format!("Failed to create directory: {}", e)))?;
    }

    fs::write(path, content).map_err(|e| {
        CliError::ConfigError(format!("Failed to write configuration file: {}", e))
    })?;

    info!("Configuration saved to {:?}", path);
    Ok(())
}
