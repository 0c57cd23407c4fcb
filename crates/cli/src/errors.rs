use dora_metrics_core::errors::{ConfigLoadError, MetricsError};
use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The event snapshot could not be loaded
    #[error("Event source error: {0}")]
    SourceError(String),

    /// Invalid arguments
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The report could not be written
    #[error("Output error: {0}")]
    OutputError(String),

    /// Other errors
    #[error("Error: {0}")]
    Other(String),
}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::Other(err.to_string())
    }
}

impl From<ConfigLoadError> for CliError {
    fn from(err: ConfigLoadError) -> Self {
        CliError::ConfigError(err.to_string())
    }
}

impl From<MetricsError> for CliError {
    fn from(err: MetricsError) -> Self {
        match err {
            MetricsError::InvalidPattern { .. } => CliError::ConfigError(err.to_string()),
            _ => CliError::InvalidArguments(err.to_string()),
        }
    }
}

impl From<dora_metrics_developer_platforms::errors::Error> for CliError {
    fn from(err: dora_metrics_developer_platforms::errors::Error) -> Self {
        CliError::SourceError(err.to_string())
    }
}

impl std::process::Termination for CliError {
    fn report(self) -> std::process::ExitCode {
        match self {
            CliError::ConfigError(_) => std::process::ExitCode::from(2),
            CliError::SourceError(_) => std::process::ExitCode::from(3),
            CliError::OutputError(_) => std::process::ExitCode::from(4),
            CliError::InvalidArguments(_) => std::process::ExitCode::from(5),
            CliError::Other(_) => std::process::ExitCode::FAILURE,
        }
    }
}
