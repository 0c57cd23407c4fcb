use chrono::{DateTime, Utc};
use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MetricsError {
    #[error("Invalid interval: to_time {to_time} is before from_time {from_time}")]
    InvalidInterval {
        from_time: DateTime<Utc>,
        to_time: DateTime<Utc>,
    },

    #[error("Field '{field}' of record '{record}' is not a timestamp")]
    NonTemporalField { field: String, record: String },

    #[error("Invalid filter pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Errors raised while loading a metrics configuration file.
#[derive(Error, Debug)]
pub enum ConfigLoadError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unsupported configuration schema version: {0}")]
    UnsupportedSchemaVersion(u32),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] MetricsError),
}
