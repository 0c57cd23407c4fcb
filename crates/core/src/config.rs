//! Configuration settings for the DORA metrics core.
//!
//! A metrics configuration is a TOML file with a schema version, the event
//! filters applied before any metric is computed, and trend settings:
//!
//! ```toml
//! schemaVersion = 1
//!
//! [filters]
//! excludedPrIds = ["pr-123"]
//! baseBranchPatterns = ["^main$", "^release/.*"]
//! incidentTypes = ["INCIDENT", "REVERT_PR"]
//! deploymentBranchPatterns = []
//!
//! [trends]
//! includeTrends = true
//! ```
use dora_metrics_developer_platforms::models::IncidentType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, instrument};

use crate::errors::ConfigLoadError;
use crate::filters::EventFilter;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// File name used when no configuration path is given
pub const DEFAULT_CONFIG_FILE: &str = "dora-metrics.toml";

/// The only configuration schema version understood by this crate
pub const SUPPORTED_SCHEMA_VERSION: u32 = 1;

/// Top-level configuration struct for the metrics core
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetricsConfig {
    #[serde(rename = "schemaVersion")]
    pub schema_version: u32,

    #[serde(default)]
    pub filters: FilterConfig,

    #[serde(default)]
    pub trends: TrendConfig,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            schema_version: SUPPORTED_SCHEMA_VERSION,
            filters: FilterConfig::default(),
            trends: TrendConfig::default(),
        }
    }
}

/// Exclusion rules applied to events before the metrics run.
///
/// Empty lists disable the corresponding rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FilterConfig {
    /// Pull request ids left out of lead time
    #[serde(default)]
    pub excluded_pr_ids: Vec<String>,

    /// Regexes a pull request's base branch must match
    #[serde(default)]
    pub base_branch_patterns: Vec<String>,

    /// Incident types counted towards recovery and failure rate
    #[serde(default)]
    pub incident_types: Vec<IncidentType>,

    /// Regexes a deployment's branch must match
    #[serde(default)]
    pub deployment_branch_patterns: Vec<String>,
}

/// Settings for weekly trend series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TrendConfig {
    /// Whether reports include weekly trend series
    #[serde(default = "TrendConfig::default_include_trends")]
    pub include_trends: bool,
}

impl TrendConfig {
    fn default_include_trends() -> bool {
        true
    }
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            include_trends: Self::default_include_trends(),
        }
    }
}

/// Loads the metrics configuration from the given path.
///
/// The filter patterns are compiled once while loading so that a bad regex
/// is reported before any events are fetched.
///
/// # Arguments
/// * `path` - Path to the configuration file
///
/// # Returns
/// * `Ok(MetricsConfig)` if loaded and valid
/// * `Err(ConfigLoadError)` if the file is missing, unreadable, malformed,
///   has an unsupported schema version or contains an invalid pattern
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_metrics_config<P: AsRef<Path>>(path: P) -> Result<MetricsConfig, ConfigLoadError> {
    let path_ref = path.as_ref();
    let content = match fs::read_to_string(path_ref) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigLoadError::NotFound(path_ref.display().to_string()));
        }
        Err(e) => return Err(ConfigLoadError::Io(e)),
    };

    let config: MetricsConfig = toml::from_str(&content)?;
    if config.schema_version != SUPPORTED_SCHEMA_VERSION {
        return Err(ConfigLoadError::UnsupportedSchemaVersion(
            config.schema_version,
        ));
    }

    EventFilter::from_config(&config.filters)?;

    debug!(
        excluded_prs = config.filters.excluded_pr_ids.len(),
        include_trends = config.trends.include_trends,
        "Loaded metrics configuration"
    );

    Ok(config)
}
