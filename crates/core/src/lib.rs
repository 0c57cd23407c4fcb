//! # DORA Metrics Core
//!
//! Computes the four DORA delivery metrics from normalised pull requests,
//! deployments and incidents:
//! - Deployment frequency: how often a team deploys
//! - Lead time for changes: how long a change takes from first commit to production
//! - Mean time to recovery: how long incidents stay open
//! - Change failure rate: how many deployments led to an incident
//!
//! The crate is organised around the building blocks of those metrics:
//! - [`interval`]: validated time ranges and their algebra
//! - [`buckets`]: daily, weekly and monthly time buckets with gap filling
//! - [`lineage`]: attribution of merged pull requests to deployments
//! - [`incidents`]: correlation of incidents with the deployment that caused them
//! - [`metrics`]: point values, weighted aggregation and weekly trends
//! - [`filters`] and [`config`]: exclusion rules loaded from TOML
//! - [`report`]: the team summary combining everything above
//!
//! Everything here is synchronous and side-effect free. Fetching events is
//! left to an `EventSource` from `dora_metrics_developer_platforms`.
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use dora_metrics_core::interval::Interval;
//! use dora_metrics_core::report::{compute_dora_summary, SummaryInput};
//! use dora_metrics_developer_platforms::models::EventSnapshot;
//!
//! let interval = Interval::new(
//!     Utc.with_ymd_and_hms(2024, 5, 13, 0, 0, 0).unwrap(),
//!     Utc.with_ymd_and_hms(2024, 5, 19, 23, 59, 59).unwrap(),
//! )
//! .unwrap();
//!
//! let report = compute_dora_summary(&SummaryInput::new(EventSnapshot::default()), &interval);
//!
//! assert_eq!(report.deployment_frequency.total_deployments, 0);
//! assert_eq!(report.change_failure_rate.rate, 0.0);
//! ```

pub mod buckets;
pub mod config;
pub mod errors;
pub mod filters;
pub mod incidents;
pub mod interval;
pub mod lineage;
pub mod metrics;
pub mod report;

pub use errors::{ConfigLoadError, MetricsError};
pub use interval::Interval;
pub use report::{compute_dora_summary, DoraReport, SummaryInput};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
