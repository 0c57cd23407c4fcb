//! # DORA Metrics
//!
//! This module turns correlated events into the four DORA metrics.
//!
//! The metrics are organized into submodules:
//! - `deployment_frequency`: how often a team deploys, per day, week and month
//! - `lead_time`: how long changes take from first commit to deployment
//! - `mean_time_to_recovery`: how long incidents take to resolve
//! - `change_failure_rate`: how many deployments led to an incident
//!
//! Every metric has a point value for an interval and a weekly trend series.
//! Empty inputs produce zero-valued metrics rather than errors.

pub mod change_failure_rate;
pub mod deployment_frequency;
pub mod lead_time;
pub mod mean_time_to_recovery;

pub use change_failure_rate::{
    change_failure_rate_trends, combine_change_failure_rate, compute_change_failure_rate,
    ChangeFailureRateMetrics,
};
pub use deployment_frequency::{
    compute_deployment_frequency, deployment_frequency_trends, DeploymentFrequencyMetrics,
};
pub use lead_time::{
    aggregate_lead_time, combine_lead_time, compute_lead_time, lead_time_trends, LeadTimeMetrics,
};
pub use mean_time_to_recovery::{
    combine_mean_time_to_recovery, compute_mean_time_to_recovery, mean_time_to_recovery_trends,
    MeanTimeToRecoveryMetrics,
};
