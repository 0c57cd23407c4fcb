use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use dora_metrics_developer_platforms::models::Deployment;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::buckets::{expand_buckets_by, fill_missing_week_buckets, start_of_week, Granularity};
use crate::interval::Interval;

#[cfg(test)]
#[path = "deployment_frequency_tests.rs"]
mod tests;

/// How often a team deployed over an interval.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DeploymentFrequencyMetrics {
    /// Deployments conducted inside the interval
    pub total_deployments: usize,
    /// Deployments per day bucket
    pub daily_avg: f64,
    /// Deployments per Monday-aligned week bucket
    pub weekly_avg: f64,
    /// Deployments per calendar month bucket
    pub monthly_avg: f64,
}

fn average_per_bucket(
    deployments: &[&Deployment],
    interval: &Interval,
    granularity: Granularity,
) -> f64 {
    let buckets = expand_buckets_by(deployments, interval, granularity, |d| d.conducted_at);
    if buckets.is_empty() {
        return 0.0;
    }

    let total: usize = buckets.values().map(Vec::len).sum();
    total as f64 / buckets.len() as f64
}

/// Deployment counts and per-bucket averages for `interval`.
///
/// Only deployments conducted within the closed interval are counted. Each
/// average is the number of deployments divided by the number of buckets
/// the interval spans at that granularity, so partial buckets at either end
/// count as whole buckets.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use dora_metrics_core::interval::Interval;
/// use dora_metrics_core::metrics::compute_deployment_frequency;
/// use dora_metrics_developer_platforms::models::{Deployment, DeploymentProvenance, DeploymentStatus};
///
/// let monday = Utc.with_ymd_and_hms(2024, 5, 13, 0, 0, 0).unwrap();
/// let deployments: Vec<Deployment> = (0..4)
///     .map(|i| Deployment {
///         id: format!("d{}", i),
///         repo_id: "web".to_string(),
///         head_branch: "main".to_string(),
///         conducted_at: monday + Duration::days(i * 3),
///         status: DeploymentStatus::Success,
///         provenance: DeploymentProvenance::Workflow,
///     })
///     .collect();
///
/// let interval = Interval::new(monday, monday + Duration::days(13)).unwrap();
/// let metrics = compute_deployment_frequency(&deployments, &interval);
///
/// assert_eq!(metrics.total_deployments, 4);
/// assert_eq!(metrics.weekly_avg, 2.0);
/// ```
#[instrument(skip_all, fields(deployments = deployments.len()))]
pub fn compute_deployment_frequency(
    deployments: &[Deployment],
    interval: &Interval,
) -> DeploymentFrequencyMetrics {
    let in_range: Vec<&Deployment> = deployments
        .iter()
        .filter(|d| interval.contains(d.conducted_at))
        .collect();

    let metrics = DeploymentFrequencyMetrics {
        total_deployments: in_range.len(),
        daily_avg: average_per_bucket(&in_range, interval, Granularity::Daily),
        weekly_avg: average_per_bucket(&in_range, interval, Granularity::Weekly),
        monthly_avg: average_per_bucket(&in_range, interval, Granularity::Monthly),
    };

    debug!(
        total = metrics.total_deployments,
        weekly_avg = metrics.weekly_avg,
        "Computed deployment frequency"
    );

    metrics
}

/// Weekly deployment counts keyed by Monday, with empty weeks set to zero.
#[instrument(skip_all, fields(deployments = deployments.len()))]
pub fn deployment_frequency_trends(
    deployments: &[Deployment],
    interval: &Interval,
) -> BTreeMap<DateTime<Utc>, usize> {
    let mut weekly: BTreeMap<DateTime<Utc>, usize> = BTreeMap::new();
    for deployment in deployments.iter().filter(|d| interval.contains(d.conducted_at)) {
        *weekly.entry(start_of_week(deployment.conducted_at)).or_insert(0) += 1;
    }

    fill_missing_week_buckets(weekly, interval, || 0)
}
