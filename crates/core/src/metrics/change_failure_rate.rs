use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use dora_metrics_developer_platforms::models::{Deployment, Incident};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::buckets::{fill_missing_week_buckets, start_of_week};
use crate::incidents::map_deployments_to_incidents;
use crate::interval::Interval;

#[cfg(test)]
#[path = "change_failure_rate_tests.rs"]
mod tests;

/// Failed and total deployments, tracked by deployment id.
///
/// Keeping ids rather than counts means merging two results that saw the
/// same deployment does not count it twice.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChangeFailureRateMetrics {
    pub failed_deployments: HashSet<String>,
    pub total_deployments: HashSet<String>,
}

impl ChangeFailureRateMetrics {
    /// Records a deployment, marking it failed if `failed` is set.
    pub fn record(&mut self, deployment: &Deployment, failed: bool) {
        self.total_deployments.insert(deployment.id.clone());
        if failed {
            self.failed_deployments.insert(deployment.id.clone());
        }
    }

    /// Percentage of deployments that failed, `0` when nothing was deployed.
    ///
    /// # Examples
    ///
    /// ```
    /// use dora_metrics_core::metrics::ChangeFailureRateMetrics;
    ///
    /// let mut metrics = ChangeFailureRateMetrics::default();
    /// assert_eq!(metrics.rate(), 0.0);
    ///
    /// metrics.total_deployments.insert("d1".to_string());
    /// metrics.total_deployments.insert("d2".to_string());
    /// metrics.failed_deployments.insert("d2".to_string());
    /// assert_eq!(metrics.rate(), 50.0);
    /// ```
    pub fn rate(&self) -> f64 {
        if self.total_deployments.is_empty() {
            return 0.0;
        }

        self.failed_deployments.len() as f64 / self.total_deployments.len() as f64 * 100.0
    }
}

/// Union of two change failure results.
pub fn combine_change_failure_rate(
    a: &ChangeFailureRateMetrics,
    b: &ChangeFailureRateMetrics,
) -> ChangeFailureRateMetrics {
    ChangeFailureRateMetrics {
        failed_deployments: a
            .failed_deployments
            .union(&b.failed_deployments)
            .cloned()
            .collect(),
        total_deployments: a
            .total_deployments
            .union(&b.total_deployments)
            .cloned()
            .collect(),
    }
}

/// Change failure rate over `deployments`.
///
/// Incidents are correlated with the deployment live when they were opened.
/// A deployment failed when at least one incident was opened during its
/// window.
#[instrument(skip_all, fields(deployments = deployments.len(), incidents = incidents.len()))]
pub fn compute_change_failure_rate(
    deployments: &[Deployment],
    incidents: &[Incident],
) -> ChangeFailureRateMetrics {
    let mut metrics = ChangeFailureRateMetrics::default();
    for (deployment, linked) in map_deployments_to_incidents(deployments, incidents) {
        metrics.record(&deployment, !linked.is_empty());
    }

    debug!(
        failed = metrics.failed_deployments.len(),
        total = metrics.total_deployments.len(),
        "Computed change failure rate"
    );

    metrics
}

/// Weekly change failure series keyed by the Monday of each deployment.
///
/// Correlation runs over every deployment given so that windows reaching
/// into the interval are accurate, but only deployments conducted inside
/// `interval` are counted. Weeks without deployments hold the zero value.
#[instrument(skip_all, fields(deployments = deployments.len(), incidents = incidents.len()))]
pub fn change_failure_rate_trends(
    deployments: &[Deployment],
    incidents: &[Incident],
    interval: &Interval,
) -> BTreeMap<DateTime<Utc>, ChangeFailureRateMetrics> {
    let mut weekly: BTreeMap<DateTime<Utc>, ChangeFailureRateMetrics> = BTreeMap::new();
    for (deployment, linked) in map_deployments_to_incidents(deployments, incidents) {
        if !interval.contains(deployment.conducted_at) {
            continue;
        }

        weekly
            .entry(start_of_week(deployment.conducted_at))
            .or_default()
            .record(&deployment, !linked.is_empty());
    }

    fill_missing_week_buckets(weekly, interval, ChangeFailureRateMetrics::default)
}
