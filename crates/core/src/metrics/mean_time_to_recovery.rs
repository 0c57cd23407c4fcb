use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use dora_metrics_developer_platforms::models::Incident;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::buckets::{expand_buckets_by, fill_missing_week_buckets, Granularity};
use crate::interval::Interval;

#[cfg(test)]
#[path = "mean_time_to_recovery_tests.rs"]
mod tests;

/// Mean recovery time over a set of resolved incidents.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MeanTimeToRecoveryMetrics {
    /// Mean seconds from opening to resolving an incident
    pub mean_seconds: f64,
    /// Number of incidents the mean was computed over
    pub incident_count: usize,
}

/// Merges two recovery results, weighting each by its incident count.
pub fn combine_mean_time_to_recovery(
    a: &MeanTimeToRecoveryMetrics,
    b: &MeanTimeToRecoveryMetrics,
) -> MeanTimeToRecoveryMetrics {
    let incident_count = a.incident_count + b.incident_count;
    if incident_count == 0 {
        return MeanTimeToRecoveryMetrics::default();
    }

    let total_seconds =
        a.mean_seconds * a.incident_count as f64 + b.mean_seconds * b.incident_count as f64;

    MeanTimeToRecoveryMetrics {
        mean_seconds: total_seconds / incident_count as f64,
        incident_count,
    }
}

/// Mean time to recovery over the resolved incidents in `incidents`.
///
/// Incidents that are not resolved, or that have no resolution date, are
/// skipped. Without any resolved incident the result is the zero value.
#[instrument(skip_all, fields(incidents = incidents.len()))]
pub fn compute_mean_time_to_recovery(incidents: &[Incident]) -> MeanTimeToRecoveryMetrics {
    let recoveries: Vec<i64> = incidents.iter().filter_map(Incident::recovery_seconds).collect();
    if recoveries.is_empty() {
        return MeanTimeToRecoveryMetrics::default();
    }

    let total: i64 = recoveries.iter().sum();
    let metrics = MeanTimeToRecoveryMetrics {
        mean_seconds: total as f64 / recoveries.len() as f64,
        incident_count: recoveries.len(),
    };

    debug!(
        resolved = metrics.incident_count,
        skipped = incidents.len() - metrics.incident_count,
        "Computed mean time to recovery"
    );

    metrics
}

/// Weekly recovery series keyed by the Monday of each incident's resolution.
///
/// Weeks in which nothing was resolved hold the zero value.
#[instrument(skip_all, fields(incidents = incidents.len()))]
pub fn mean_time_to_recovery_trends(
    incidents: &[Incident],
    interval: &Interval,
) -> BTreeMap<DateTime<Utc>, MeanTimeToRecoveryMetrics> {
    let resolved: Vec<(DateTime<Utc>, &Incident)> = incidents
        .iter()
        .filter(|incident| incident.recovery_seconds().is_some())
        .filter_map(|incident| incident.resolved_date.map(|at| (at, incident)))
        .collect();

    let weekly: BTreeMap<DateTime<Utc>, MeanTimeToRecoveryMetrics> =
        expand_buckets_by(&resolved, interval, Granularity::Weekly, |(at, _)| *at)
            .into_iter()
            .map(|(week, bucket)| {
                let incidents: Vec<Incident> =
                    bucket.into_iter().map(|(_, i)| i.clone()).collect();
                (week, compute_mean_time_to_recovery(&incidents))
            })
            .collect();

    fill_missing_week_buckets(weekly, interval, MeanTimeToRecoveryMetrics::default)
}
