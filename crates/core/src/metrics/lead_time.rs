use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use dora_metrics_developer_platforms::models::PullRequest;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::buckets::{expand_buckets_by, Granularity};
use crate::interval::Interval;

#[cfg(test)]
#[path = "lead_time_tests.rs"]
mod tests;

/// Average time, in seconds, spent in each stage of a change's life.
///
/// A record either describes one pull request (`pr_count == 1`) or an
/// aggregate over `pr_count` pull requests. Aggregates can be aggregated
/// again, so repository level results roll up into team level results
/// without going back to the raw pull requests.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LeadTimeMetrics {
    pub first_commit_to_open: f64,
    pub first_response_time: f64,
    pub rework_time: f64,
    pub merge_time: f64,
    pub merge_to_deploy: f64,
    pub pr_count: u64,
}

impl LeadTimeMetrics {
    /// Builds the record for a single pull request. Missing stages count as
    /// zero seconds.
    pub fn from_pull_request(pr: &PullRequest) -> Self {
        let seconds = |value: Option<i64>| value.unwrap_or(0) as f64;

        Self {
            first_commit_to_open: seconds(pr.first_commit_to_open),
            first_response_time: seconds(pr.first_response_time),
            rework_time: seconds(pr.rework_time),
            merge_time: seconds(pr.merge_time),
            merge_to_deploy: seconds(pr.merge_to_deploy),
            pr_count: 1,
        }
    }

    /// Total time from first commit to deployment.
    pub fn lead_time(&self) -> f64 {
        self.first_commit_to_open
            + self.first_response_time
            + self.rework_time
            + self.merge_time
            + self.merge_to_deploy
    }

    /// Time from opening the pull request to deployment.
    pub fn cycle_time(&self) -> f64 {
        self.lead_time() - self.first_commit_to_open
    }
}

/// Weighted combination of two lead time records.
///
/// Each stage becomes `(a * weight_a + b * weight_b) / (weight_a + weight_b)`
/// and the pull request counts are added. When both weights are zero the
/// stages are zero.
pub fn combine_lead_time(
    a: &LeadTimeMetrics,
    b: &LeadTimeMetrics,
    weight_a: f64,
    weight_b: f64,
) -> LeadTimeMetrics {
    let total = weight_a + weight_b;
    let mix = |x: f64, y: f64| {
        if total == 0.0 {
            0.0
        } else {
            (x * weight_a + y * weight_b) / total
        }
    };

    LeadTimeMetrics {
        first_commit_to_open: mix(a.first_commit_to_open, b.first_commit_to_open),
        first_response_time: mix(a.first_response_time, b.first_response_time),
        rework_time: mix(a.rework_time, b.rework_time),
        merge_time: mix(a.merge_time, b.merge_time),
        merge_to_deploy: mix(a.merge_to_deploy, b.merge_to_deploy),
        pr_count: a.pr_count + b.pr_count,
    }
}

/// Averages lead time records, weighting each by its own `pr_count`.
///
/// # Examples
///
/// ```
/// use dora_metrics_core::metrics::{aggregate_lead_time, LeadTimeMetrics};
///
/// let one = LeadTimeMetrics { merge_time: 1.0, pr_count: 1, ..Default::default() };
/// let three = LeadTimeMetrics { merge_time: 3.0, pr_count: 1, ..Default::default() };
///
/// assert_eq!(aggregate_lead_time(&[one, three]).merge_time, 2.0);
/// assert_eq!(aggregate_lead_time(&[]), LeadTimeMetrics::default());
/// ```
pub fn aggregate_lead_time(metrics: &[LeadTimeMetrics]) -> LeadTimeMetrics {
    metrics
        .iter()
        .fold(LeadTimeMetrics::default(), |acc, record| {
            combine_lead_time(&acc, record, acc.pr_count as f64, record.pr_count as f64)
        })
}

/// Average lead time over the given pull requests.
#[instrument(skip_all, fields(prs = prs.len()))]
pub fn compute_lead_time(prs: &[PullRequest]) -> LeadTimeMetrics {
    let records: Vec<LeadTimeMetrics> = prs
        .iter()
        .map(LeadTimeMetrics::from_pull_request)
        .collect();
    aggregate_lead_time(&records)
}

/// Weekly lead time series keyed by the Monday of each pull request's merge.
///
/// Pull requests that were not merged are ignored. Weeks without merges hold
/// a zero value.
#[instrument(skip_all, fields(prs = prs.len()))]
pub fn lead_time_trends(
    prs: &[PullRequest],
    interval: &Interval,
) -> BTreeMap<DateTime<Utc>, LeadTimeMetrics> {
    let merged: Vec<(DateTime<Utc>, &PullRequest)> = prs
        .iter()
        .filter_map(|pr| pr.merged_at().map(|at| (at, pr)))
        .collect();

    expand_buckets_by(&merged, interval, Granularity::Weekly, |(at, _)| *at)
        .into_iter()
        .map(|(week, bucket)| {
            let records: Vec<LeadTimeMetrics> = bucket
                .iter()
                .map(|(_, pr)| LeadTimeMetrics::from_pull_request(pr))
                .collect();
            (week, aggregate_lead_time(&records))
        })
        .collect()
}
