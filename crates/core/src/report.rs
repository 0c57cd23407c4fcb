//! # Team Summary
//!
//! Composes the four DORA metrics, and optionally their weekly trends, into a
//! single report for one interval.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use dora_metrics_developer_platforms::models::{Deployment, EventSnapshot, Incident, PullRequest};
use serde::Serialize;
use tracing::{info, instrument};

use crate::config::MetricsConfig;
use crate::errors::MetricsError;
use crate::filters::EventFilter;
use crate::interval::Interval;
use crate::lineage::annotate_merge_to_deploy;
use crate::metrics::{
    change_failure_rate_trends, combine_change_failure_rate, compute_deployment_frequency,
    compute_lead_time, compute_mean_time_to_recovery, deployment_frequency_trends,
    lead_time_trends, mean_time_to_recovery_trends, ChangeFailureRateMetrics,
    DeploymentFrequencyMetrics, LeadTimeMetrics, MeanTimeToRecoveryMetrics,
};

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;

/// Events and settings a summary is computed from.
#[derive(Debug, Clone)]
pub struct SummaryInput {
    pub events: EventSnapshot,
    pub filter: EventFilter,
    pub include_trends: bool,
}

impl SummaryInput {
    /// Unfiltered input with trends enabled.
    pub fn new(events: EventSnapshot) -> Self {
        Self {
            events,
            filter: EventFilter::default(),
            include_trends: true,
        }
    }

    /// Input with the filters and trend settings of `config`.
    pub fn with_config(
        events: EventSnapshot,
        config: &MetricsConfig,
    ) -> Result<Self, MetricsError> {
        Ok(Self {
            events,
            filter: EventFilter::from_config(&config.filters)?,
            include_trends: config.trends.include_trends,
        })
    }
}

/// Lead time breakdown together with its derived totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadTimeSummary {
    #[serde(flatten)]
    pub breakdown: LeadTimeMetrics,
    pub lead_time: f64,
    pub cycle_time: f64,
}

impl From<LeadTimeMetrics> for LeadTimeSummary {
    fn from(breakdown: LeadTimeMetrics) -> Self {
        Self {
            lead_time: breakdown.lead_time(),
            cycle_time: breakdown.cycle_time(),
            breakdown,
        }
    }
}

/// Change failure rate reduced to counts for presentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeFailureRateSummary {
    pub rate: f64,
    pub failed_deployments: usize,
    pub total_deployments: usize,
}

impl From<&ChangeFailureRateMetrics> for ChangeFailureRateSummary {
    fn from(metrics: &ChangeFailureRateMetrics) -> Self {
        Self {
            rate: metrics.rate(),
            failed_deployments: metrics.failed_deployments.len(),
            total_deployments: metrics.total_deployments.len(),
        }
    }
}

/// Weekly series keyed by the Monday each week starts on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DoraTrends {
    pub deployment_frequency: BTreeMap<DateTime<Utc>, usize>,
    pub lead_time: BTreeMap<DateTime<Utc>, LeadTimeSummary>,
    pub mean_time_to_recovery: BTreeMap<DateTime<Utc>, MeanTimeToRecoveryMetrics>,
    pub change_failure_rate: BTreeMap<DateTime<Utc>, ChangeFailureRateSummary>,
}

/// The four DORA metrics for one interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DoraReport {
    pub interval: Interval,
    pub deployment_frequency: DeploymentFrequencyMetrics,
    pub lead_time: LeadTimeSummary,
    pub mean_time_to_recovery: MeanTimeToRecoveryMetrics,
    pub change_failure_rate: ChangeFailureRateSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trends: Option<DoraTrends>,
}

fn merged_within(prs: Vec<PullRequest>, interval: &Interval) -> Vec<PullRequest> {
    prs.into_iter()
        .filter(|pr| pr.merged_at().is_some_and(|at| interval.contains(at)))
        .collect()
}

fn resolved_within(incidents: &[Incident], interval: &Interval) -> Vec<Incident> {
    incidents
        .iter()
        .filter(|i| i.resolved_date.is_some_and(|at| interval.contains(at)))
        .cloned()
        .collect()
}

/// Computes the DORA summary of `input` over `interval`.
///
/// Deployment and incident filters apply to every metric. Merge to deploy
/// times are derived from the lineage of all pull requests before the pull
/// request filter narrows the lead time input, so excluding a pull request
/// never breaks the branch chain of another one.
///
/// Lead time covers pull requests merged in the interval, recovery covers
/// incidents resolved in it, and deployment metrics cover deployments
/// conducted in it. Incidents are still correlated against earlier
/// deployments so that a deployment made just before the interval absorbs
/// the incidents it caused.
#[instrument(skip_all, fields(from = %interval.from_time(), to = %interval.to_time()))]
pub fn compute_dora_summary(input: &SummaryInput, interval: &Interval) -> DoraReport {
    let deployments: Vec<Deployment> = input.filter.filter_deployments(&input.events.deployments);
    let incidents: Vec<Incident> = input.filter.filter_incidents(&input.events.incidents);

    let annotated = annotate_merge_to_deploy(&input.events.pull_requests, &deployments);
    let prs = merged_within(input.filter.filter_pull_requests(&annotated), interval);
    let resolved = resolved_within(&incidents, interval);

    let weekly_failures = change_failure_rate_trends(&deployments, &incidents, interval);
    let change_failure_rate = weekly_failures
        .values()
        .fold(ChangeFailureRateMetrics::default(), |acc, week| {
            combine_change_failure_rate(&acc, week)
        });

    let trends = input.include_trends.then(|| DoraTrends {
        deployment_frequency: deployment_frequency_trends(&deployments, interval),
        lead_time: lead_time_trends(&prs, interval)
            .into_iter()
            .map(|(week, metrics)| (week, metrics.into()))
            .collect(),
        mean_time_to_recovery: mean_time_to_recovery_trends(&resolved, interval),
        change_failure_rate: weekly_failures
            .iter()
            .map(|(week, metrics)| (*week, metrics.into()))
            .collect(),
    });

    let report = DoraReport {
        interval: *interval,
        deployment_frequency: compute_deployment_frequency(&deployments, interval),
        lead_time: compute_lead_time(&prs).into(),
        mean_time_to_recovery: compute_mean_time_to_recovery(&resolved),
        change_failure_rate: (&change_failure_rate).into(),
        trends,
    };

    info!(
        deployments = report.deployment_frequency.total_deployments,
        prs = report.lead_time.breakdown.pr_count,
        incidents = report.mean_time_to_recovery.incident_count,
        change_failure_rate = report.change_failure_rate.rate,
        "Computed DORA summary"
    );

    report
}
