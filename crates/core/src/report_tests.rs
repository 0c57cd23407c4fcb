use super::*;
use chrono::{Duration, TimeZone};
use dora_metrics_developer_platforms::models::{
    DeploymentProvenance, DeploymentStatus, IncidentStatus, IncidentType, PullRequestState,
};

use crate::config::{FilterConfig, MetricsConfig, TrendConfig};

// Monday
fn week_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 13, 0, 0, 0).unwrap()
}

fn at_hours(hours: i64) -> DateTime<Utc> {
    week_start() + Duration::hours(hours)
}

fn merged_pr(id: &str, base: &str, head: &str, merged_at: DateTime<Utc>) -> PullRequest {
    PullRequest {
        id: id.to_string(),
        number: 1,
        title: String::new(),
        repo_id: "repo".to_string(),
        base_branch: base.to_string(),
        head_branch: head.to_string(),
        state: PullRequestState::Merged,
        created_at: merged_at - Duration::hours(5),
        state_changed_at: Some(merged_at),
        first_commit_to_open: Some(3600),
        first_response_time: Some(600),
        rework_time: None,
        merge_time: Some(300),
        merge_to_deploy: None,
    }
}

fn deployment(id: &str, branch: &str, conducted_at: DateTime<Utc>) -> Deployment {
    Deployment {
        id: id.to_string(),
        repo_id: "repo".to_string(),
        head_branch: branch.to_string(),
        conducted_at,
        status: DeploymentStatus::Success,
        provenance: DeploymentProvenance::Workflow,
    }
}

fn incident(
    id: &str,
    incident_type: IncidentType,
    opened: DateTime<Utc>,
    minutes: i64,
) -> Incident {
    Incident {
        id: id.to_string(),
        title: String::new(),
        incident_type,
        creation_date: opened,
        resolved_date: Some(opened + Duration::minutes(minutes)),
        status: IncidentStatus::Resolved,
    }
}

fn one_week() -> Interval {
    Interval::new(week_start(), week_start() + Duration::days(7) - Duration::seconds(1)).unwrap()
}

#[test]
fn test_empty_snapshot_gives_zero_report() {
    let report = compute_dora_summary(&SummaryInput::new(EventSnapshot::default()), &one_week());

    assert_eq!(report.deployment_frequency, DeploymentFrequencyMetrics::default());
    assert_eq!(report.lead_time.breakdown, LeadTimeMetrics::default());
    assert_eq!(report.lead_time.lead_time, 0.0);
    assert_eq!(report.mean_time_to_recovery, MeanTimeToRecoveryMetrics::default());
    assert_eq!(report.change_failure_rate.rate, 0.0);

    let trends = report.trends.unwrap();
    assert_eq!(trends.deployment_frequency.len(), 1);
    assert_eq!(trends.change_failure_rate.len(), 1);
}

#[test]
fn test_lead_time_includes_derived_merge_to_deploy() {
    let events = EventSnapshot {
        pull_requests: vec![merged_pr("pr-1", "main", "feature/a", at_hours(10))],
        deployments: vec![deployment("d1", "main", at_hours(12))],
        incidents: vec![],
    };

    let report = compute_dora_summary(&SummaryInput::new(events), &one_week());

    assert_eq!(report.lead_time.breakdown.pr_count, 1);
    assert_eq!(report.lead_time.breakdown.merge_to_deploy, 7200.0);
    assert_eq!(report.lead_time.lead_time, 3600.0 + 600.0 + 300.0 + 7200.0);
    assert_eq!(report.lead_time.cycle_time, 600.0 + 300.0 + 7200.0);
}

#[test]
fn test_excluded_pull_request_keeps_lineage_for_others() {
    // feature/a -> develop -> main; the develop -> main merge is excluded
    // from lead time but still carries feature/a to the deployment.
    let events = EventSnapshot {
        pull_requests: vec![
            merged_pr("feature", "develop", "feature/a", at_hours(2)),
            merged_pr("promotion", "main", "develop", at_hours(4)),
        ],
        deployments: vec![deployment("d1", "main", at_hours(6))],
        incidents: vec![],
    };
    let config = MetricsConfig {
        filters: FilterConfig {
            excluded_pr_ids: vec!["promotion".to_string()],
            ..Default::default()
        },
        ..Default::default()
    };

    let input = SummaryInput::with_config(events, &config).unwrap();
    let report = compute_dora_summary(&input, &one_week());

    assert_eq!(report.lead_time.breakdown.pr_count, 1);
    assert_eq!(report.lead_time.breakdown.merge_to_deploy, 4.0 * 3600.0);
}

#[test]
fn test_change_failure_rate_and_recovery() {
    let events = EventSnapshot {
        pull_requests: vec![],
        deployments: vec![
            deployment("d1", "main", at_hours(10)),
            deployment("d2", "main", at_hours(40)),
            deployment("d3", "main", at_hours(80)),
            deployment("d4", "main", at_hours(120)),
        ],
        incidents: vec![
            incident("i1", IncidentType::Incident, at_hours(12), 30),
            incident("i2", IncidentType::Incident, at_hours(85), 90),
        ],
    };

    let report = compute_dora_summary(&SummaryInput::new(events), &one_week());

    assert_eq!(report.deployment_frequency.total_deployments, 4);
    assert_eq!(report.change_failure_rate.failed_deployments, 2);
    assert_eq!(report.change_failure_rate.total_deployments, 4);
    assert_eq!(report.change_failure_rate.rate, 50.0);
    assert_eq!(report.mean_time_to_recovery.incident_count, 2);
    assert_eq!(report.mean_time_to_recovery.mean_seconds, 3600.0);
}

#[test]
fn test_incident_type_filter_applies_to_failure_rate() {
    let events = EventSnapshot {
        pull_requests: vec![],
        deployments: vec![deployment("d1", "main", at_hours(10))],
        incidents: vec![incident("alert", IncidentType::Alert, at_hours(11), 5)],
    };
    let config = MetricsConfig {
        filters: FilterConfig {
            incident_types: vec![IncidentType::Incident],
            ..Default::default()
        },
        ..Default::default()
    };

    let input = SummaryInput::with_config(events, &config).unwrap();
    let report = compute_dora_summary(&input, &one_week());

    assert_eq!(report.change_failure_rate.rate, 0.0);
    assert_eq!(report.mean_time_to_recovery.incident_count, 0);
}

#[test]
fn test_deployment_before_interval_absorbs_its_incident() {
    let events = EventSnapshot {
        pull_requests: vec![],
        deployments: vec![
            deployment("previous", "main", week_start() - Duration::hours(3)),
            deployment("d1", "main", at_hours(20)),
        ],
        incidents: vec![incident("i1", IncidentType::Incident, at_hours(1), 10)],
    };

    let report = compute_dora_summary(&SummaryInput::new(events), &one_week());

    assert_eq!(report.change_failure_rate.total_deployments, 1);
    assert_eq!(report.change_failure_rate.failed_deployments, 0);
    assert_eq!(report.mean_time_to_recovery.incident_count, 1);
}

#[test]
fn test_trends_can_be_disabled() {
    let config = MetricsConfig {
        trends: TrendConfig {
            include_trends: false,
        },
        ..Default::default()
    };

    let input = SummaryInput::with_config(EventSnapshot::default(), &config).unwrap();
    let report = compute_dora_summary(&input, &one_week());

    assert!(report.trends.is_none());
}

#[test]
fn test_invalid_filter_pattern_is_rejected() {
    let config = MetricsConfig {
        filters: FilterConfig {
            deployment_branch_patterns: vec!["[".to_string()],
            ..Default::default()
        },
        ..Default::default()
    };

    let result = SummaryInput::with_config(EventSnapshot::default(), &config);

    assert!(matches!(result, Err(MetricsError::InvalidPattern { .. })));
}
