//! # Deployment and Incident Correlation
//!
//! Assigns each incident to the deployment that was live when it was opened.
//! A deployment is live from its own `conducted_at` until the next
//! deployment; the most recent deployment stays live indefinitely.

use std::collections::HashMap;

use dora_metrics_developer_platforms::models::{Deployment, Incident};
use tracing::{debug, instrument};

#[cfg(test)]
#[path = "incidents_tests.rs"]
mod tests;

/// Maps every deployment to the incidents opened during its window.
///
/// Both inputs are sorted by their timestamps with a stable sort and walked
/// once with an incident cursor. Incidents opened before the first
/// deployment cannot be blamed on any deployment and are dropped. Every
/// deployment is present in the result, possibly with an empty list.
///
/// The result is keyed by the deployment record itself. Duplicate records
/// with the same id, branch, time and status share one key, and the
/// incidents of their windows are collected under it. Each incident still
/// appears once.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use dora_metrics_core::incidents::map_deployments_to_incidents;
/// use dora_metrics_developer_platforms::models::{
///     Deployment, DeploymentProvenance, DeploymentStatus, Incident, IncidentStatus, IncidentType,
/// };
///
/// let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let deployment = Deployment {
///     id: "d1".to_string(),
///     repo_id: "web".to_string(),
///     head_branch: "main".to_string(),
///     conducted_at: t0,
///     status: DeploymentStatus::Success,
///     provenance: DeploymentProvenance::Workflow,
/// };
/// let incident = Incident {
///     id: "i1".to_string(),
///     title: "errors spiking".to_string(),
///     incident_type: IncidentType::Incident,
///     creation_date: t0 + Duration::hours(1),
///     resolved_date: None,
///     status: IncidentStatus::Triggered,
/// };
///
/// let mapping = map_deployments_to_incidents(&[deployment.clone()], &[incident]);
/// assert_eq!(mapping[&deployment].len(), 1);
/// ```
#[instrument(skip_all, fields(deployments = deployments.len(), incidents = incidents.len()))]
pub fn map_deployments_to_incidents(
    deployments: &[Deployment],
    incidents: &[Incident],
) -> HashMap<Deployment, Vec<Incident>> {
    let mut sorted_deployments: Vec<&Deployment> = deployments.iter().collect();
    sorted_deployments.sort_by_key(|d| d.conducted_at);

    let mut sorted_incidents: Vec<&Incident> = incidents.iter().collect();
    sorted_incidents.sort_by_key(|i| i.creation_date);

    let mut mapping: HashMap<Deployment, Vec<Incident>> =
        HashMap::with_capacity(sorted_deployments.len());
    let mut cursor = 0;
    let mut discarded = 0;

    for (index, current) in sorted_deployments.iter().enumerate() {
        let window_end = sorted_deployments.get(index + 1).map(|d| d.conducted_at);

        while cursor < sorted_incidents.len()
            && sorted_incidents[cursor].creation_date < current.conducted_at
        {
            discarded += 1;
            cursor += 1;
        }

        let mut window = Vec::new();
        while cursor < sorted_incidents.len() {
            let incident = sorted_incidents[cursor];
            if window_end.is_some_and(|end| incident.creation_date >= end) {
                break;
            }
            window.push(incident.clone());
            cursor += 1;
        }

        mapping.entry((*current).clone()).or_default().extend(window);
    }

    debug!(
        discarded,
        mapped = cursor - discarded,
        "Correlated incidents with deployments"
    );

    mapping
}
