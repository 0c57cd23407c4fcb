//! # Models
//!
//! This module contains the normalised event models consumed by the DORA
//! metrics core.
//!
//! Provider integrations (GitHub, GitLab, Bitbucket, incident tools) map their
//! own payloads onto these shapes before handing them over. Once a value has
//! been passed into a metrics call it is treated as an immutable snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;

/// The lifecycle state of a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PullRequestState {
    /// Still open for review
    Open,
    /// Closed without being merged
    Closed,
    /// Merged into its base branch
    Merged,
}

/// Represents a pull request from a Git provider.
///
/// Only the subset of fields relevant to the metrics core is kept. The lead
/// time components are precomputed by the ingestion layer and expressed in
/// seconds.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use dora_metrics_developer_platforms::models::{PullRequest, PullRequestState};
///
/// let pr = PullRequest {
///     id: "pr-1".to_string(),
///     number: 42,
///     title: "feat: add login".to_string(),
///     repo_id: "web".to_string(),
///     base_branch: "main".to_string(),
///     head_branch: "feature/login".to_string(),
///     state: PullRequestState::Merged,
///     created_at: Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
///     state_changed_at: Some(Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap()),
///     first_commit_to_open: Some(3600),
///     first_response_time: None,
///     rework_time: None,
///     merge_time: Some(7200),
///     merge_to_deploy: None,
/// };
///
/// assert!(pr.is_merged());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PullRequest {
    /// Provider independent identifier
    pub id: String,

    /// The pull request number within its repository
    #[serde(default)]
    pub number: u64,

    /// The title of the pull request
    #[serde(default)]
    pub title: String,

    /// Identifier of the repository the pull request belongs to
    pub repo_id: String,

    /// The branch the changes are merged into
    pub base_branch: String,

    /// The branch the changes come from
    pub head_branch: String,

    /// Current state of the pull request
    pub state: PullRequestState,

    /// When the pull request was opened
    pub created_at: DateTime<Utc>,

    /// When the pull request was merged or closed. `None` while open.
    #[serde(default)]
    pub state_changed_at: Option<DateTime<Utc>>,

    /// Seconds from the first commit to opening the pull request
    #[serde(default)]
    pub first_commit_to_open: Option<i64>,

    /// Seconds from opening until the first review response
    #[serde(default)]
    pub first_response_time: Option<i64>,

    /// Seconds spent reworking after the first review
    #[serde(default)]
    pub rework_time: Option<i64>,

    /// Seconds from approval to merge
    #[serde(default)]
    pub merge_time: Option<i64>,

    /// Seconds from merge until the change was deployed
    #[serde(default)]
    pub merge_to_deploy: Option<i64>,
}

impl PullRequest {
    /// Returns `true` if the pull request was merged.
    pub fn is_merged(&self) -> bool {
        self.state == PullRequestState::Merged
    }

    /// The merge time of the pull request, if it was merged.
    pub fn merged_at(&self) -> Option<DateTime<Utc>> {
        if self.is_merged() {
            self.state_changed_at
        } else {
            None
        }
    }
}

/// The outcome of a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeploymentStatus {
    Success,
    Failure,
}

/// Where a deployment record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeploymentProvenance {
    /// A CI workflow run that shipped the branch
    #[default]
    Workflow,
    /// A pull request merged into a deployment branch
    PrMerge,
}

/// A single deployment of a branch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Deployment {
    /// Provider independent identifier
    pub id: String,

    /// Identifier of the deployed repository
    pub repo_id: String,

    /// The branch that was deployed
    pub head_branch: String,

    /// When the deployment took place
    pub conducted_at: DateTime<Utc>,

    /// Outcome of the deployment
    pub status: DeploymentStatus,

    /// How the deployment was detected
    #[serde(default)]
    pub provenance: DeploymentProvenance,
}

impl Deployment {
    /// Normalise a merged pull request into a deployment of its base branch.
    ///
    /// Repositories without a deployment workflow treat every merge into the
    /// deployment branch as a release. Returns `None` when the pull request
    /// was not merged.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use dora_metrics_developer_platforms::models::{
    ///     Deployment, DeploymentProvenance, PullRequest, PullRequestState,
    /// };
    ///
    /// let merged_at = Utc.with_ymd_and_hms(2024, 3, 4, 12, 0, 0).unwrap();
    /// let pr = PullRequest {
    ///     id: "pr-7".to_string(),
    ///     number: 7,
    ///     title: "fix: typo".to_string(),
    ///     repo_id: "api".to_string(),
    ///     base_branch: "main".to_string(),
    ///     head_branch: "fix/typo".to_string(),
    ///     state: PullRequestState::Merged,
    ///     created_at: merged_at,
    ///     state_changed_at: Some(merged_at),
    ///     first_commit_to_open: None,
    ///     first_response_time: None,
    ///     rework_time: None,
    ///     merge_time: None,
    ///     merge_to_deploy: None,
    /// };
    ///
    /// let deployment = Deployment::from_merged_pull_request(&pr).unwrap();
    /// assert_eq!(deployment.head_branch, "main");
    /// assert_eq!(deployment.provenance, DeploymentProvenance::PrMerge);
    /// ```
    pub fn from_merged_pull_request(pr: &PullRequest) -> Option<Self> {
        let merged_at = pr.merged_at()?;
        Some(Self {
            id: pr.id.clone(),
            repo_id: pr.repo_id.clone(),
            head_branch: pr.base_branch.clone(),
            conducted_at: merged_at,
            status: DeploymentStatus::Success,
            provenance: DeploymentProvenance::PrMerge,
        })
    }

    /// Returns `true` if the deployment succeeded.
    pub fn is_successful(&self) -> bool {
        self.status == DeploymentStatus::Success
    }
}

/// The lifecycle state of an incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentStatus {
    Triggered,
    Acknowledged,
    Resolved,
}

/// The kind of signal an incident was raised from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentType {
    #[default]
    Incident,
    Alert,
    RevertPr,
}

/// An incident reported against a team's services.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Incident {
    /// Provider independent identifier
    pub id: String,

    /// Short description of the incident
    #[serde(default)]
    pub title: String,

    /// The kind of signal that raised the incident
    #[serde(default)]
    pub incident_type: IncidentType,

    /// When the incident was opened
    pub creation_date: DateTime<Utc>,

    /// When the incident was resolved, if it was
    #[serde(default)]
    pub resolved_date: Option<DateTime<Utc>>,

    /// Current state of the incident
    pub status: IncidentStatus,
}

impl Incident {
    /// Seconds between opening and resolving the incident.
    ///
    /// Only resolved incidents with a resolution date have a recovery time.
    pub fn recovery_seconds(&self) -> Option<i64> {
        if self.status != IncidentStatus::Resolved {
            return None;
        }

        self.resolved_date
            .map(|resolved| (resolved - self.creation_date).num_seconds())
    }
}

/// A normalised batch of events covering one query interval.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventSnapshot {
    #[serde(default)]
    pub pull_requests: Vec<PullRequest>,

    #[serde(default)]
    pub deployments: Vec<Deployment>,

    #[serde(default)]
    pub incidents: Vec<Incident>,
}
