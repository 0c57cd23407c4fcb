//! # Branch Lineage
//!
//! Determines which merged pull requests reached a deployed branch by the
//! time it was deployed.
//!
//! Changes often travel through several branches before they are shipped,
//! for example `feature -> develop -> release`. Every merged pull request is
//! an edge from its base branch to its head branch. Each branch carries a
//! watermark: the latest time any pull request took changes out of it. A
//! breadth-first walk from the deployed branch follows only the edges that
//! merged no later than the watermark of the branch they merged into.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{DateTime, Utc};
use dora_metrics_developer_platforms::models::{Deployment, PullRequest};
use tracing::{debug, instrument};

#[cfg(test)]
#[path = "lineage_tests.rs"]
mod tests;

#[derive(Debug)]
struct Edge<'a> {
    pr: &'a PullRequest,
    merged_at: DateTime<Utc>,
    head_branch: &'a str,
    order: usize,
}

/// A merge graph built for a single deployment.
///
/// The watermark map belongs to this instance only. Build a new graph for
/// every deployment so queries cannot influence each other.
#[derive(Debug)]
pub struct LineageGraph<'a> {
    root_branch: String,
    edges: HashMap<&'a str, Vec<Edge<'a>>>,
    watermarks: HashMap<String, DateTime<Utc>>,
    edge_count: usize,
}

impl<'a> LineageGraph<'a> {
    /// Creates a graph rooted at the deployed branch.
    ///
    /// The root's watermark is pinned to the deployment time before any edge
    /// is added. If the deployed branch is also the head of a merged pull
    /// request, adding that edge moves the watermark forward with the usual
    /// `max` rule.
    pub fn for_deployment(deployment: &Deployment) -> Self {
        let mut watermarks = HashMap::new();
        watermarks.insert(deployment.head_branch.clone(), deployment.conducted_at);

        Self {
            root_branch: deployment.head_branch.clone(),
            edges: HashMap::new(),
            watermarks,
            edge_count: 0,
        }
    }

    /// Adds the edge `base_branch -> head_branch` for a merged pull request.
    ///
    /// Pull requests that are not merged carry no changes and are ignored.
    pub fn add_pull_request(&mut self, pr: &'a PullRequest) {
        let Some(merged_at) = pr.merged_at() else {
            return;
        };

        self.edges
            .entry(pr.base_branch.as_str())
            .or_default()
            .push(Edge {
                pr,
                merged_at,
                head_branch: pr.head_branch.as_str(),
                order: self.edge_count,
            });
        self.edge_count += 1;

        let watermark = self
            .watermarks
            .entry(pr.head_branch.clone())
            .or_insert(merged_at);
        *watermark = (*watermark).max(merged_at);
    }

    /// The cutoff currently recorded for `branch`, if any.
    pub fn watermark(&self, branch: &str) -> Option<DateTime<Utc>> {
        self.watermarks.get(branch).copied()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Walks the graph from the deployed branch and returns every pull
    /// request whose changes arrived in time.
    ///
    /// The result is de-duplicated and ordered by merge time; pull requests
    /// merged at the same instant keep the order in which they were added.
    pub fn attributed_pull_requests(&self) -> Vec<&'a PullRequest> {
        let mut attributed: Vec<&Edge<'a>> = Vec::new();
        let mut seen_prs: HashSet<&str> = HashSet::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();

        visited.insert(self.root_branch.as_str());
        queue.push_back(self.root_branch.as_str());

        while let Some(front) = queue.pop_front() {
            let Some(edges) = self.edges.get(front) else {
                continue;
            };
            let Some(cutoff) = self.watermarks.get(front) else {
                continue;
            };

            for edge in edges {
                if edge.merged_at > *cutoff {
                    continue;
                }

                if seen_prs.insert(edge.pr.id.as_str()) {
                    attributed.push(edge);
                }
                if visited.insert(edge.head_branch) {
                    queue.push_back(edge.head_branch);
                }
            }
        }

        attributed.sort_by_key(|edge| (edge.merged_at, edge.order));
        attributed.into_iter().map(|edge| edge.pr).collect()
    }
}

/// Returns the merged pull requests whose changes were carried by
/// `deployment`.
///
/// A branch with no merge history yields an empty result.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use dora_metrics_core::lineage::attribute_prs_to_deployment;
/// use dora_metrics_developer_platforms::models::{
///     Deployment, DeploymentProvenance, DeploymentStatus, PullRequest, PullRequestState,
/// };
///
/// let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let merged = |id: &str, base: &str, head: &str, days: i64| PullRequest {
///     id: id.to_string(),
///     number: 0,
///     title: String::new(),
///     repo_id: "web".to_string(),
///     base_branch: base.to_string(),
///     head_branch: head.to_string(),
///     state: PullRequestState::Merged,
///     created_at: t0,
///     state_changed_at: Some(t0 + Duration::days(days)),
///     first_commit_to_open: None,
///     first_response_time: None,
///     rework_time: None,
///     merge_time: None,
///     merge_to_deploy: None,
/// };
///
/// let prs = vec![merged("1", "main", "feature", 2), merged("2", "release", "main", 4)];
/// let deployment = Deployment {
///     id: "d".to_string(),
///     repo_id: "web".to_string(),
///     head_branch: "release".to_string(),
///     conducted_at: t0 + Duration::days(7),
///     status: DeploymentStatus::Success,
///     provenance: DeploymentProvenance::Workflow,
/// };
///
/// let attributed = attribute_prs_to_deployment(&prs, &deployment);
/// assert_eq!(attributed.len(), 2);
/// ```
#[instrument(
    skip(prs, deployment),
    fields(deployment = %deployment.id, branch = %deployment.head_branch)
)]
pub fn attribute_prs_to_deployment(
    prs: &[PullRequest],
    deployment: &Deployment,
) -> Vec<PullRequest> {
    let mut graph = LineageGraph::for_deployment(deployment);
    for pr in prs {
        graph.add_pull_request(pr);
    }

    let attributed: Vec<PullRequest> = graph
        .attributed_pull_requests()
        .into_iter()
        .cloned()
        .collect();

    debug!(
        edges = graph.edge_count(),
        attributed = attributed.len(),
        "Attributed pull requests to deployment"
    );

    attributed
}

/// Fills in `merge_to_deploy` for pull requests that reached a successful
/// deployment.
///
/// Deployments are processed in time order. Each deployment only considers
/// pull requests merged at or before it was conducted, so a merge that
/// happens after a deployment is never credited to it. A pull request is
/// credited to the first deployment that carried it. Values already
/// reported by the source are kept, as are pull requests that were never
/// deployed.
#[instrument(skip_all, fields(prs = prs.len(), deployments = deployments.len()))]
pub fn annotate_merge_to_deploy(
    prs: &[PullRequest],
    deployments: &[Deployment],
) -> Vec<PullRequest> {
    let mut ordered: Vec<&Deployment> = deployments
        .iter()
        .filter(|d| d.is_successful())
        .collect();
    ordered.sort_by_key(|d| d.conducted_at);

    let mut deployed_at: HashMap<String, DateTime<Utc>> = HashMap::new();
    for deployment in ordered {
        let merged_before: Vec<PullRequest> = prs
            .iter()
            .filter(|pr| {
                pr.merged_at()
                    .is_some_and(|merged| merged <= deployment.conducted_at)
            })
            .cloned()
            .collect();

        for pr in attribute_prs_to_deployment(&merged_before, deployment) {
            deployed_at.entry(pr.id).or_insert(deployment.conducted_at);
        }
    }

    prs.iter()
        .map(|pr| {
            let mut annotated = pr.clone();
            if annotated.merge_to_deploy.is_some() {
                return annotated;
            }
            if let (Some(deployed), Some(merged)) = (deployed_at.get(&pr.id), pr.merged_at()) {
                if *deployed >= merged {
                    annotated.merge_to_deploy = Some((*deployed - merged).num_seconds());
                }
            }
            annotated
        })
        .collect()
}
