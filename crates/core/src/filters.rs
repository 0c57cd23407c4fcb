//! # Event Filters
//!
//! Exclusion rules applied to normalised events before metrics are computed.
//! Filters are built from a [`FilterConfig`] and compile their regular
//! expressions once.

use std::collections::HashSet;

use dora_metrics_developer_platforms::models::{Deployment, Incident, IncidentType, PullRequest};
use regex::Regex;

use crate::config::FilterConfig;
use crate::errors::MetricsError;

#[cfg(test)]
#[path = "filters_tests.rs"]
mod tests;

/// Compiled form of a [`FilterConfig`].
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    excluded_pr_ids: HashSet<String>,
    base_branch_patterns: Vec<Regex>,
    incident_types: HashSet<IncidentType>,
    deployment_branch_patterns: Vec<Regex>,
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>, MetricsError> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|e| MetricsError::InvalidPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })
        })
        .collect()
}

fn matches_any(patterns: &[Regex], value: &str) -> bool {
    patterns.is_empty() || patterns.iter().any(|p| p.is_match(value))
}

impl EventFilter {
    /// Compiles the filter rules.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::InvalidPattern`] for the first pattern that is
    /// not a valid regular expression.
    ///
    /// # Examples
    ///
    /// ```
    /// use dora_metrics_core::config::FilterConfig;
    /// use dora_metrics_core::filters::EventFilter;
    ///
    /// let config = FilterConfig {
    ///     base_branch_patterns: vec!["[".to_string()],
    ///     ..Default::default()
    /// };
    ///
    /// assert!(EventFilter::from_config(&config).is_err());
    /// ```
    pub fn from_config(config: &FilterConfig) -> Result<Self, MetricsError> {
        Ok(Self {
            excluded_pr_ids: config.excluded_pr_ids.iter().cloned().collect(),
            base_branch_patterns: compile_patterns(&config.base_branch_patterns)?,
            incident_types: config.incident_types.iter().copied().collect(),
            deployment_branch_patterns: compile_patterns(&config.deployment_branch_patterns)?,
        })
    }

    /// Returns `true` if the pull request counts towards lead time.
    pub fn keeps_pull_request(&self, pr: &PullRequest) -> bool {
        !self.excluded_pr_ids.contains(&pr.id)
            && matches_any(&self.base_branch_patterns, &pr.base_branch)
    }

    /// Returns `true` if the deployment counts towards deployment metrics.
    pub fn keeps_deployment(&self, deployment: &Deployment) -> bool {
        matches_any(&self.deployment_branch_patterns, &deployment.head_branch)
    }

    /// Returns `true` if the incident counts towards recovery and failure rate.
    pub fn keeps_incident(&self, incident: &Incident) -> bool {
        self.incident_types.is_empty() || self.incident_types.contains(&incident.incident_type)
    }

    pub fn filter_pull_requests(&self, prs: &[PullRequest]) -> Vec<PullRequest> {
        prs.iter()
            .filter(|pr| self.keeps_pull_request(pr))
            .cloned()
            .collect()
    }

    pub fn filter_deployments(&self, deployments: &[Deployment]) -> Vec<Deployment> {
        deployments
            .iter()
            .filter(|d| self.keeps_deployment(d))
            .cloned()
            .collect()
    }

    pub fn filter_incidents(&self, incidents: &[Incident]) -> Vec<Incident> {
        incidents
            .iter()
            .filter(|i| self.keeps_incident(i))
            .cloned()
            .collect()
    }
}
