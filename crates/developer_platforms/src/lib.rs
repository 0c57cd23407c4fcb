//! # DORA Metrics Developer Platforms
//!
//! Normalised models for the events the metrics core consumes, and the
//! [`EventSource`] seam through which those events are obtained.
//!
//! Provider specific clients (GitHub, GitLab, Bitbucket, incident tools) live
//! outside this workspace. They fetch raw data, map it onto the
//! [`models`] shapes and expose it through an [`EventSource`]. The
//! [`snapshot::JsonSnapshotSource`] reads a previously exported batch from disk.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub mod errors;

pub mod models;

pub mod snapshot;

use errors::Error;
use models::EventSnapshot;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Trait for collaborators that supply normalised events for a time range.
///
/// Implementations are expected to have applied organisation, team and
/// date-range scoping already. Failures should be reported per source so
/// that one broken repository does not abort the metrics for a whole team.
///
/// # Example Implementation
///
/// ```rust,no_run
/// use async_trait::async_trait;
/// use chrono::{DateTime, Utc};
/// use dora_metrics_developer_platforms::{errors::Error, models::EventSnapshot, EventSource};
///
/// #[derive(Debug)]
/// struct InMemorySource {
///     snapshot: EventSnapshot,
/// }
///
/// #[async_trait]
/// impl EventSource for InMemorySource {
///     async fn fetch_events(
///         &self,
///         _from_time: DateTime<Utc>,
///         _to_time: DateTime<Utc>,
///     ) -> Result<EventSnapshot, Error> {
///         Ok(self.snapshot.clone())
///     }
/// }
/// ```
#[async_trait]
pub trait EventSource: Sync + Send {
    /// Fetches the pull requests, deployments and incidents relevant to the
    /// given time range.
    ///
    /// # Arguments
    ///
    /// * `from_time` - Start of the query range
    /// * `to_time` - End of the query range
    ///
    /// # Returns
    ///
    /// A `Result` containing the normalised events
    async fn fetch_events(
        &self,
        from_time: DateTime<Utc>,
        to_time: DateTime<Utc>,
    ) -> Result<EventSnapshot, Error>;
}
