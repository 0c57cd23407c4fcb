//! Event source backed by a JSON export of normalised events.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

use crate::errors::Error;
use crate::models::EventSnapshot;
use crate::EventSource;

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;

/// Reads an [`EventSnapshot`] from a JSON file.
///
/// Pull requests are kept when they were opened or changed state inside the
/// requested range, deployments when they were conducted inside it and
/// incidents when they were opened or resolved inside it. Events outside the
/// range are dropped so the source behaves like a date-scoped provider query.
#[derive(Debug, Clone)]
pub struct JsonSnapshotSource {
    path: PathBuf,
}

impl JsonSnapshotSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_snapshot(&self) -> Result<EventSnapshot, Error> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::SnapshotNotFound(self.path.display().to_string()));
            }
            Err(e) => return Err(Error::SnapshotReadFailed(e)),
        };

        serde_json::from_str(&content).map_err(|e| Error::InvalidSnapshot(e.to_string()))
    }
}

#[async_trait]
impl EventSource for JsonSnapshotSource {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn fetch_events(
        &self,
        from_time: DateTime<Utc>,
        to_time: DateTime<Utc>,
    ) -> Result<EventSnapshot, Error> {
        let snapshot = self.read_snapshot().await?;
        debug!(
            pull_requests = snapshot.pull_requests.len(),
            deployments = snapshot.deployments.len(),
            incidents = snapshot.incidents.len(),
            "Loaded event snapshot"
        );

        let in_range = |ts: &DateTime<Utc>| *ts >= from_time && *ts <= to_time;

        let pull_requests = snapshot
            .pull_requests
            .into_iter()
            .filter(|pr| in_range(&pr.created_at) || pr.state_changed_at.iter().any(in_range))
            .collect::<Vec<_>>();

        let deployments = snapshot
            .deployments
            .into_iter()
            .filter(|d| in_range(&d.conducted_at))
            .collect::<Vec<_>>();

        let incidents = snapshot
            .incidents
            .into_iter()
            .filter(|i| in_range(&i.creation_date) || i.resolved_date.iter().any(in_range))
            .collect::<Vec<_>>();

        info!(
            pull_requests = pull_requests.len(),
            deployments = deployments.len(),
            incidents = incidents.len(),
            "Selected events for range"
        );

        Ok(EventSnapshot {
            pull_requests,
            deployments,
            incidents,
        })
    }
}
