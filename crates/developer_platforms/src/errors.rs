#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Error types for event source operations.
///
/// This enum represents the errors that can occur while fetching normalised
/// events from a developer platform or from a stored snapshot. Each variant
/// carries enough context to tell which source failed so that the ingestion
/// layer can isolate the failure to a single repository or provider.
///
/// # Examples
///
/// ```rust
/// use dora_metrics_developer_platforms::errors::Error;
///
/// let not_found = Error::SnapshotNotFound("events.json".to_string());
/// assert_eq!(not_found.to_string(), "Event snapshot not found: events.json");
/// ```
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The event snapshot file does not exist.
    ///
    /// The string parameter contains the path that was looked up.
    #[error("Event snapshot not found: {0}")]
    SnapshotNotFound(String),

    /// The event snapshot could not be read.
    ///
    /// This wraps I/O failures other than a missing file, for example
    /// permission problems.
    #[error("Failed to read event snapshot: {0}")]
    SnapshotReadFailed(#[from] std::io::Error),

    /// The event snapshot is not valid JSON or does not match the model.
    ///
    /// The string parameter contains the parser message, which includes the
    /// line and column of the failure.
    #[error("Invalid event snapshot: {0}")]
    InvalidSnapshot(String),

    /// The provider returned data that could not be normalised.
    ///
    /// Parameters: provider name, details of the failure
    #[error("Failed to normalise events from {0}: {1}")]
    NormalisationFailed(String, String),
}
