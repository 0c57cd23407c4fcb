//! # Time Buckets
//!
//! This module groups timestamped records into boundary-aligned windows
//! (days, Monday-aligned weeks, or calendar months) and fills the windows
//! that received no records.
//!
//! Trend series are built on top of these maps, so every bucket between the
//! first and last boundary is always present, even when it is empty.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Datelike, Duration, Months, NaiveTime, Utc};
use dora_metrics_developer_platforms::models::{Deployment, Incident, PullRequest};
use serde::{Deserialize, Serialize};

use crate::errors::MetricsError;
use crate::interval::Interval;

#[cfg(test)]
#[path = "buckets_tests.rs"]
mod tests;

/// The width of a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// Midnight-aligned days
    Daily,
    /// Weeks starting on Monday at midnight
    Weekly,
    /// Calendar months starting on the 1st at midnight
    Monthly,
}

impl Granularity {
    /// Returns the boundary of the bucket that contains `ts`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use dora_metrics_core::buckets::Granularity;
    ///
    /// // Thursday afternoon
    /// let ts = Utc.with_ymd_and_hms(2024, 5, 16, 15, 30, 0).unwrap();
    ///
    /// assert_eq!(Granularity::Daily.floor(ts), Utc.with_ymd_and_hms(2024, 5, 16, 0, 0, 0).unwrap());
    /// assert_eq!(Granularity::Weekly.floor(ts), Utc.with_ymd_and_hms(2024, 5, 13, 0, 0, 0).unwrap());
    /// assert_eq!(Granularity::Monthly.floor(ts), Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());
    /// ```
    pub fn floor(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        let date = ts.date_naive();
        let start = match self {
            Granularity::Daily => date,
            Granularity::Weekly => {
                date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
            }
            Granularity::Monthly => date - Duration::days(i64::from(date.day0())),
        };

        start.and_time(NaiveTime::MIN).and_utc()
    }

    /// Returns the boundary following `boundary`, or `None` past the end of
    /// the representable calendar.
    pub fn next(&self, boundary: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Granularity::Daily => boundary.checked_add_signed(Duration::days(1)),
            Granularity::Weekly => boundary.checked_add_signed(Duration::weeks(1)),
            Granularity::Monthly => boundary.checked_add_months(Months::new(1)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Daily => "daily",
            Granularity::Weekly => "weekly",
            Granularity::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The value of a named record field as seen by the bucketing engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Timestamp(DateTime<Utc>),
    Text(String),
    Missing,
}

/// A record whose fields can be looked up by name for bucketing.
///
/// Callers choose which timestamp a series is keyed on (for example an
/// incident's `creation_date` or its `resolved_date`), so the field is
/// selected at run time rather than fixed per type.
pub trait Bucketable {
    /// Identifier used in error messages.
    fn record_id(&self) -> &str;

    /// Returns the value of the named field.
    fn field(&self, name: &str) -> FieldValue;
}

impl Bucketable for PullRequest {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> FieldValue {
        match name {
            "created_at" => FieldValue::Timestamp(self.created_at),
            "state_changed_at" => self
                .state_changed_at
                .map_or(FieldValue::Missing, FieldValue::Timestamp),
            "id" => FieldValue::Text(self.id.clone()),
            "title" => FieldValue::Text(self.title.clone()),
            "repo_id" => FieldValue::Text(self.repo_id.clone()),
            "base_branch" => FieldValue::Text(self.base_branch.clone()),
            "head_branch" => FieldValue::Text(self.head_branch.clone()),
            _ => FieldValue::Missing,
        }
    }
}

impl Bucketable for Deployment {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> FieldValue {
        match name {
            "conducted_at" => FieldValue::Timestamp(self.conducted_at),
            "id" => FieldValue::Text(self.id.clone()),
            "repo_id" => FieldValue::Text(self.repo_id.clone()),
            "head_branch" => FieldValue::Text(self.head_branch.clone()),
            _ => FieldValue::Missing,
        }
    }
}

impl Bucketable for Incident {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> FieldValue {
        match name {
            "creation_date" => FieldValue::Timestamp(self.creation_date),
            "resolved_date" => self
                .resolved_date
                .map_or(FieldValue::Missing, FieldValue::Timestamp),
            "id" => FieldValue::Text(self.id.clone()),
            "title" => FieldValue::Text(self.title.clone()),
            _ => FieldValue::Missing,
        }
    }
}

fn timestamp_of<T: Bucketable>(item: &T, field: &str) -> Result<DateTime<Utc>, MetricsError> {
    match item.field(field) {
        FieldValue::Timestamp(ts) => Ok(ts),
        _ => Err(MetricsError::NonTemporalField {
            field: field.to_string(),
            record: item.record_id().to_string(),
        }),
    }
}

fn empty_buckets<T>(
    from_time: DateTime<Utc>,
    to_time: DateTime<Utc>,
    granularity: Granularity,
) -> BTreeMap<DateTime<Utc>, Vec<T>> {
    let mut buckets = BTreeMap::new();
    let mut current = Some(granularity.floor(from_time));
    while let Some(boundary) = current.filter(|b| *b <= to_time) {
        buckets.insert(boundary, Vec::new());
        current = granularity.next(boundary);
    }

    buckets
}

fn bucket_stamped<T: Clone>(
    stamped: Vec<(DateTime<Utc>, &T)>,
    interval: &Interval,
    granularity: Granularity,
) -> BTreeMap<DateTime<Utc>, Vec<T>> {
    let from_time = stamped
        .iter()
        .map(|(ts, _)| *ts)
        .fold(interval.from_time(), Ord::min);
    let to_time = stamped
        .iter()
        .map(|(ts, _)| *ts)
        .fold(interval.to_time(), Ord::max);

    let mut buckets = empty_buckets(from_time, to_time, granularity);
    for (ts, item) in stamped {
        buckets
            .entry(granularity.floor(ts))
            .or_default()
            .push(item.clone());
    }

    buckets
}

/// Groups `items` into aligned buckets keyed by bucket start.
///
/// The range is widened so that it covers `interval` and every item's
/// `timestamp_field`. Every boundary in the widened range is present in the
/// result, so a caller passing items slightly outside the nominal interval
/// still sees them.
///
/// # Errors
///
/// Returns [`MetricsError::NonTemporalField`] if any item's field is not a
/// timestamp. An unset optional timestamp counts as not a timestamp.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use dora_metrics_core::buckets::{generate_expanded_buckets, Granularity};
/// use dora_metrics_core::interval::Interval;
/// use dora_metrics_developer_platforms::models::{Deployment, DeploymentProvenance, DeploymentStatus};
///
/// let deployment = Deployment {
///     id: "d1".to_string(),
///     repo_id: "web".to_string(),
///     head_branch: "main".to_string(),
///     conducted_at: Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap(),
///     status: DeploymentStatus::Success,
///     provenance: DeploymentProvenance::Workflow,
/// };
///
/// let interval = Interval::new(
///     Utc.with_ymd_and_hms(2024, 5, 13, 0, 0, 0).unwrap(),
///     Utc.with_ymd_and_hms(2024, 5, 26, 0, 0, 0).unwrap(),
/// ).unwrap();
///
/// let buckets = generate_expanded_buckets(&[deployment], &interval, "conducted_at", Granularity::Weekly).unwrap();
/// assert_eq!(buckets.len(), 2);
/// assert_eq!(buckets.values().next().unwrap().len(), 1);
/// ```
pub fn generate_expanded_buckets<T: Bucketable + Clone>(
    items: &[T],
    interval: &Interval,
    timestamp_field: &str,
    granularity: Granularity,
) -> Result<BTreeMap<DateTime<Utc>, Vec<T>>, MetricsError> {
    let stamped = items
        .iter()
        .map(|item| timestamp_of(item, timestamp_field).map(|ts| (ts, item)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(bucket_stamped(stamped, interval, granularity))
}

/// Same as [`generate_expanded_buckets`], with the timestamp taken from a
/// typed accessor instead of a field name. Cannot fail.
pub fn expand_buckets_by<T, F>(
    items: &[T],
    interval: &Interval,
    granularity: Granularity,
    timestamp: F,
) -> BTreeMap<DateTime<Utc>, Vec<T>>
where
    T: Clone,
    F: Fn(&T) -> DateTime<Utc>,
{
    let stamped = items.iter().map(|item| (timestamp(item), item)).collect();
    bucket_stamped(stamped, interval, granularity)
}

/// Ensures every Monday between the weeks of `interval`'s bounds has an entry.
///
/// Existing entries are kept unchanged, including ones outside the interval.
/// Missing weeks get `default_factory()`. To get "no value" for missing
/// weeks, use an `Option` value type with `|| None`.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use chrono::{TimeZone, Utc};
/// use dora_metrics_core::buckets::fill_missing_week_buckets;
/// use dora_metrics_core::interval::Interval;
///
/// let monday = Utc.with_ymd_and_hms(2024, 5, 13, 0, 0, 0).unwrap();
/// let mut counts = BTreeMap::new();
/// counts.insert(monday, 4usize);
///
/// let interval = Interval::new(monday, Utc.with_ymd_and_hms(2024, 6, 2, 0, 0, 0).unwrap()).unwrap();
/// let filled = fill_missing_week_buckets(counts, &interval, || 0usize);
///
/// assert_eq!(filled.values().copied().collect::<Vec<_>>(), vec![4, 0, 0]);
/// ```
pub fn fill_missing_week_buckets<T, F>(
    mut week_map: BTreeMap<DateTime<Utc>, T>,
    interval: &Interval,
    default_factory: F,
) -> BTreeMap<DateTime<Utc>, T>
where
    F: Fn() -> T,
{
    let last_week = start_of_week(interval.to_time());
    let mut current = Some(start_of_week(interval.from_time()));
    while let Some(week) = current.filter(|w| *w <= last_week) {
        week_map.entry(week).or_insert_with(&default_factory);
        current = Granularity::Weekly.next(week);
    }

    week_map
}

/// Monday 00:00 UTC of the week containing `ts`.
pub fn start_of_week(ts: DateTime<Utc>) -> DateTime<Utc> {
    Granularity::Weekly.floor(ts)
}
