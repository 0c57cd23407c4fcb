//! # Intervals
//!
//! A closed time range with the small algebra the metrics core needs:
//! overlap tests, merging, and subtracting a covering set to find the gaps
//! that are still missing.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::MetricsError;

#[cfg(test)]
#[path = "interval_tests.rs"]
mod tests;

/// An immutable time range `[from_time, to_time]`.
///
/// The only way to build one is through [`Interval::new`], which rejects
/// ranges that end before they start.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use dora_metrics_core::interval::Interval;
///
/// let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let interval = Interval::new(from, from + Duration::days(7)).unwrap();
///
/// assert_eq!(interval.duration(), Duration::days(7));
/// assert!(Interval::new(from, from - Duration::seconds(1)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Interval {
    from_time: DateTime<Utc>,
    to_time: DateTime<Utc>,
}

impl Interval {
    pub fn new(from_time: DateTime<Utc>, to_time: DateTime<Utc>) -> Result<Self, MetricsError> {
        if to_time < from_time {
            return Err(MetricsError::InvalidInterval { from_time, to_time });
        }

        Ok(Self { from_time, to_time })
    }

    pub fn from_time(&self) -> DateTime<Utc> {
        self.from_time
    }

    pub fn to_time(&self) -> DateTime<Utc> {
        self.to_time
    }

    pub fn duration(&self) -> Duration {
        self.to_time - self.from_time
    }

    /// Returns `true` if `ts` lies inside the closed range.
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.from_time <= ts && ts <= self.to_time
    }

    /// Returns `true` if either interval starts inside the other one.
    ///
    /// Spans are treated as half-open on the right for this test, so two
    /// intervals that only touch at an end point do not overlap.
    pub fn overlaps(&self, other: &Interval) -> bool {
        let starts_inside = |a: &Interval, b: &Interval| {
            a.from_time <= b.from_time && b.from_time < a.to_time
        };

        starts_inside(self, other) || starts_inside(other, self)
    }

    /// Returns the interval spanning both `self` and `other`.
    ///
    /// The result only describes a contiguous range when the two overlap or
    /// touch.
    pub fn merge(&self, other: &Interval) -> Interval {
        Interval {
            from_time: self.from_time.min(other.from_time),
            to_time: self.to_time.max(other.to_time),
        }
    }

    /// Sorts the intervals and merges consecutive overlapping ones in a
    /// single pass.
    pub fn merge_intervals(intervals: &[Interval]) -> Vec<Interval> {
        let mut sorted = intervals.to_vec();
        sorted.sort();

        let mut merged: Vec<Interval> = Vec::with_capacity(sorted.len());
        for interval in sorted {
            match merged.last_mut() {
                Some(last) if last.overlaps(&interval) => *last = last.merge(&interval),
                _ => merged.push(interval),
            }
        }

        merged
    }

    /// Returns the parts of `self` that are not covered by `covering`.
    ///
    /// The covering set is merged first; the result is ordered by start time
    /// and never contains empty intervals.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{Duration, TimeZone, Utc};
    /// use dora_metrics_core::interval::Interval;
    ///
    /// let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    /// let day = |n: i64| t0 + Duration::days(n);
    ///
    /// let full = Interval::new(day(0), day(10)).unwrap();
    /// let covered = [Interval::new(day(2), day(4)).unwrap()];
    ///
    /// let gaps = full.get_remaining_intervals(&covered);
    /// assert_eq!(gaps, vec![
    ///     Interval::new(day(0), day(2)).unwrap(),
    ///     Interval::new(day(4), day(10)).unwrap(),
    /// ]);
    /// ```
    pub fn get_remaining_intervals(&self, covering: &[Interval]) -> Vec<Interval> {
        let mut remaining = Vec::new();
        let mut cursor = self.from_time;

        for cover in Interval::merge_intervals(covering) {
            if cover.to_time <= cursor {
                continue;
            }
            if cover.from_time >= self.to_time {
                break;
            }
            if cover.from_time > cursor {
                remaining.push(Interval {
                    from_time: cursor,
                    to_time: cover.from_time,
                });
            }
            cursor = cover.to_time;
        }

        if cursor < self.to_time {
            remaining.push(Interval {
                from_time: cursor,
                to_time: self.to_time,
            });
        }

        remaining
    }
}

/// Deserializes through [`Interval::new`] so the range invariant holds for
/// configuration and request payloads too.
impl<'de> Deserialize<'de> for Interval {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawInterval {
            from_time: DateTime<Utc>,
            to_time: DateTime<Utc>,
        }

        let raw = RawInterval::deserialize(deserializer)?;
        Interval::new(raw.from_time, raw.to_time).map_err(serde::de::Error::custom)
    }
}
