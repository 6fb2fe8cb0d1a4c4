//! Half-open time windows and the overlap predicate every collision query is built on.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// True iff `[a_start, a_end)` and `[b_start, b_end)` intersect.
///
/// A window ending exactly when another begins does not overlap it.
pub fn overlaps<T: PartialOrd>(a_start: T, a_end: T, b_start: T, b_end: T) -> bool {
    a_start < b_end && b_start < a_end
}

/// A non-empty `[start, end)` interval in UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    /// Returns `None` unless `end > start`
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (end > start).then_some(Self { start, end })
    }

    /// Window of the given length beginning at `start`
    pub fn starting_at(start: DateTime<Utc>, duration: Duration) -> Option<Self> {
        let end = start.checked_add_signed(duration)?;
        Self::new(start, end)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        overlaps(self.start, self.end, other.start, other.end)
    }

    pub(crate) fn start_secs(&self) -> i64 {
        self.start.timestamp()
    }

    pub(crate) fn end_secs(&self) -> i64 {
        self.end.timestamp()
    }
}
