//! Query time ranges.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A `[from, until]` window, always held in UTC.
///
/// Hosts may hand over local times; every constructor normalizes to UTC so
/// the epoch seconds sent upstream never depend on the caller's zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Start of the window.
    pub from: DateTime<Utc>,
    /// End of the window.
    pub until: DateTime<Utc>,
}

impl TimeRange {
    /// Create a range from two instants in any time zone.
    pub fn new<Tz: TimeZone>(from: DateTime<Tz>, until: DateTime<Tz>) -> Self {
        Self {
            from: from.with_timezone(&Utc),
            until: until.with_timezone(&Utc),
        }
    }

    /// Create a range from epoch seconds.
    ///
    /// Out-of-range values clamp to the Unix epoch.
    pub fn from_secs(from: i64, until: i64) -> Self {
        Self {
            from: Utc.timestamp_opt(from, 0).single().unwrap_or_default(),
            until: Utc.timestamp_opt(until, 0).single().unwrap_or_default(),
        }
    }

    /// The window ending now and reaching back `secs` seconds.
    ///
    /// Returns `None` when the start would fall outside the representable
    /// date range.
    pub fn last_secs(secs: i64) -> Option<Self> {
        let until = Utc::now();
        let from = until.checked_sub_signed(chrono::Duration::try_seconds(secs)?)?;
        Some(Self { from, until })
    }

    /// Start of the window in epoch seconds.
    pub fn from_epoch(&self) -> i64 {
        self.from.timestamp()
    }

    /// End of the window in epoch seconds.
    pub fn until_epoch(&self) -> i64 {
        self.until.timestamp()
    }

    /// Length of the window in seconds (never negative).
    pub fn span_secs(&self) -> i64 {
        (self.until_epoch() - self.from_epoch()).max(0)
    }
}
