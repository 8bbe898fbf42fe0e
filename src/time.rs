//! Time arguments for the command line.

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};

use crate::duration::parse_duration;

/// Parse a time argument relative to `now`.
///
/// Accepts `now`, `now-<duration>` (e.g. `now-6h`), epoch seconds, or an
/// RFC 3339 timestamp in any offset. The result is always UTC.
pub fn parse_time(s: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let s = s.trim();

    if s == "now" {
        return Ok(now);
    }

    if let Some(ago) = s.strip_prefix("now-") {
        let ago = parse_duration(ago)?;
        let ago = chrono::Duration::from_std(ago).context("Duration too large")?;
        return now
            .checked_sub_signed(ago)
            .with_context(|| format!("Time out of range: {}", s));
    }

    if s.chars().all(|c| c.is_ascii_digit()) && !s.is_empty() {
        let secs: i64 = s.parse().context("Epoch seconds out of range")?;
        return Utc
            .timestamp_opt(secs, 0)
            .single()
            .with_context(|| format!("Epoch seconds out of range: {}", s));
    }

    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .with_context(|| format!("Unrecognized time: {}", s))
}
