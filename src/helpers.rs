//! Shared helpers for timestamp parsing and half-hour alignment.
//!
//! BMRS publishes RFC 3339 strings (`2025-01-15T12:30:00Z`), but CSV exports
//! saved by spreadsheet or dataframe tools often turn these into
//! `2025-01-15 12:30:00+00:00` or drop the offset entirely. All of them are
//! normalised to `DateTime<Utc>`; a string without an offset is taken as UTC.

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Europe::London;

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%d %H:%M:%S%.f%:z"];
const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parse a source timestamp into UTC. Returns `None` for anything unrecognised.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in &OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for fmt in &NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    None
}

/// Floor a datetime to the start of its half-hour settlement period.
///
/// UK clock offsets are whole hours, so flooring in UTC gives the same
/// boundaries as flooring in Europe/London.
pub(crate) fn floor_to_half_hour(dt: DateTime<Utc>) -> DateTime<Utc> {
    let into_period = i64::from(dt.minute() % 30) * 60 + i64::from(dt.second());
    dt - Duration::seconds(into_period) - Duration::nanoseconds(i64::from(dt.nanosecond()))
}

/// Convert to UK local time (GMT/BST) with an explicit offset, for display.
pub(crate) fn to_london(dt: DateTime<Utc>) -> DateTime<FixedOffset> {
    dt.with_timezone(&London).fixed_offset()
}

/// Round to one decimal place for display.
pub(crate) fn round_1dp(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
