//! Timestamp utilities

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current time as an ISO 8601 string (millisecond precision, `Z` suffix)
pub fn now_iso() -> String {
    to_iso(now())
}

/// Format a timestamp the way review records carry it
pub fn to_iso(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Convert Unix epoch seconds to an ISO 8601 string
pub fn epoch_seconds_to_iso(seconds: i64) -> Option<String> {
    DateTime::from_timestamp(seconds, 0).map(to_iso)
}

/// Parse a review timestamp
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` (taken as UTC) and bare dates.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
