//! The note record and how its timestamps are written to and read from the store.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Format SQLite uses for `CURRENT_TIMESTAMP` defaults (always UTC).
const SQLITE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A user-authored note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Assigned by the store on insert; never changes.
    pub id: i64,
    pub title: String,
    pub content: String,
    /// Logical date the user assigned to the note (not an audit timestamp).
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Renders a timestamp the way the store persists it: RFC 3339, UTC, millisecond precision.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses a stored or user-supplied timestamp.
///
/// Accepts RFC 3339 (any offset, normalized to UTC), SQLite's `YYYY-MM-DD HH:MM:SS`
/// as written by `CURRENT_TIMESTAMP`, and a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, SQLITE_TIMESTAMP_FORMAT) {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Drops sub-millisecond precision so in-memory values compare equal to what the store returns.
pub fn truncate_to_millis(ts: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ts.timestamp_millis()).unwrap_or(ts)
}
