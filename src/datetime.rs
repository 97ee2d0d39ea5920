//! Date/time helpers for values stored in SQLite.
//!
//! Timestamps are written either by `datetime('now')` (`YYYY-MM-DD HH:MM:SS`)
//! or by the application as RFC3339; both are read back as UTC.

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};

/// SQLite's native datetime format.
pub const SQLITE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a stored datetime string.
///
/// Unparseable values fall back to the current time so a single malformed
/// row never breaks a listing.
pub fn parse_datetime(s: &str) -> DateTime<Utc> {
    parse_datetime_opt(s).unwrap_or_else(Utc::now)
}

/// Parse a stored datetime string, returning `None` when it is malformed.
pub fn parse_datetime_opt(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, SQLITE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Format a UTC datetime the way SQLite's `datetime()` does.
pub fn to_sqlite(dt: &DateTime<Utc>) -> String {
    dt.format(SQLITE_FORMAT).to_string()
}

/// Current time truncated to whole seconds.
///
/// HTTP date headers carry second precision, so timestamps that feed
/// `Last-Modified` are stored without fractions.
pub fn now_secs() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}
