//! Subcommand implementations.

pub mod events;
pub mod health;
pub mod images;
pub mod login;
pub mod logout;
pub mod matching;
pub mod stats;
pub mod whoami;

use chrono::{DateTime, NaiveDate, Utc};

/// Default backend URL for commands that work without a session.
pub const DEFAULT_API: &str = "http://localhost:8000";

/// Parse an RFC 3339 timestamp or a plain `YYYY-MM-DD` date (midnight UTC).
pub fn parse_date(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Ok(datetime.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| datetime.and_utc())
        .ok_or_else(|| format!("expected YYYY-MM-DD or RFC 3339, got '{}'", value))
}
