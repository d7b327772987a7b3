use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;

/// Parse an IANA timezone name such as `America/Chicago`
pub fn parse_timezone(name: &str) -> Option<Tz> {
    name.trim().parse::<Tz>().ok()
}

/// Calendar date of a Unix timestamp as seen in the given timezone
pub fn local_date_from_timestamp(timestamp: i64, tz: Tz) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp(timestamp, 0).map(|dt| dt.with_timezone(&tz).date_naive())
}

/// Whether an import is due, given the time of the last successful one
pub fn is_import_due(last_import: Option<DateTime<Utc>>, now: DateTime<Utc>, interval: Duration) -> bool {
    match last_import {
        None => true,
        // A timestamp from the future means the clock went backwards
        Some(last) if last > now => true,
        Some(last) => now.signed_duration_since(last) >= interval,
    }
}

/// Convert a stored Unix timestamp back into a UTC datetime
pub fn from_unix(timestamp: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
}
