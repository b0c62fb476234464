use crate::error::{parse_error, SyncResult};
use chrono::{DateTime, Duration, NaiveDateTime, SecondsFormat, Utc};

/// Format of the event source's timestamps
pub const SOURCE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse an event source timestamp
///
/// The source publishes naive timestamps; they are interpreted as UTC.
pub fn parse_start(value: &str) -> SyncResult<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, SOURCE_TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| parse_error(value, e))
}

/// Half-open window `[start, start + duration)`
pub fn window(
    start: DateTime<Utc>,
    duration: Duration,
) -> SyncResult<(DateTime<Utc>, DateTime<Utc>)> {
    let end = start
        .checked_add_signed(duration)
        .ok_or_else(|| parse_error(&to_rfc3339(start), "window end out of range"))?;
    Ok((start, end))
}

/// RFC3339 with a `Z` suffix, as the Calendar API expects
pub fn to_rfc3339(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}
