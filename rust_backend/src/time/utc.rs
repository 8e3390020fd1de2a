//! ISO-8601 UTC formatting and calendar helpers.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Timelike, Utc};

/// Wire format of provider event timestamps, e.g. `2025-03-29T08:12:40Z`.
pub const ISO_UTC_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parse a `YYYY-MM-DDTHH:MM:SSZ` timestamp.
pub fn parse_utc(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(value.trim(), ISO_UTC_FORMAT).map(|naive| naive.and_utc())
}

/// Format an instant as `YYYY-MM-DDTHH:MM:SSZ`.
pub fn format_utc(dt: &DateTime<Utc>) -> String {
    dt.format(ISO_UTC_FORMAT).to_string()
}

/// Format an instant without a zone designator, as used by the `datetime` column.
pub fn format_naive(dt: &DateTime<Utc>) -> String {
    dt.format(NAIVE_FORMAT).to_string()
}

/// Drop seconds and sub-second parts.
pub fn truncate_to_minute(dt: &DateTime<Utc>) -> DateTime<Utc> {
    dt.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(*dt)
}

/// Midnight UTC at the start of `date`.
pub fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Inclusive sequence of calendar dates. Empty when `end < start`.
pub fn day_range(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    let days = (end - start).num_days();
    (0..=days).filter_map(move |offset| start.checked_add_signed(Duration::days(offset)))
}
