//! Timestamp parsing and display helpers shared by the validator and clients.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Naive date-time layouts accepted in addition to RFC 3339 / RFC 2822.
/// A value without an offset is read as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Minute-precision layouts carrying an explicit offset (`+02:00` or `+0200`).
const ZONED_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M%:z", "%Y-%m-%dT%H:%M%z"];

/// Parse an ISO-8601 style timestamp into a UTC instant.
///
/// Accepts full RFC 3339 (`2024-01-01T00:00:00Z`, with offsets), date-times
/// without seconds (`2024-01-01T10:30Z`, `2024-01-01T10:30+02:00`), naive
/// date-times, calendar dates (`2024-01-01`), reduced-precision dates
/// (`2024-01`, `2024`) and RFC 2822. Dates are read as midnight UTC.
/// Returns `None` for anything that does not name a real calendar instant,
/// including out-of-range components such as `2024-02-30`.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ZONED_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    let naive_part = value
        .strip_suffix('Z')
        .or_else(|| value.strip_suffix('z'))
        .unwrap_or(value);
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(naive_part, format) {
            return Some(naive.and_utc());
        }
    }

    if let Some(date) = parse_date(value) {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }

    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// `YYYY-MM-DD`, `YYYY-MM` (first of the month) or `YYYY` (January 1st).
fn parse_date(value: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }

    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    match value.split_once('-') {
        Some((year, month)) if year.len() == 4 && month.len() == 2 && digits(year) && digits(month) => {
            NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)
        }
        None if value.len() == 4 && digits(value) => NaiveDate::from_ymd_opt(value.parse().ok()?, 1, 1),
        _ => None,
    }
}

/// Current time as an RFC 3339 string with millisecond precision, e.g.
/// `2024-01-01T00:00:00.000Z`.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Format a timestamp for display, e.g. `Jan 5, 2024`.
pub fn format_date(value: &str) -> Option<String> {
    parse_timestamp(value).map(|dt| dt.format("%b %-d, %Y").to_string())
}

/// Format a value with its unit, e.g. `3 km`.
pub fn format_value(value: f64, unit: &str) -> String {
    format!("{} {}", value, unit)
}

/// Percentage of `target` reached by `current`, capped at 100.
///
/// A non-positive target has no meaningful progress and yields 0.
pub fn progress(current: f64, target: f64) -> f64 {
    if target <= 0.0 {
        return 0.0;
    }
    ((current / target) * 100.0).min(100.0)
}

/// Format a percentage rounded to the nearest whole number, e.g. `42%`.
pub fn format_percentage(value: f64) -> String {
    format!("{}%", value.round() as i64)
}
