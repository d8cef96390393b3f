//! Timestamp sanitization.
//!
//! Feeds deliver timestamps in a handful of shapes: RFC 3339, space-separated
//! date and time, with or without a numeric offset, sometimes with a trailing
//! `UTC`/`GMT` marker. Every accepted value is converted to UTC and rendered
//! as `YYYY-MM-DDTHH:MM:SS[.ffffff]+00:00`.
//!
//! Parsing is strict: anything that does not match a known shape is an error.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};

use crate::error::ModelError;

/// Formats carrying an explicit numeric offset. `%#z` accepts `+HH`,
/// `+HHMM` and `+HH:MM`.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%.f %#z",
    "%Y-%m-%dT%H:%M%#z",
    "%Y-%m-%d %H:%M%#z",
];

/// Formats without an offset; values are taken as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const UTC_MARKERS: &[&str] = &["UTC", "GMT", "Z"];

/// Parses a timestamp into UTC.
pub fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }

    let (body, utc_marker) = strip_utc_marker(trimmed);
    if body.is_empty() {
        return None;
    }

    for format in OFFSET_FORMATS {
        if let Ok(parsed) = DateTime::<FixedOffset>::parse_from_str(body, format) {
            return Some(parsed.with_timezone(&Utc));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(body, format) {
            return Some(parsed.and_utc());
        }
    }

    if !utc_marker && let Ok(date) = NaiveDate::parse_from_str(body, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }

    None
}

/// Renders a UTC timestamp in the canonical event format.
pub fn format_datetime(value: &DateTime<Utc>) -> String {
    if value.timestamp_subsec_nanos() == 0 {
        value.format("%Y-%m-%dT%H:%M:%S+00:00").to_string()
    } else {
        value.format("%Y-%m-%dT%H:%M:%S%.6f+00:00").to_string()
    }
}

/// Parses and re-renders a timestamp, failing on anything unparseable.
pub fn sanitize_datetime(value: &str) -> Result<String, ModelError> {
    parse_datetime(value)
        .map(|parsed| format_datetime(&parsed))
        .ok_or_else(|| ModelError::InvalidDateTime(value.to_string()))
}

fn strip_utc_marker(value: &str) -> (&str, bool) {
    for marker in UTC_MARKERS {
        if let Some(body) = value.strip_suffix(marker) {
            // A bare trailing "Z" must follow a digit; "UTC"/"GMT" may be
            // separated by a space.
            if *marker == "Z" && !body.ends_with(|c: char| c.is_ascii_digit()) {
                continue;
            }
            return (body.trim_end(), true);
        }
    }
    (value, false)
}
