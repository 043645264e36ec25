//! Date helper functions

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fmt::Write;

/// Parse an ISO-like date string as written in front-matter
///
/// Offsets in RFC 3339 strings are dropped: the wall-clock date the author
/// wrote is what gets displayed and compared.
pub fn parse_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();

    let datetime_formats = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
        "%Y/%m/%d %H:%M",
    ];
    for fmt in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }

    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.naive_local())
}

/// Format a date using a Moment.js-compatible format string
///
/// # Examples
/// ```ignore
/// format_date(&date, "MMMM DD, YYYY") // -> "January 01, 2021"
/// ```
///
/// A format chrono cannot render is returned as written.
pub fn format_date(date: &NaiveDateTime, format: &str) -> String {
    let chrono_format = moment_to_chrono_format(format);
    let mut out = String::new();
    if write!(out, "{}", date.format(&chrono_format)).is_err() {
        tracing::warn!("Invalid date format: {}", format);
        return format.to_string();
    }
    out
}

/// Convert Moment.js format to chrono format
fn moment_to_chrono_format(format: &str) -> String {
    // Longest patterns first within each letter so "MMMM" is not eaten by "MM"
    let replacements = [
        ("YYYY", "%Y"),
        ("YY", "%y"),
        ("MMMM", "%B"),
        ("MMM", "%b"),
        ("MM", "%m"),
        ("DDDD", "%j"),
        ("DD", "%d"),
        ("HH", "%H"),
        ("hh", "%I"),
        ("mm", "%M"),
        ("ss", "%S"),
        ("dddd", "%A"),
        ("ddd", "%a"),
    ];

    // Literal percent signs must not reach chrono as specifiers
    let mut result = format.replace('%', "%%");
    for (from, to) in replacements {
        result = result.replace(from, to);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2021, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(parse_date("2021-01-01"), Some(expected));
        assert_eq!(parse_date(" 2021/01/01 "), Some(expected));
        assert_eq!(parse_date("2021-01-01T00:00:00Z"), Some(expected));
        assert_eq!(parse_date("2021-01-01T00:00:00.000+02:00"), Some(expected));

        let with_time = parse_date("2024-01-15 10:30:00").unwrap();
        assert_eq!(with_time.format("%H:%M").to_string(), "10:30");
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date("2021-13-01"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_format_date() {
        let date = parse_date("2021-01-05").unwrap();
        assert_eq!(format_date(&date, "MMMM DD, YYYY"), "January 05, 2021");
        assert_eq!(format_date(&date, "YYYY/MM/DD"), "2021/01/05");
    }

    #[test]
    fn test_format_date_literal_percent() {
        let date = parse_date("2021-01-05").unwrap();
        assert_eq!(format_date(&date, "DD % MM"), "05 % 01");
        assert_eq!(format_date(&date, "100%"), "100%");
        assert_eq!(moment_to_chrono_format("%d"), "%%d");
    }

    #[test]
    fn test_moment_to_chrono() {
        assert_eq!(moment_to_chrono_format("YYYY-MM-DD"), "%Y-%m-%d");
        assert_eq!(moment_to_chrono_format("HH:mm:ss"), "%H:%M:%S");
        assert_eq!(moment_to_chrono_format("MMMM DD, YYYY"), "%B %d, %Y");
    }
}
