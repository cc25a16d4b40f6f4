//! Validity-period formatting.

use chrono::{DateTime, NaiveDate};

use crate::config::RenderMode;

/// Reads `YYYY-MM-DD`, or the date part of an RFC 3339 / ISO 8601 timestamp.
pub fn parse_iso_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(input) {
        return Some(timestamp.date_naive());
    }
    // "2024-05-01T10:00:00" without an offset.
    input
        .get(..10)
        .filter(|_| input[10..].starts_with('T'))
        .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
}

/// `dd/mm/yyyy`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Equal dates collapse to one in print mode; otherwise
/// `"{start}{separator}{end}"`.
pub fn format_range(start: NaiveDate, end: NaiveDate, mode: RenderMode, separator: &str) -> String {
    if start == end && mode == RenderMode::Print {
        return format_date(start);
    }
    format!("{}{}{}", format_date(start), separator, format_date(end))
}
