//! Date parsing and rendering

use chrono::{Datelike, NaiveDate};
use shared_types::DatePattern;

/// Input formats accepted for date values, tried in order
const INPUT_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%Y/%m/%d",
];

/// Parse a calendar date from the forms users and stores produce.
///
/// RFC 3339 timestamps are accepted and reduced to their date.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    for format in INPUT_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(input, format) {
            return Some(date);
        }
    }

    // 2026-01-05T10:00:00Z
    chrono::DateTime::parse_from_rfc3339(input)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Render a date with the given pattern
pub fn format_date(date: NaiveDate, pattern: DatePattern) -> String {
    match pattern {
        DatePattern::Long => date.format("%B %-d, %Y").to_string(),
        DatePattern::LongOrdinal => format!(
            "{} day of {}, {}",
            ordinal(date.day()),
            date.format("%B"),
            date.year()
        ),
        DatePattern::DayMonthYear => date.format("%-d %B %Y").to_string(),
        DatePattern::NumericMonthFirst => date.format("%m/%d/%Y").to_string(),
        DatePattern::NumericDayFirst => date.format("%d/%m/%Y").to_string(),
        DatePattern::Iso => date.format("%Y-%m-%d").to_string(),
    }
}

/// 1st, 2nd, 3rd, 4th, 11th, 21st
pub fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}
