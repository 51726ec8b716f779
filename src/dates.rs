//! Lenient parsing of user-supplied departure dates.

use chrono::NaiveDate;

const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Parses `2026-02-07`, `07/02/2026` (day first), `7 Feb 2026` and
/// `Saturday 7th February 2026`. Blank or unrecognised input is `None`.
pub fn parse_ship_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(date) = ["%Y-%m-%d", "%d/%m/%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
    {
        return Some(date);
    }

    let normalized = trimmed
        .replace(',', " ")
        .split_whitespace()
        .filter(|token| !is_weekday(token))
        .map(strip_ordinal)
        .collect::<Vec<_>>()
        .join(" ");

    ["%d %b %Y", "%d %B %Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&normalized, fmt).ok())
}

fn is_weekday(token: &str) -> bool {
    let token = token.to_lowercase();
    token.len() >= 3 && WEEKDAYS.iter().any(|day| day.starts_with(token.as_str()))
}

fn strip_ordinal(token: &str) -> &str {
    let lower = token.to_ascii_lowercase();
    for suffix in ["st", "nd", "rd", "th"] {
        if lower.ends_with(suffix) {
            let digits = &token[..token.len() - suffix.len()];
            if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                return digits;
            }
        }
    }
    token
}
