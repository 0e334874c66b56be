use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref RELATIVE_RE: Regex =
        Regex::new(r"^(\d+)\s*(hour|day|week|month)s?\s+ago$").unwrap();
}

/// Time window a free-text "date posted" criterion buckets into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateWindow {
    /// Posted within the last day.
    Day,
    /// Posted within the last week.
    Week,
    /// Posted within the last 30 days.
    Month,
    /// No age bound.
    Any,
}

impl DateWindow {
    /// Bucket a criterion string by the window it names. Anything that does
    /// not mention a day, week, or month places no age bound on results.
    pub fn from_criterion(raw: &str) -> Self {
        let lowered = raw.trim().to_lowercase();
        if lowered.contains("day") || lowered.contains("today") {
            DateWindow::Day
        } else if lowered.contains("week") {
            DateWindow::Week
        } else if lowered.contains("month") {
            DateWindow::Month
        } else {
            DateWindow::Any
        }
    }

    /// Maximum age in days a posting may have and still fall in the window.
    pub fn max_age_days(&self) -> Option<i64> {
        match self {
            DateWindow::Day => Some(1),
            DateWindow::Week => Some(7),
            DateWindow::Month => Some(30),
            DateWindow::Any => None,
        }
    }
}

/// Parse a posting timestamp into a calendar date.
///
/// Two input families are recognized:
/// 1. Absolute ISO-ish strings (`YYYY-MM-DD`, optionally with a `T` time
///    component and a `Z` or numeric offset). Time of day is dropped.
/// 2. Relative phrases (`"3 days ago"`, `"2 weeks ago"`, `"today"`,
///    `"yesterday"`, `"just now"`), resolved against `now`. A month counts
///    as 30 days rather than a calendar month.
///
/// Anything else returns `None`; callers treat an unparseable date as
/// unverifiable, never as a mismatch.
pub fn parse_posted_date(raw: &str, now: DateTime<Utc>) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.contains('T') {
        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Some(dt.date_naive());
        }
        // Some providers emit ISO timestamps without a zone offset.
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(naive.date());
        }
    } else if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }

    let lowered = trimmed.to_lowercase();
    match lowered.as_str() {
        "today" | "just now" => return Some(now.date_naive()),
        "yesterday" => return Some((now - Duration::days(1)).date_naive()),
        _ => {}
    }

    if let Some(caps) = RELATIVE_RE.captures(&lowered) {
        let quantity: i64 = caps[1].parse().ok()?;
        let shifted = match &caps[2] {
            "hour" => now - Duration::hours(quantity),
            "day" => now - Duration::days(quantity),
            "week" => now - Duration::days(quantity * 7),
            "month" => now - Duration::days(quantity * 30),
            _ => return None,
        };
        return Some(shifted.date_naive());
    }

    None
}
