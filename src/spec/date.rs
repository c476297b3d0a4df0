//! Natural-language calendar date parsing for timeframe bounds.
//!
//! Accepted forms (case-insensitive, surrounding whitespace ignored):
//! - `today`, `now`, `yesterday`, `tomorrow`
//! - `2024-03-01`, `2024/03/01`, `03/01/2024` (US month/day order)
//! - `3 days ago`, `in 2 weeks`, `1 month from now`
//! - `last week`, `next year`
//!
//! Everything is resolved against an explicit reference date so callers
//! (and tests) control what "today" means.

use chrono::{Days, Months, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;

static RELATIVE_AGO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\s+(day|week|month|year)s?\s+ago$").expect("valid regex")
});

static RELATIVE_AHEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:in\s+(\d+)\s+(day|week|month|year)s?|(\d+)\s+(day|week|month|year)s?\s+from\s+now)$")
        .expect("valid regex")
});

static LAST_NEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(last|next)\s+(day|week|month|year)$").expect("valid regex"));

static US_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").expect("valid regex"));

/// Parse `input` relative to `today`. Returns `None` when the text is not
/// a recognised date expression.
pub fn parse_date(input: &str, today: NaiveDate) -> Option<NaiveDate> {
    let text = input.trim().to_lowercase();

    match text.as_str() {
        "" => return None,
        "today" | "now" => return Some(today),
        "yesterday" => return today.checked_sub_days(Days::new(1)),
        "tomorrow" => return today.checked_add_days(Days::new(1)),
        _ => {}
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(&text, fmt) {
            return Some(date);
        }
    }

    if let Some(caps) = US_DATE.captures(&text) {
        let month: u32 = caps[1].parse().ok()?;
        let day: u32 = caps[2].parse().ok()?;
        let year: i32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if let Some(caps) = RELATIVE_AGO.captures(&text) {
        let n: u32 = caps[1].parse().ok()?;
        return shift(today, &caps[2], -(i64::from(n)));
    }

    if let Some(caps) = RELATIVE_AHEAD.captures(&text) {
        let (n, unit) = match (caps.get(1), caps.get(2)) {
            (Some(n), Some(unit)) => (n.as_str(), unit.as_str()),
            _ => (caps.get(3)?.as_str(), caps.get(4)?.as_str()),
        };
        let n: u32 = n.parse().ok()?;
        return shift(today, unit, i64::from(n));
    }

    if let Some(caps) = LAST_NEXT.captures(&text) {
        let step = if &caps[1] == "last" { -1 } else { 1 };
        return shift(today, &caps[2], step);
    }

    None
}

/// Move `date` by `amount` units (negative goes back in time).
fn shift(date: NaiveDate, unit: &str, amount: i64) -> Option<NaiveDate> {
    let magnitude = amount.unsigned_abs();
    let back = amount < 0;
    match unit {
        "day" | "week" => {
            let days = if unit == "week" { magnitude * 7 } else { magnitude };
            if back {
                date.checked_sub_days(Days::new(days))
            } else {
                date.checked_add_days(Days::new(days))
            }
        }
        "month" | "year" => {
            let months = if unit == "year" { magnitude * 12 } else { magnitude };
            let months = Months::new(u32::try_from(months).ok()?);
            if back {
                date.checked_sub_months(months)
            } else {
                date.checked_add_months(months)
            }
        }
        _ => None,
    }
}
