//! Value parsing for purchase records.
//!
//! Subscription dates arrive in whatever format the upstream export used, so
//! a range of common human-readable layouts is accepted.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use crate::error::StoreError;

/// Date layouts, month-first before day-first. `%m/%d/%y` leads because
/// `%Y` also accepts two digits and would read `03/05/24` as year 3. `%B`
/// matches full and abbreviated month names.
const DATE_FORMATS: &[&str] = &[
    "%m/%d/%y",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%Y%m%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%m.%d.%Y",
    "%d.%m.%Y",
    "%d-%B-%Y",
    "%B-%d-%Y",
    "%d %B %Y",
    "%d %B, %Y",
    "%B %d, %Y",
    "%B %d %Y",
];

/// Time layouts accepted after any date layout.
const TIME_FORMATS: &[&str] = &[
    "T%H:%M:%S%.f",
    "T%H:%M",
    " %H:%M:%S%.f",
    " %H:%M",
    " %I:%M:%S%.f %p",
    " %I:%M %p",
    " %I %p",
];

const WEEKDAYS: &[&str] = &[
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Parse a subscription date. Date-only values resolve to midnight and
/// values carrying an offset are converted to UTC.
///
/// A leading weekday and ordinal day suffixes (`1st`, `22nd`) are ignored.
pub fn parse_subscription_date(value: Option<&str>) -> Result<NaiveDateTime, StoreError> {
    let raw = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| StoreError::InvalidDate("missing subscription date".to_string()))?;

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Ok(dt.naive_utc());
    }

    let normalized = normalize_date(raw);

    for date_format in DATE_FORMATS {
        for time_format in TIME_FORMATS {
            let format = format!("{date_format}{time_format}");
            if let Ok(dt) = NaiveDateTime::parse_from_str(&normalized, &format) {
                return Ok(dt);
            }
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&normalized, format) {
            if let Some(dt) = date.and_hms_opt(0, 0, 0) {
                return Ok(dt);
            }
        }
    }

    Err(StoreError::InvalidDate(format!(
        "unrecognized date format '{raw}'"
    )))
}

/// Drop a leading weekday, strip ordinal suffixes and collapse whitespace.
fn normalize_date(raw: &str) -> String {
    let mut words: Vec<&str> = raw.split_whitespace().collect();
    if words.len() > 1 && is_weekday(words[0].trim_end_matches([',', '.'])) {
        words.remove(0);
    }

    words
        .into_iter()
        .map(strip_ordinal)
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_weekday(word: &str) -> bool {
    let word = word.to_ascii_lowercase();
    word.len() >= 3 && WEEKDAYS.iter().any(|day| day.starts_with(&word))
}

fn strip_ordinal(word: &str) -> String {
    let (core, trailer) = match word.strip_suffix(',') {
        Some(core) => (core, ","),
        None => (word, ""),
    };
    let lower = core.to_ascii_lowercase();
    for suffix in ["st", "nd", "rd", "th"] {
        if let Some(digits) = lower.strip_suffix(suffix) {
            if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                return format!("{digits}{trailer}");
            }
        }
    }
    word.to_string()
}

/// Parse a subscription price. An absent price is stored as NULL.
pub fn parse_price(value: Option<&str>) -> Result<Option<Decimal>, StoreError> {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    Decimal::from_str(raw)
        .map(Some)
        .map_err(|e| StoreError::InvalidPrice(format!("'{raw}': {e}")))
}
