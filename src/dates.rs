//! Date normalization for the encodings found in crop-model files.
//!
//! Supported inputs, checked in this order:
//!
//! 1. A separate year and day-of-year pair (`YEAR` + `DOY` columns).
//! 2. A compressed `YYYYDDD` (7 digits) or `YYDDD` (5 digits) code.
//! 3. A calendar string, ISO 8601 first and then a fixed list of variants.
//!
//! Everything here is pure; no I/O and no shared state.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::data::{Value, is_missing_token};

pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 2100;
pub const MAX_DAY_OF_YEAR: i32 = 366;

/// Two-digit years at or below this pivot belong to the 2000s.
pub const TWO_DIGIT_YEAR_PIVOT: i32 = 30;

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%d-%b-%Y",
    "%d %b %Y",
    "%b %d %Y",
    "%d.%m.%Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

/// Resolves a calendar date from whichever encoding is available.
///
/// When both `year` and `day_of_year` are supplied they win outright: an
/// out-of-range pair yields `None` without consulting `raw`.
pub fn normalize(year: Option<i32>, day_of_year: Option<i32>, raw: Option<&str>) -> Option<NaiveDate> {
    if let (Some(year), Some(doy)) = (year, day_of_year) {
        return from_year_doy(year, doy);
    }
    raw.and_then(parse_date_string)
}

/// Jan 1 of `year` plus `doy - 1` days, when both are in range.
pub fn from_year_doy(year: i32, doy: i32) -> Option<NaiveDate> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) || !(1..=MAX_DAY_OF_YEAR).contains(&doy) {
        return None;
    }
    let jan_first = NaiveDate::from_ymd_opt(year, 1, 1)?;
    jan_first.checked_add_signed(Duration::days(i64::from(doy - 1)))
}

fn parse_date_string(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || is_date_sentinel(trimmed) {
        return None;
    }
    let all_digits = trimmed.bytes().all(|b| b.is_ascii_digit());
    if all_digits && trimmed.len() == 7 {
        return parse_yyyyddd(trimmed);
    }
    if all_digits && trimmed.len() == 5 {
        return parse_yyddd(trimmed);
    }
    parse_calendar(trimmed)
}

fn is_date_sentinel(value: &str) -> bool {
    is_missing_token(value) || value.eq_ignore_ascii_case("NA") || value.eq_ignore_ascii_case("NaN")
}

fn parse_yyyyddd(code: &str) -> Option<NaiveDate> {
    let value: i32 = code.parse().ok()?;
    if value <= 0 {
        return None;
    }
    from_year_doy(value / 1000, value % 1000)
}

fn parse_yyddd(code: &str) -> Option<NaiveDate> {
    let value: i32 = code.parse().ok()?;
    if value <= 0 {
        return None;
    }
    let short_year = value / 1000;
    let doy = value % 1000;
    let year = if short_year <= TWO_DIGIT_YEAR_PIVOT {
        2000 + short_year
    } else {
        1900 + short_year
    };
    from_year_doy(year, doy)
}

fn parse_calendar(value: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Normalizes a cell that holds a date in any supported encoding. Dates pass
/// through unchanged, so running this twice over a column is a no-op.
pub fn normalize_value(value: &Value) -> Value {
    match value {
        Value::Date(d) => Value::Date(*d),
        Value::Absent => Value::Absent,
        other => match normalize(None, None, Some(other.as_display().as_str())) {
            Some(date) => Value::Date(date),
            None => Value::Absent,
        },
    }
}

/// True when `value` reads as a calendar date by itself (used by column
/// type inference; bare numbers are not treated as dates there).
pub fn looks_like_date(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty() && !is_date_sentinel(trimmed) && parse_calendar(trimmed).is_some()
}
