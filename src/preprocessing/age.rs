//! Applicant age derived from birth date and grant year

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

/// Youngest plausible applicant age (inclusive)
pub const MIN_AGE: i32 = 14;
/// Oldest plausible applicant age (inclusive)
pub const MAX_AGE: i32 = 80;

/// Year-first formats are tried before month-first and day-first ones.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%Y%m%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
];

/// Parse a birth date string. Returns `None` when nothing matches.
///
/// A bare four-digit year reads as January 1st of that year.
pub fn parse_birth_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        })
        .or_else(|| parse_year_only(raw))
}

fn parse_year_only(raw: &str) -> Option<NaiveDate> {
    if raw.len() != 4 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::from_ymd_opt(raw.parse().ok()?, 1, 1)
}

/// Age at grant time, or `None` if either input is missing/unparseable or
/// the result falls outside `[MIN_AGE, MAX_AGE]`. Never clamped.
pub fn derive_age(grant_year: Option<i32>, birth_date: Option<&str>) -> Option<i32> {
    let birth_year = parse_birth_date(birth_date?)?.year();
    let age = grant_year?.checked_sub(birth_year)?;

    (MIN_AGE..=MAX_AGE).contains(&age).then_some(age)
}

/// Batch form over (grant year, birth date) pairs.
pub fn derive_ages<'a, I>(pairs: I) -> Vec<Option<i32>>
where
    I: IntoIterator<Item = (Option<i32>, Option<&'a str>)>,
{
    pairs
        .into_iter()
        .map(|(year, birth)| derive_age(year, birth))
        .collect()
}
