//! Metric calculator: body-mass index and age from raw profile fields.
//!
//! Pure functions. Missing or malformed input yields `None` (unavailable),
//! never an error.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;

use crate::models::WorkerProfile;

/// Milliseconds in a 365.25-day year.
const MS_PER_YEAR: i64 = 31_557_600_000;

/// Leading decimal number; trailing text such as units is ignored.
static RE_LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").unwrap()
});

/// Parse a hand-entered decimal. The first comma is read as the decimal
/// separator and anything after the leading number is ignored
/// ("70,5" → 70.5, "130 mg/dL" → 130).
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let normalized = raw.trim_start().replacen(',', ".", 1);
    let m = RE_LEADING_NUMBER.find(&normalized)?;
    m.as_str().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a calendar date or timestamp. Dates without an offset are read as UTC.
pub fn parse_calendar_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// weight / (height in metres)². Unavailable when either side is not
/// numeric or height is zero.
pub fn compute_bmi(weight_kg: &str, height_cm: &str) -> Option<f64> {
    let weight = parse_decimal(weight_kg)?;
    let height = parse_decimal(height_cm)?;
    if height == 0.0 {
        return None;
    }
    let metres = height / 100.0;
    Some(weight / (metres * metres))
}

/// Whole years elapsed since `birth_date`, using 365.25-day years.
pub fn compute_age(birth_date: &str, now: DateTime<Utc>) -> Option<i64> {
    let born = parse_calendar_date(birth_date)?;
    let elapsed_ms = (now - born).num_milliseconds();
    Some(elapsed_ms.div_euclid(MS_PER_YEAR))
}

pub fn profile_bmi(profile: &WorkerProfile) -> Option<f64> {
    compute_bmi(profile.weight_kg.as_deref()?, profile.height_cm.as_deref()?)
}

pub fn profile_age(profile: &WorkerProfile, now: DateTime<Utc>) -> Option<i64> {
    compute_age(profile.birth_date.as_deref()?, now)
}
