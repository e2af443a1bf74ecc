//! Identifier and date canonicalization
//!
//! Pure functions with a fixed contract:
//! - raw id or URI + dataset -> canonical URI scoped to the dataset
//! - fuzzy date string -> `[earliest, latest]` ISO date range
//!
//! Both are idempotent: feeding canonical output back in returns it
//! unchanged, so replayed messages normalize to the same values.

use chrono::NaiveDate;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("empty identifier")]
    EmptyId,
    #[error("invalid fuzzy date: {0}")]
    InvalidDate(String),
}

/// Compute the canonical identifier for a raw id or URI
///
/// Absolute URIs (a `urn:` prefix or any scheme followed by `://`) pass
/// through untouched. Everything else is scoped to its dataset as
/// `{dataset}/{raw}`. Already-scoped ids pass through, keeping the
/// function idempotent.
pub fn canonical_id(raw: &str, dataset: &str) -> Result<String, NormalizeError> {
    if raw.is_empty() {
        return Err(NormalizeError::EmptyId);
    }
    if raw.starts_with("urn:") || raw.contains("://") {
        return Ok(raw.to_string());
    }
    if raw.starts_with(&format!("{}/", dataset)) {
        return Ok(raw.to_string());
    }
    Ok(format!("{}/{}", dataset, raw))
}

/// Convert a fuzzy date value into a `[earliest, latest]` range
///
/// Accepted inputs:
/// - `"YYYY"` -> Jan 1 through Dec 31 of that year
/// - `"YYYY-MM"` -> first through last day of that month
/// - `"YYYY-MM-DD"` -> that single day, twice
/// - an array of two strings -> passed through unchanged (already canonical)
pub fn canonical_date_range(value: &Value) -> Result<Value, NormalizeError> {
    match value {
        Value::Array(parts) if parts.len() == 2 && parts.iter().all(Value::is_string) => {
            Ok(value.clone())
        }
        Value::String(s) => {
            let (earliest, latest) = parse_fuzzy(s)?;
            Ok(Value::Array(vec![
                Value::String(format_date(earliest)),
                Value::String(format_date(latest)),
            ]))
        }
        other => Err(NormalizeError::InvalidDate(other.to_string())),
    }
}

fn parse_fuzzy(s: &str) -> Result<(NaiveDate, NaiveDate), NormalizeError> {
    let invalid = || NormalizeError::InvalidDate(s.to_string());

    // A leading '-' marks a BCE year, not a separator
    let (sign, body) = match s.strip_prefix('-') {
        Some(rest) => (-1i32, rest),
        None => (1i32, s),
    };

    let parts: Vec<&str> = body.split('-').collect();
    match parts.as_slice() {
        [year] => {
            let year = parse_year(year, sign).ok_or_else(invalid)?;
            let start = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(invalid)?;
            let end = NaiveDate::from_ymd_opt(year, 12, 31).ok_or_else(invalid)?;
            Ok((start, end))
        }
        [year, month] => {
            let year = parse_year(year, sign).ok_or_else(invalid)?;
            let month: u32 = month.parse().map_err(|_| invalid())?;
            let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
            Ok((start, last_day_of_month(year, month).ok_or_else(invalid)?))
        }
        [year, month, day] => {
            let year = parse_year(year, sign).ok_or_else(invalid)?;
            let month: u32 = month.parse().map_err(|_| invalid())?;
            let day: u32 = day.parse().map_err(|_| invalid())?;
            let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?;
            Ok((date, date))
        }
        _ => Err(invalid()),
    }
}

fn parse_year(s: &str, sign: i32) -> Option<i32> {
    if s.is_empty() {
        return None;
    }
    s.parse::<i32>().ok().map(|y| y * sign)
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
