//! Input validation for caller-supplied request fields.
//!
//! These guards run at the boundary (CLI, config) before a backtest is
//! built; the engine itself assumes pre-validated input.

use crate::domain::error::TradesimError;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

const MAX_SYMBOL_LEN: usize = 10;

/// Which side of a date range a value closes. A date-only end bound expands
/// to the end of that day so the final day's intraday bars are included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    Start,
    End,
}

/// Clean and validate a ticker symbol: trimmed, uppercased, alphanumeric
/// plus dots, 1 to 10 characters (e.g. `BRK.A`).
pub fn validate_symbol(raw: &str) -> Result<String, TradesimError> {
    let cleaned = raw.trim().to_uppercase();

    if cleaned.is_empty() || cleaned.len() > MAX_SYMBOL_LEN {
        return Err(TradesimError::InvalidSymbol {
            symbol: raw.to_string(),
            reason: format!("must be 1 to {} characters", MAX_SYMBOL_LEN),
        });
    }
    if !cleaned
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '.')
    {
        return Err(TradesimError::InvalidSymbol {
            symbol: raw.to_string(),
            reason: "only A-Z, 0-9 and '.' are allowed".to_string(),
        });
    }

    Ok(cleaned)
}

/// Parse `YYYY-MM-DD` or an ISO-8601 datetime (optional fractional seconds,
/// optional trailing `Z`).
pub fn validate_date(raw: &str, bound: DateBound) -> Result<NaiveDateTime, TradesimError> {
    let value = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        let time = match bound {
            DateBound::Start => NaiveTime::MIN,
            DateBound::End => NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN),
        };
        return Ok(date.and_time(time));
    }

    let without_zone = value.strip_suffix('Z').unwrap_or(value);
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(without_zone, format) {
            return Ok(datetime);
        }
    }

    Err(TradesimError::InvalidDate {
        value: raw.to_string(),
    })
}

/// Bound-check a row limit to `1..=max`.
pub fn validate_limit(value: i64, max: i64) -> Result<i64, TradesimError> {
    if value < 1 || value > max {
        return Err(TradesimError::InvalidLimit { value, max });
    }
    Ok(value)
}

/// An initial balance must be a finite, non-negative number.
pub fn validate_balance(value: f64) -> Result<f64, TradesimError> {
    if !value.is_finite() || value < 0.0 {
        return Err(TradesimError::InvalidBalance { value });
    }
    Ok(value)
}
