//! Locale-aware amount parsing.
//!
//! Inbound amounts use `.` as the thousands separator and `,` as the
//! decimal separator (`"1.234.567,89"`). Values are kept exact as
//! `BigDecimal`; floats never enter the money path.

use bigdecimal::{BigDecimal, Zero};
use std::str::FromStr;
use thiserror::Error;

/// Storage precision ceiling: amounts are numeric(15,2), so anything at
/// or above 10^13 in magnitude cannot be persisted.
const MAX_MAGNITUDE_UNITS: i64 = 10_000_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyParseError {
    #[error("invalid amount: {0:?}")]
    InvalidNumber(String),
    #[error("amount out of range: {0:?}")]
    OutOfRange(String),
}

/// Parse a locale-formatted amount string into an exact decimal.
pub fn parse_amount(input: &str) -> Result<BigDecimal, MoneyParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(MoneyParseError::InvalidNumber(input.to_string()));
    }

    let normalized: String = trimmed
        .chars()
        .filter(|ch| *ch != '.')
        .map(|ch| if ch == ',' { '.' } else { ch })
        .collect();

    let value = BigDecimal::from_str(&normalized)
        .map_err(|_| MoneyParseError::InvalidNumber(input.to_string()))?;

    if value.abs() >= BigDecimal::from(MAX_MAGNITUDE_UNITS) {
        return Err(MoneyParseError::OutOfRange(input.to_string()));
    }

    Ok(value)
}

/// Format an exact decimal back into the locale convention used by
/// `parse_amount`, always with two decimal places.
pub fn format_amount(value: &BigDecimal) -> String {
    let scaled = round2(value);
    let rendered = scaled.to_string();
    let (sign, digits) = match rendered.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rendered.as_str()),
    };
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    format!("{sign}{grouped},{frac_part}")
}

/// Round to two decimal places, half away from zero. Used for derived
/// amounts such as rate-based commissions.
///
/// `with_scale` truncates toward zero, so the value is nudged half a
/// cent away from zero first.
pub fn round2(value: &BigDecimal) -> BigDecimal {
    let half_cent = BigDecimal::from(5) / BigDecimal::from(1000);
    let nudged = if value < &BigDecimal::zero() {
        value - &half_cent
    } else {
        value + &half_cent
    };
    nudged.with_scale(2)
}

/// `commission >= 0` is an invariant of stored transactions.
pub fn is_non_negative(value: &BigDecimal) -> bool {
    value >= &BigDecimal::zero()
}
