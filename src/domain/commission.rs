//! Commission derivation.
//!
//! The commission on a transaction comes from the first applicable
//! source: an override supplied with the request, the commissionist's
//! percentage rate, an explicit commission value, or zero. A value that
//! fails to parse degrades to the next source; commission computation
//! never aborts the surrounding operation.

use bigdecimal::{BigDecimal, Zero};
use tracing::warn;

use crate::domain::money;

#[derive(Debug, Default)]
pub struct CommissionInputs<'a> {
    /// Raw override string from the request, wins when valid.
    pub commission_override: Option<&'a str>,
    /// Resolved commissionist rate (percentage, 0-100), if any.
    pub commissionist_rate: Option<&'a BigDecimal>,
    /// Raw explicit commission string from the request.
    pub explicit_commission: Option<&'a str>,
}

/// Derive the commission amount for `total_amount`.
///
/// Always returns a non-negative value; the caller can persist the
/// result without further checks.
pub fn compute(total_amount: &BigDecimal, inputs: CommissionInputs<'_>) -> BigDecimal {
    if let Some(raw) = inputs.commission_override {
        match money::parse_amount(raw) {
            Ok(value) if money::is_non_negative(&value) => return value,
            Ok(_) => warn!(raw, "negative commission override ignored"),
            Err(err) => warn!(raw, error = %err, "unparseable commission override ignored"),
        }
    }

    if let Some(rate) = inputs.commissionist_rate {
        let derived = money::round2(&(total_amount * rate / BigDecimal::from(100)));
        if money::is_non_negative(&derived) {
            return derived;
        }
        warn!(%rate, %total_amount, "negative rate-derived commission ignored");
    }

    if let Some(raw) = inputs.explicit_commission {
        match money::parse_amount(raw) {
            Ok(value) if money::is_non_negative(&value) => return value,
            Ok(_) => warn!(raw, "negative explicit commission ignored"),
            Err(err) => warn!(raw, error = %err, "unparseable explicit commission ignored"),
        }
    }

    BigDecimal::zero()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn override_wins_over_everything() {
        let rate = dec("5");
        let commission = compute(
            &dec("1000000"),
            CommissionInputs {
                commission_override: Some("1.500,00"),
                commissionist_rate: Some(&rate),
                explicit_commission: Some("99"),
            },
        );
        assert_eq!(commission, dec("1500.00"));
    }

    #[test]
    fn rate_applies_without_override() {
        let rate = dec("5");
        let commission = compute(
            &dec("1000000"),
            CommissionInputs {
                commission_override: None,
                commissionist_rate: Some(&rate),
                explicit_commission: Some("99"),
            },
        );
        assert_eq!(commission, dec("50000.00"));
    }

    #[test]
    fn rate_result_is_rounded_to_cents() {
        let rate = dec("3.33");
        let commission = compute(
            &dec("999.99"),
            CommissionInputs {
                commissionist_rate: Some(&rate),
                ..Default::default()
            },
        );
        // 999.99 * 3.33 / 100 = 33.299667
        assert_eq!(commission, dec("33.30"));
    }

    #[test]
    fn invalid_override_degrades_to_rate() {
        let rate = dec("10");
        let commission = compute(
            &dec("200"),
            CommissionInputs {
                commission_override: Some("not-a-number"),
                commissionist_rate: Some(&rate),
                explicit_commission: None,
            },
        );
        assert_eq!(commission, dec("20.00"));
    }

    #[test]
    fn negative_override_degrades_to_rate() {
        let rate = dec("10");
        let commission = compute(
            &dec("200"),
            CommissionInputs {
                commission_override: Some("-5"),
                commissionist_rate: Some(&rate),
                explicit_commission: None,
            },
        );
        assert_eq!(commission, dec("20.00"));
    }

    #[test]
    fn negative_total_with_rate_never_yields_negative_commission() {
        let rate = dec("5");
        let total = money::parse_amount("-1.000,00").unwrap();
        let commission = compute(
            &total,
            CommissionInputs {
                commissionist_rate: Some(&rate),
                ..Default::default()
            },
        );
        assert!(money::is_non_negative(&commission));
        assert_eq!(commission, BigDecimal::zero());
    }

    #[test]
    fn negative_rate_product_degrades_to_explicit_commission() {
        let rate = dec("5");
        let commission = compute(
            &dec("-200"),
            CommissionInputs {
                commissionist_rate: Some(&rate),
                explicit_commission: Some("12,50"),
                ..Default::default()
            },
        );
        assert_eq!(commission, dec("12.50"));
    }

    #[test]
    fn explicit_commission_used_without_rate() {
        let commission = compute(
            &dec("200"),
            CommissionInputs {
                explicit_commission: Some("12,50"),
                ..Default::default()
            },
        );
        assert_eq!(commission, dec("12.50"));
    }

    #[test]
    fn defaults_to_zero() {
        let commission = compute(&dec("200"), CommissionInputs::default());
        assert_eq!(commission, BigDecimal::zero());
    }

    #[test]
    fn invalid_everything_defaults_to_zero() {
        let commission = compute(
            &dec("200"),
            CommissionInputs {
                commission_override: Some("x"),
                commissionist_rate: None,
                explicit_commission: Some("y"),
            },
        );
        assert_eq!(commission, BigDecimal::zero());
    }
}
