//! Fixed-point money helpers.
//!
//! All monetary amounts are `rust_decimal::Decimal` with two decimal places.
//! There is exactly one rounding policy in the system: half-up
//! (`MidpointAwayFromZero`), applied per line total and to final order
//! totals. Any store-side bulk computation must match it.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{DomainError, DomainResult};

/// Round a monetary amount to two decimal places, half-up.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Zero with two decimal places (`0.00`).
pub fn zero_money() -> Decimal {
    Decimal::new(0, 2)
}

/// Validate a discount percentage: `1 <= pct <= 100`.
pub fn validate_percentage(pct: Decimal) -> DomainResult<()> {
    if pct < Decimal::ONE || pct > Decimal::ONE_HUNDRED {
        return Err(DomainError::validation(
            "discount percentage must be between 1 and 100",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rounds_half_up() {
        assert_eq!(round_money(dec!(1.005)), dec!(1.01));
        assert_eq!(round_money(dec!(1.004)), dec!(1.00));
        assert_eq!(round_money(dec!(-1.005)), dec!(-1.01));
    }

    #[test]
    fn zero_has_two_decimal_places() {
        assert_eq!(zero_money().to_string(), "0.00");
    }

    #[test]
    fn percentage_bounds() {
        assert!(validate_percentage(dec!(1)).is_ok());
        assert!(validate_percentage(dec!(100)).is_ok());
        assert!(validate_percentage(dec!(0.5)).is_err());
        assert!(validate_percentage(dec!(101)).is_err());
    }
}
