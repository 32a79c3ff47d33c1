use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopworks_core::{DiscountId, DomainError, DomainResult, ProductId, validate_percentage};

/// A percentage discount window for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discount {
    pub id: DiscountId,
    pub product_id: ProductId,
    pub percentage: Decimal,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub is_active: bool,
}

impl Discount {
    /// Whether this discount applies at `now`: flagged active and inside
    /// its `[starts_at, ends_at]` window.
    pub fn is_current(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.starts_at <= now && now <= self.ends_at
    }
}

/// Resolve "the" current discount for a product among its discount rows.
///
/// Overlap validation normally keeps this to at most one candidate; when
/// legacy rows do overlap, the winner is deterministic: highest percentage,
/// then latest `starts_at`, then id. The SQL lookup in the store orders by
/// the same keys.
pub fn active_discount(discounts: &[Discount], now: DateTime<Utc>) -> Option<&Discount> {
    discounts
        .iter()
        .filter(|d| d.is_current(now))
        .max_by_key(|d| (d.percentage, d.starts_at, d.id))
}

/// Validate a discount candidate: percentage bounds, then window order.
///
/// Checks run in order and short-circuit on the first failure; the overlap
/// check needs the product's other discounts and is a separate step
/// (`validate_no_overlap`).
pub fn validate_discount(discount: &Discount) -> DomainResult<()> {
    let checks: [fn(&Discount) -> DomainResult<()>; 2] = [check_percentage, check_window];
    for check in checks {
        check(discount)?;
    }
    Ok(())
}

fn check_percentage(discount: &Discount) -> DomainResult<()> {
    validate_percentage(discount.percentage)
}

fn check_window(discount: &Discount) -> DomainResult<()> {
    if discount.starts_at > discount.ends_at {
        return Err(DomainError::validation(
            "the start date cannot be later than the end date",
        ));
    }
    Ok(())
}

/// Reject a discount whose window overlaps another discount of the same
/// product. `existing` is the product's current discount rows; the candidate
/// itself is excluded by id so edits do not collide with their own row.
pub fn validate_no_overlap(candidate: &Discount, existing: &[Discount]) -> DomainResult<()> {
    let overlapping = existing.iter().any(|d| {
        d.product_id == candidate.product_id
            && d.id != candidate.id
            && d.starts_at <= candidate.ends_at
            && d.ends_at >= candidate.starts_at
    });
    if overlapping {
        return Err(DomainError::validation(
            "this product already has an overlapping discount",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use rust_decimal_macros::dec;

    use super::*;

    fn discount(pct: Decimal, start_offset_days: i64, end_offset_days: i64) -> Discount {
        let now = Utc::now();
        Discount {
            id: DiscountId::new(),
            product_id: ProductId::new(),
            percentage: pct,
            starts_at: now + Duration::days(start_offset_days),
            ends_at: now + Duration::days(end_offset_days),
            is_active: true,
        }
    }

    #[test]
    fn current_discount_is_found() {
        let d = discount(dec!(10), -1, 1);
        assert!(d.is_current(Utc::now()));
        let list = [d.clone()];
        assert_eq!(active_discount(&list, Utc::now()), Some(&d));
    }

    #[test]
    fn expired_discount_is_ignored() {
        let list = [discount(dec!(10), -2, -1)];
        assert_eq!(active_discount(&list, Utc::now()), None);
    }

    #[test]
    fn inactive_flag_disables_discount() {
        let mut d = discount(dec!(10), -1, 1);
        d.is_active = false;
        assert_eq!(active_discount(&[d], Utc::now()), None);
    }

    #[test]
    fn future_window_does_not_apply_yet() {
        let current = discount(dec!(20), -1, 1);
        let upcoming = discount(dec!(10), 2, 7);
        let list = [current.clone(), upcoming];
        assert_eq!(active_discount(&list, Utc::now()), Some(&current));
    }

    #[test]
    fn overlap_tie_break_prefers_highest_percentage() {
        let mut low = discount(dec!(10), -1, 1);
        let mut high = discount(dec!(25), -2, 2);
        let product_id = ProductId::new();
        low.product_id = product_id;
        high.product_id = product_id;

        let list = [low, high.clone()];
        assert_eq!(active_discount(&list, Utc::now()), Some(&high));
    }

    #[test]
    fn window_order_is_validated() {
        let mut d = discount(dec!(10), 1, -1);
        assert!(validate_discount(&d).is_err());
        d.ends_at = d.starts_at;
        assert!(validate_discount(&d).is_ok());
    }

    #[test]
    fn percentage_bounds_are_validated() {
        assert!(validate_discount(&discount(dec!(0.5), -1, 1)).is_err());
        assert!(validate_discount(&discount(dec!(100), -1, 1)).is_ok());
    }

    #[test]
    fn overlapping_window_for_same_product_is_rejected() {
        let existing = discount(dec!(10), -5, 5);
        let mut candidate = discount(dec!(20), 0, 10);
        candidate.product_id = existing.product_id;

        let err = validate_no_overlap(&candidate, std::slice::from_ref(&existing)).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn editing_a_discount_does_not_collide_with_itself() {
        let existing = discount(dec!(10), -5, 5);
        let mut edited = existing.clone();
        edited.percentage = dec!(15);

        assert!(validate_no_overlap(&edited, std::slice::from_ref(&existing)).is_ok());
    }

    #[test]
    fn other_products_do_not_overlap() {
        let existing = discount(dec!(10), -5, 5);
        let candidate = discount(dec!(20), 0, 10);

        assert!(validate_no_overlap(&candidate, &[existing]).is_ok());
    }
}
