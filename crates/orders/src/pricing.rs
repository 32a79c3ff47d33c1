//! Pricing engine: line and order totals over snapshot fields.
//!
//! Pure with respect to its inputs: it never re-reads live product prices
//! or discounts; snapshot freshness is the recompute dispatcher's job.
//!
//! Rounding policy (the only one in the system): each line's contribution is
//! `price * (1 - discount/100) * quantity` rounded half-up to two decimals
//! **once** (no intermediate rounding of the discounted unit price), then
//! the sum of line totals is rounded the same way. The store's set-based
//! batch recompute encodes the identical expression
//! (`ROUND(price * (1 - pct/100) * quantity, 2)`, summed) so both paths
//! produce the same totals for the same rows.

use rust_decimal::Decimal;

use shopworks_core::{round_money, zero_money};

use crate::item::OrderItem;

/// Total for one line: effective unit price times quantity, rounded.
pub fn line_total(item: &OrderItem) -> Decimal {
    let effective = match item.discount_percentage {
        Some(pct) => item.price * (Decimal::ONE - pct / Decimal::ONE_HUNDRED),
        None => item.price,
    };
    round_money(effective * Decimal::from(item.quantity))
}

/// Order total: sum of line totals, rounded. Zero lines is a valid order
/// with total `0.00`.
pub fn order_total(items: &[OrderItem]) -> Decimal {
    if items.is_empty() {
        return zero_money();
    }
    round_money(items.iter().map(line_total).sum())
}
