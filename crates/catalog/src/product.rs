use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopworks_core::{DomainError, DomainResult, ProductId, round_money};

/// A catalog product.
///
/// `inventory` is the on-hand stock counter the order lifecycle reserves
/// against; it can only change through validated adjustments, so it never
/// goes negative. `rating` is derived from reviews (`None` until the first
/// review exists) and is never authored directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub inventory: u32,
    pub description: String,
    pub rating: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

/// Candidate for product creation (also produced by the bulk import parser).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: Decimal,
    pub description: String,
    pub inventory: u32,
}

impl NewProduct {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        if self.price < Decimal::ZERO {
            return Err(DomainError::validation("price cannot be negative"));
        }
        Ok(())
    }
}

impl Product {
    /// Create a product from a validated candidate.
    pub fn create(id: ProductId, new: NewProduct, created_at: DateTime<Utc>) -> DomainResult<Self> {
        new.validate()?;
        Ok(Self {
            id,
            name: new.name,
            price: new.price,
            inventory: new.inventory,
            description: new.description,
            rating: None,
            created_at,
        })
    }

    /// Update the unit price. Callers must notify the recompute dispatcher
    /// so pending order snapshots follow.
    pub fn set_price(&mut self, price: Decimal) -> DomainResult<()> {
        if price < Decimal::ZERO {
            return Err(DomainError::validation("price cannot be negative"));
        }
        self.price = price;
        Ok(())
    }

    pub fn has_stock_for(&self, quantity: u32) -> bool {
        self.inventory >= quantity
    }
}

/// Effective unit price after an optional percentage discount.
pub fn discounted_unit_price(price: Decimal, discount_percentage: Option<Decimal>) -> Decimal {
    match discount_percentage {
        Some(pct) => round_money(price * (Decimal::ONE - pct / Decimal::ONE_HUNDRED)),
        None => price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn candidate() -> NewProduct {
        NewProduct {
            name: "Desk Lamp".to_string(),
            price: dec!(100.00),
            description: String::new(),
            inventory: 10,
        }
    }

    #[test]
    fn create_starts_without_rating() {
        let product = Product::create(ProductId::new(), candidate(), Utc::now()).unwrap();
        assert_eq!(product.rating, None);
        assert_eq!(product.inventory, 10);
    }

    #[test]
    fn empty_name_is_rejected() {
        let mut new = candidate();
        new.name = "  ".to_string();
        let err = Product::create(ProductId::new(), new, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn negative_price_is_rejected() {
        let mut product = Product::create(ProductId::new(), candidate(), Utc::now()).unwrap();
        assert!(product.set_price(dec!(-1)).is_err());
        assert_eq!(product.price, dec!(100.00));
    }

    #[test]
    fn discounted_unit_price_applies_percentage() {
        assert_eq!(discounted_unit_price(dec!(100.00), Some(dec!(10))), dec!(90.00));
        assert_eq!(discounted_unit_price(dec!(100.00), None), dec!(100.00));
        assert_eq!(discounted_unit_price(dec!(100.00), Some(dec!(20))), dec!(80.00));
    }
}
