//! Line-item mutation validation.
//!
//! An ordered list of pure validation functions, run front to back with the
//! first failure reported as a field-level error. All checks run before any
//! state is touched; a rejected candidate leaves the order, its items and
//! the catalog unchanged.

use shopworks_catalog::Product;
use shopworks_core::{DomainError, DomainResult};

/// A proposed line-item create/update, resolved against the catalog.
///
/// `product` is `None` when the referenced product does not exist (or no
/// product was supplied at all); the first check rejects that case.
#[derive(Debug, Clone)]
pub struct LineItemCandidate<'a> {
    pub product: Option<&'a Product>,
    pub quantity: u32,
}

type Check = fn(&LineItemCandidate<'_>) -> DomainResult<()>;

/// The checks, in the order they run.
const CHECKS: [Check; 3] = [product_required, quantity_at_least_one, stock_available];

/// Validate a candidate line item against the current catalog state.
pub fn validate_line_item(candidate: &LineItemCandidate<'_>) -> DomainResult<()> {
    for check in CHECKS {
        check(candidate)?;
    }
    Ok(())
}

fn product_required(candidate: &LineItemCandidate<'_>) -> DomainResult<()> {
    if candidate.product.is_none() {
        return Err(DomainError::validation("product: field product is required"));
    }
    Ok(())
}

fn quantity_at_least_one(candidate: &LineItemCandidate<'_>) -> DomainResult<()> {
    if candidate.quantity < 1 {
        return Err(DomainError::validation(
            "quantity: quantity must be at least 1",
        ));
    }
    Ok(())
}

fn stock_available(candidate: &LineItemCandidate<'_>) -> DomainResult<()> {
    if let Some(product) = candidate.product {
        if !product.has_stock_for(candidate.quantity) {
            return Err(DomainError::validation(format!(
                "quantity: insufficient stock for {} (available {})",
                product.name, product.inventory
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal_macros::dec;

    use shopworks_catalog::NewProduct;
    use shopworks_core::ProductId;

    use super::*;

    fn product(inventory: u32) -> Product {
        Product::create(
            ProductId::new(),
            NewProduct {
                name: "Bookshelf".to_string(),
                price: dec!(59.90),
                description: String::new(),
                inventory,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn valid_candidate_passes() {
        let product = product(3);
        let candidate = LineItemCandidate {
            product: Some(&product),
            quantity: 3,
        };
        assert!(validate_line_item(&candidate).is_ok());
    }

    #[test]
    fn missing_product_is_the_first_error() {
        // Quantity is also invalid here; the product check wins because the
        // chain short-circuits in declaration order.
        let candidate = LineItemCandidate {
            product: None,
            quantity: 0,
        };
        let err = validate_line_item(&candidate).unwrap_err();
        match err {
            DomainError::Validation(msg) => assert!(msg.starts_with("product:")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let product = product(3);
        let candidate = LineItemCandidate {
            product: Some(&product),
            quantity: 0,
        };
        let err = validate_line_item(&candidate).unwrap_err();
        match err {
            DomainError::Validation(msg) => assert!(msg.starts_with("quantity:")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn quantity_beyond_stock_is_rejected() {
        let product = product(2);
        let candidate = LineItemCandidate {
            product: Some(&product),
            quantity: 3,
        };
        let err = validate_line_item(&candidate).unwrap_err();
        match err {
            DomainError::Validation(msg) => {
                assert!(msg.contains("insufficient stock"));
                assert!(msg.contains("Bookshelf"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn quantity_equal_to_stock_is_allowed() {
        let product = product(2);
        let candidate = LineItemCandidate {
            product: Some(&product),
            quantity: 2,
        };
        assert!(validate_line_item(&candidate).is_ok());
    }
}
