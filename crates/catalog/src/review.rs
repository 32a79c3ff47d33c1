use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopworks_core::{DomainError, DomainResult, ProductId, ReviewId, UserId, round_money};

/// A customer review of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub author: UserId,
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl Review {
    pub fn validate(&self) -> DomainResult<()> {
        if !(1..=5).contains(&self.rating) {
            return Err(DomainError::validation("rating must be between 1 and 5"));
        }
        Ok(())
    }
}

/// Product rating derived from its reviews: arithmetic mean rounded to two
/// decimal places. Zero reviews yields `None` (unset), never zero.
pub fn average_rating(ratings: &[u8]) -> Option<Decimal> {
    if ratings.is_empty() {
        return None;
    }
    let sum: u32 = ratings.iter().map(|r| u32::from(*r)).sum();
    let mean = Decimal::from(sum) / Decimal::from(ratings.len() as u32);
    Some(round_money(mean))
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn no_reviews_means_no_rating() {
        assert_eq!(average_rating(&[]), None);
    }

    #[test]
    fn mean_is_rounded_to_two_decimals() {
        assert_eq!(average_rating(&[5, 4]), Some(dec!(4.50)));
        assert_eq!(average_rating(&[5, 4, 4]), Some(dec!(4.33)));
        assert_eq!(average_rating(&[1, 1, 5]), Some(dec!(2.33)));
        assert_eq!(average_rating(&[2]), Some(dec!(2.00)));
    }

    #[test]
    fn rating_outside_bounds_is_rejected() {
        let review = Review {
            id: ReviewId::new(),
            product_id: ProductId::new(),
            author: UserId::new(),
            rating: 6,
            comment: "too good".to_string(),
            created_at: Utc::now(),
        };
        assert!(review.validate().is_err());
    }

    mod properties {
        use proptest::prelude::*;
        use rust_decimal::Decimal;
        use rust_decimal_macros::dec;

        use super::super::average_rating;

        proptest! {
            #[test]
            fn mean_stays_within_rating_bounds(ratings in proptest::collection::vec(1u8..=5, 1..50)) {
                let mean = average_rating(&ratings).unwrap();
                let min = Decimal::from(*ratings.iter().min().unwrap());
                let max = Decimal::from(*ratings.iter().max().unwrap());
                prop_assert!(mean >= min - dec!(0.01));
                prop_assert!(mean <= max + dec!(0.01));
            }
        }
    }
}
