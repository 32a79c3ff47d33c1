use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopworks_catalog::{Discount, Product, active_discount};
use shopworks_core::{OrderId, OrderItemId, ProductId};

/// One order line: a product reference plus the catalog snapshot taken when
/// the line was created or last refreshed.
///
/// `price` and `discount_percentage` are **snapshots**, not live reads: the
/// pricing engine trusts them as-is. While the owning order is pending, the
/// recompute dispatcher refreshes them whenever the product's price or
/// active discount changes; once the order leaves pending they are frozen.
/// At most one line exists per (order, product) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: Decimal,
    pub discount_percentage: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

/// Catalog snapshot values for a line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub price: Decimal,
    pub discount_percentage: Option<Decimal>,
}

/// Take a fresh snapshot of a product's unit price and currently-active
/// discount percentage (`None` when no discount applies at `now`).
pub fn snapshot_now(product: &Product, discounts: &[Discount], now: DateTime<Utc>) -> Snapshot {
    Snapshot {
        price: product.price,
        discount_percentage: active_discount(discounts, now).map(|d| d.percentage),
    }
}

impl OrderItem {
    /// Apply a fresh catalog snapshot to this line.
    pub fn refresh(&mut self, snapshot: Snapshot) {
        self.price = snapshot.price;
        self.discount_percentage = snapshot.discount_percentage;
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use rust_decimal_macros::dec;

    use shopworks_catalog::NewProduct;
    use shopworks_core::DiscountId;

    use super::*;

    fn product(price: Decimal) -> Product {
        Product::create(
            ProductId::new(),
            NewProduct {
                name: "Kettle".to_string(),
                price,
                description: String::new(),
                inventory: 5,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn snapshot_without_discount() {
        let snapshot = snapshot_now(&product(dec!(42.00)), &[], Utc::now());
        assert_eq!(snapshot.price, dec!(42.00));
        assert_eq!(snapshot.discount_percentage, None);
    }

    #[test]
    fn snapshot_picks_up_active_discount() {
        let product = product(dec!(42.00));
        let now = Utc::now();
        let discount = Discount {
            id: DiscountId::new(),
            product_id: product.id,
            percentage: dec!(15),
            starts_at: now - Duration::hours(1),
            ends_at: now + Duration::hours(1),
            is_active: true,
        };

        let snapshot = snapshot_now(&product, &[discount], now);
        assert_eq!(snapshot.discount_percentage, Some(dec!(15)));
    }

    #[test]
    fn refresh_overwrites_both_snapshot_fields() {
        let mut item = OrderItem {
            id: OrderItemId::new(),
            order_id: OrderId::new(),
            product_id: ProductId::new(),
            quantity: 2,
            price: dec!(10.00),
            discount_percentage: Some(dec!(5)),
            created_at: Utc::now(),
        };

        item.refresh(Snapshot {
            price: dec!(12.00),
            discount_percentage: None,
        });

        assert_eq!(item.price, dec!(12.00));
        assert_eq!(item.discount_percentage, None);
    }
}
