use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shopworks_catalog::{Discount, Product};
use shopworks_core::{DomainError, DomainResult, OrderId, ProductId, UserId, zero_money};

use crate::item::{OrderItem, Snapshot, snapshot_now};

/// Order lifecycle status.
///
/// Legal edges: Pending → Confirmed → Completed, and Pending/Confirmed →
/// Canceled. Everything else is rejected without side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Completed,
    Canceled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Canceled => "CANCELED",
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque, unique order tracking code, generated at creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingCode(String);

impl TrackingCode {
    pub fn generate() -> Self {
        Self(Uuid::now_v7().simple().to_string())
    }

    pub fn from_string(code: String) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for TrackingCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An order.
///
/// `total_price` is derived, never user-authored: while the order is pending
/// it always equals the pricing engine's result over the current line items;
/// after leaving pending it stays frozen at the last pending-time value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer: UserId,
    pub status: OrderStatus,
    pub total_price: Decimal,
    pub tracking_code: TrackingCode,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// A fresh pending order with no lines and a zero total.
    pub fn new(id: OrderId, customer: UserId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            customer,
            status: OrderStatus::Pending,
            total_price: zero_money(),
            tracking_code: TrackingCode::generate(),
            created_at,
        }
    }

    /// Line items may only be added, edited or removed while pending.
    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }
}

/// One line that cannot be covered by current stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockShortage {
    pub product_id: ProductId,
    pub product_name: String,
    pub requested: u32,
    pub available: u32,
}

impl core::fmt::Display for StockShortage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "insufficient stock for {}: requested {}, available {}",
            self.product_name, self.requested, self.available
        )
    }
}

/// Failure of a lifecycle transition or of a guarded mutation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The requested edge does not exist in the status machine.
    #[error("cannot transition order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Confirm requires at least one line item.
    #[error("cannot confirm an order without line items")]
    EmptyOrder,

    /// Confirm-time stock check failed; every offending line is reported.
    #[error("{}", format_shortages(.0))]
    InsufficientStock(Vec<StockShortage>),

    /// Line-item mutation attempted on an order that is no longer pending.
    #[error("order is {status}, line items can only change while PENDING")]
    NotPending { status: OrderStatus },
}

fn format_shortages(shortages: &[StockShortage]) -> String {
    shortages
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// The full set of inventory decrements a confirm will apply.
///
/// Produced only when every line passed the stock check; executing it is
/// all-or-nothing in one store transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationPlan {
    pub decrements: Vec<(ProductId, u32)>,
}

/// The inventory releases a cancel will apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleasePlan {
    pub increments: Vec<(ProductId, u32)>,
}

/// Decide a Pending → Confirmed transition.
///
/// Reads and validates everything before anything is written: stock is
/// checked for **all** lines and every shortage reported together, so a
/// failing confirm leaves inventory untouched on every line.
pub fn plan_confirm(
    order: &Order,
    items: &[OrderItem],
    products: &[Product],
) -> Result<ReservationPlan, TransitionError> {
    if order.status != OrderStatus::Pending {
        return Err(TransitionError::InvalidTransition {
            from: order.status,
            to: OrderStatus::Confirmed,
        });
    }
    if items.is_empty() {
        return Err(TransitionError::EmptyOrder);
    }

    let mut decrements = Vec::with_capacity(items.len());
    let mut shortages = Vec::new();
    for item in items {
        let product = products.iter().find(|p| p.id == item.product_id);
        let (name, available) = match product {
            Some(p) => (p.name.clone(), p.inventory),
            None => (item.product_id.to_string(), 0),
        };
        if available < item.quantity {
            shortages.push(StockShortage {
                product_id: item.product_id,
                product_name: name,
                requested: item.quantity,
                available,
            });
        } else {
            decrements.push((item.product_id, item.quantity));
        }
    }

    if !shortages.is_empty() {
        return Err(TransitionError::InsufficientStock(shortages));
    }
    Ok(ReservationPlan { decrements })
}

/// Decide a Pending/Confirmed → Canceled transition.
///
/// Every line's quantity goes back to stock, including for orders canceled
/// straight from Pending (preserved business rule, see DESIGN.md).
pub fn plan_cancel(order: &Order, items: &[OrderItem]) -> Result<ReleasePlan, TransitionError> {
    match order.status {
        OrderStatus::Pending | OrderStatus::Confirmed => Ok(ReleasePlan {
            increments: items.iter().map(|i| (i.product_id, i.quantity)).collect(),
        }),
        from => Err(TransitionError::InvalidTransition {
            from,
            to: OrderStatus::Canceled,
        }),
    }
}

/// Decide a Confirmed → Completed transition (pure status flip; inventory
/// was already committed at confirm time).
pub fn check_complete(order: &Order) -> Result<(), TransitionError> {
    if order.status != OrderStatus::Confirmed {
        return Err(TransitionError::InvalidTransition {
            from: order.status,
            to: OrderStatus::Completed,
        });
    }
    Ok(())
}

/// A line of a regenerated order: quantity copied from the source order,
/// price/discount re-snapshotted from the current catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegeneratedLine {
    pub product_id: ProductId,
    pub quantity: u32,
    pub snapshot: Snapshot,
}

/// Rebuild a historical order's lines against the current catalog.
///
/// One line per distinct product of the source order (the source already
/// holds at most one line per product). This is a read of history plus a
/// fresh snapshot; nothing is copied from the old prices.
pub fn regenerate_lines(
    source_items: &[OrderItem],
    products: &[Product],
    discounts: &[Discount],
    now: DateTime<Utc>,
) -> DomainResult<Vec<RegeneratedLine>> {
    let mut lines = Vec::with_capacity(source_items.len());
    for item in source_items {
        let product = products
            .iter()
            .find(|p| p.id == item.product_id)
            .ok_or(DomainError::NotFound)?;
        let product_discounts: Vec<Discount> = discounts
            .iter()
            .filter(|d| d.product_id == product.id)
            .cloned()
            .collect();
        lines.push(RegeneratedLine {
            product_id: product.id,
            quantity: item.quantity,
            snapshot: snapshot_now(product, &product_discounts, now),
        });
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use rust_decimal_macros::dec;

    use shopworks_catalog::NewProduct;
    use shopworks_core::{DiscountId, OrderItemId};

    use super::*;

    fn test_product(name: &str, price: Decimal, inventory: u32) -> Product {
        Product::create(
            ProductId::new(),
            NewProduct {
                name: name.to_string(),
                price,
                description: String::new(),
                inventory,
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn test_order(status: OrderStatus) -> Order {
        let mut order = Order::new(OrderId::new(), UserId::new(), Utc::now());
        order.status = status;
        order
    }

    fn test_item(order: &Order, product: &Product, quantity: u32) -> OrderItem {
        OrderItem {
            id: OrderItemId::new(),
            order_id: order.id,
            product_id: product.id,
            quantity,
            price: product.price,
            discount_percentage: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn new_order_is_pending_with_zero_total() {
        let order = Order::new(OrderId::new(), UserId::new(), Utc::now());
        assert!(order.is_pending());
        assert_eq!(order.total_price, dec!(0.00));
        assert!(!order.tracking_code.as_str().is_empty());
    }

    #[test]
    fn tracking_codes_are_unique() {
        assert_ne!(TrackingCode::generate(), TrackingCode::generate());
    }

    #[test]
    fn confirm_plans_one_decrement_per_line() {
        let order = test_order(OrderStatus::Pending);
        let a = test_product("A", dec!(10.00), 5);
        let b = test_product("B", dec!(20.00), 2);
        let items = [test_item(&order, &a, 3), test_item(&order, &b, 2)];

        let plan = plan_confirm(&order, &items, &[a.clone(), b.clone()]).unwrap();
        assert_eq!(plan.decrements, vec![(a.id, 3), (b.id, 2)]);
    }

    #[test]
    fn confirm_of_empty_order_fails() {
        let order = test_order(OrderStatus::Pending);
        let err = plan_confirm(&order, &[], &[]).unwrap_err();
        assert_eq!(err, TransitionError::EmptyOrder);
    }

    #[test]
    fn confirm_reports_every_shortage_and_plans_nothing() {
        let order = test_order(OrderStatus::Pending);
        let a = test_product("A", dec!(10.00), 1);
        let b = test_product("B", dec!(20.00), 0);
        let c = test_product("C", dec!(30.00), 10);
        let items = [
            test_item(&order, &a, 3),
            test_item(&order, &b, 1),
            test_item(&order, &c, 1),
        ];

        let err = plan_confirm(&order, &items, &[a.clone(), b.clone(), c]).unwrap_err();
        match err {
            TransitionError::InsufficientStock(shortages) => {
                assert_eq!(shortages.len(), 2);
                assert_eq!(shortages[0].product_id, a.id);
                assert_eq!(shortages[0].requested, 3);
                assert_eq!(shortages[0].available, 1);
                assert_eq!(shortages[1].product_id, b.id);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[test]
    fn shortage_message_names_the_product() {
        let order = test_order(OrderStatus::Pending);
        let a = test_product("Walnut Desk", dec!(10.00), 1);
        let items = [test_item(&order, &a, 3)];

        let err = plan_confirm(&order, &items, &[a]).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Walnut Desk"));
        assert!(message.contains("requested 3"));
        assert!(message.contains("available 1"));
    }

    #[test]
    fn confirm_requires_pending() {
        for status in [
            OrderStatus::Confirmed,
            OrderStatus::Completed,
            OrderStatus::Canceled,
        ] {
            let order = test_order(status);
            let err = plan_confirm(&order, &[], &[]).unwrap_err();
            assert_eq!(
                err,
                TransitionError::InvalidTransition {
                    from: status,
                    to: OrderStatus::Confirmed,
                }
            );
        }
    }

    #[test]
    fn cancel_releases_every_line() {
        let a = test_product("A", dec!(10.00), 5);
        let b = test_product("B", dec!(20.00), 5);
        for status in [OrderStatus::Pending, OrderStatus::Confirmed] {
            let order = test_order(status);
            let items = [test_item(&order, &a, 2), test_item(&order, &b, 4)];
            let plan = plan_cancel(&order, &items).unwrap();
            assert_eq!(plan.increments, vec![(a.id, 2), (b.id, 4)]);
        }
    }

    #[test]
    fn cancel_of_finished_order_fails() {
        for status in [OrderStatus::Completed, OrderStatus::Canceled] {
            let order = test_order(status);
            let err = plan_cancel(&order, &[]).unwrap_err();
            assert_eq!(
                err,
                TransitionError::InvalidTransition {
                    from: status,
                    to: OrderStatus::Canceled,
                }
            );
        }
    }

    #[test]
    fn complete_only_from_confirmed() {
        assert!(check_complete(&test_order(OrderStatus::Confirmed)).is_ok());
        for status in [
            OrderStatus::Pending,
            OrderStatus::Completed,
            OrderStatus::Canceled,
        ] {
            assert!(check_complete(&test_order(status)).is_err());
        }
    }

    #[test]
    fn regenerate_resnapshots_from_current_catalog() {
        let source = test_order(OrderStatus::Completed);
        let product = test_product("A", dec!(80.00), 5);
        // The historical line was priced before the product price changed.
        let mut item = test_item(&source, &product, 2);
        item.price = dec!(50.00);
        item.discount_percentage = Some(dec!(10));

        let now = Utc::now();
        let discount = Discount {
            id: DiscountId::new(),
            product_id: product.id,
            percentage: dec!(25),
            starts_at: now - Duration::hours(1),
            ends_at: now + Duration::hours(1),
            is_active: true,
        };

        let lines = regenerate_lines(&[item], &[product.clone()], &[discount], now).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 2);
        assert_eq!(lines[0].snapshot.price, dec!(80.00));
        assert_eq!(lines[0].snapshot.discount_percentage, Some(dec!(25)));
    }

    #[test]
    fn regenerate_fails_when_a_product_is_gone() {
        let source = test_order(OrderStatus::Canceled);
        let product = test_product("A", dec!(10.00), 5);
        let item = test_item(&source, &product, 1);

        let err = regenerate_lines(&[item], &[], &[], Utc::now()).unwrap_err();
        assert_eq!(err, DomainError::NotFound);
    }
}
