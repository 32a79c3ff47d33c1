//! Order store: lifecycle execution and line-item mutation.
//!
//! Every operation that touches more than one row runs inside a single
//! transaction. The locking protocol is the same everywhere: the order row
//! first (`FOR UPDATE`), then the product rows in ascending id order, then
//! writes. Stock checks for all lines complete before any inventory write,
//! so a failing confirm changes nothing, and two concurrent confirms on the
//! same product serialize on the row lock instead of both passing the check.

use chrono::{DateTime, Months, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use tracing::instrument;
use uuid::Uuid;

use shopworks_catalog::{Discount, Product};
use shopworks_core::{DomainError, OrderId, OrderItemId, ProductId, UserId};
use shopworks_orders::{
    LineItemCandidate, Order, OrderItem, OrderStatus, TrackingCode, TransitionError,
    check_complete, order_total, plan_cancel, plan_confirm, regenerate_lines, snapshot_now,
    validate_line_item,
};

use super::{StoreError, map_sqlx_error, non_negative};

/// Order read/write service. Stateless: construct one wherever needed from
/// the shared pool.
#[derive(Debug, Clone)]
pub struct OrderService {
    pool: PgPool,
}

/// An order together with its line items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderView {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

impl OrderView {
    /// Whether the front-end should allow line-item editing.
    pub fn is_pending(&self) -> bool {
        self.order.is_pending()
    }
}

/// Pagination request: 1-based page, clamped page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    page: u32,
    page_size: u32,
}

impl Page {
    pub const DEFAULT_SIZE: u32 = 5;
    pub const MAX_SIZE: u32 = 10;

    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size
                .unwrap_or(Self::DEFAULT_SIZE)
                .clamp(1, Self::MAX_SIZE),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of results plus the overall count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total: i64,
}

/// Top-selling report entry: summed line-item quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopSeller {
    pub product_id: ProductId,
    pub product_name: String,
    pub total_quantity: i64,
}

/// One customer's completed-order income over the report window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerIncome {
    pub customer_id: UserId,
    pub income: Decimal,
}

/// Monthly income report: overall sum plus the top five customers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyIncome {
    pub total_income: Option<Decimal>,
    pub top_customers: Vec<CustomerIncome>,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRecord {
    id: Uuid,
    customer_id: Uuid,
    status: String,
    total_price: Decimal,
    tracking_code: String,
    created_at: DateTime<Utc>,
}

impl OrderRecord {
    fn into_domain(self) -> Result<Order, StoreError> {
        Ok(Order {
            id: OrderId::from_uuid(self.id),
            customer: UserId::from_uuid(self.customer_id),
            status: parse_status(&self.status)?,
            total_price: self.total_price,
            tracking_code: TrackingCode::from_string(self.tracking_code),
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRecord {
    id: Uuid,
    order_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    price: Decimal,
    discount_percentage: Option<Decimal>,
    created_at: DateTime<Utc>,
}

impl OrderItemRecord {
    fn into_domain(self) -> Result<OrderItem, StoreError> {
        Ok(OrderItem {
            id: OrderItemId::from_uuid(self.id),
            order_id: OrderId::from_uuid(self.order_id),
            product_id: ProductId::from_uuid(self.product_id),
            quantity: non_negative(self.quantity, "quantity")?,
            price: self.price,
            discount_percentage: self.discount_percentage,
            created_at: self.created_at,
        })
    }
}

fn parse_status(status: &str) -> Result<OrderStatus, StoreError> {
    match status {
        "PENDING" => Ok(OrderStatus::Pending),
        "CONFIRMED" => Ok(OrderStatus::Confirmed),
        "COMPLETED" => Ok(OrderStatus::Completed),
        "CANCELED" => Ok(OrderStatus::Canceled),
        other => Err(StoreError::Corrupt(format!("unknown order status {other:?}"))),
    }
}

const ORDER_COLUMNS: &str = "id, customer_id, status, total_price, tracking_code, created_at";
const ITEM_COLUMNS: &str =
    "id, order_id, product_id, quantity, price, discount_percentage, created_at";

pub(crate) async fn fetch_order(conn: &mut PgConnection, id: OrderId) -> Result<Order, StoreError> {
    sqlx::query_as::<_, OrderRecord>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
        .bind(id.as_uuid())
        .fetch_one(conn)
        .await
        .map_err(|e| map_sqlx_error("fetch_order", e))?
        .into_domain()
}

/// Lock and load an order row; the lock is held until the transaction ends.
async fn fetch_order_for_update(conn: &mut PgConnection, id: OrderId) -> Result<Order, StoreError> {
    sqlx::query_as::<_, OrderRecord>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
    ))
    .bind(id.as_uuid())
    .fetch_one(conn)
    .await
    .map_err(|e| map_sqlx_error("fetch_order_for_update", e))?
    .into_domain()
}

async fn fetch_items(conn: &mut PgConnection, order_id: OrderId) -> Result<Vec<OrderItem>, StoreError> {
    let records = sqlx::query_as::<_, OrderItemRecord>(&format!(
        "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY created_at, id"
    ))
    .bind(order_id.as_uuid())
    .fetch_all(conn)
    .await
    .map_err(|e| map_sqlx_error("fetch_items", e))?;
    records.into_iter().map(OrderItemRecord::into_domain).collect()
}

/// Lock product rows in ascending id order (stable order prevents lock
/// cycles between concurrent transitions) and load them.
async fn lock_products(
    conn: &mut PgConnection,
    product_ids: &[ProductId],
) -> Result<Vec<Product>, StoreError> {
    let uuids: Vec<Uuid> = product_ids.iter().map(|p| *p.as_uuid()).collect();
    let records = sqlx::query_as::<_, super::products::ProductRecord>(&format!(
        "SELECT {} FROM products WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        super::products::PRODUCT_COLUMNS
    ))
    .bind(&uuids)
    .fetch_all(conn)
    .await
    .map_err(|e| map_sqlx_error("lock_products", e))?;
    records.into_iter().map(|r| r.into_domain()).collect()
}

async fn fetch_product(
    conn: &mut PgConnection,
    product_id: ProductId,
) -> Result<Option<Product>, StoreError> {
    let record = sqlx::query_as::<_, super::products::ProductRecord>(&format!(
        "SELECT {} FROM products WHERE id = $1",
        super::products::PRODUCT_COLUMNS
    ))
    .bind(product_id.as_uuid())
    .fetch_optional(conn)
    .await
    .map_err(|e| map_sqlx_error("fetch_product", e))?;
    record.map(|r| r.into_domain()).transpose()
}

async fn fetch_discounts(
    conn: &mut PgConnection,
    product_ids: &[ProductId],
) -> Result<Vec<Discount>, StoreError> {
    let uuids: Vec<Uuid> = product_ids.iter().map(|p| *p.as_uuid()).collect();
    let records = sqlx::query_as::<_, super::discounts::DiscountRecord>(
        "SELECT id, product_id, percentage, starts_at, ends_at, is_active
         FROM discounts WHERE product_id = ANY($1)",
    )
    .bind(&uuids)
    .fetch_all(conn)
    .await
    .map_err(|e| map_sqlx_error("fetch_discounts", e))?;
    Ok(records
        .into_iter()
        .map(super::discounts::DiscountRecord::into_domain)
        .collect())
}

async fn set_status(
    conn: &mut PgConnection,
    order_id: OrderId,
    status: OrderStatus,
) -> Result<(), StoreError> {
    sqlx::query("UPDATE orders SET status = $2, updated_at = now() WHERE id = $1")
        .bind(order_id.as_uuid())
        .bind(status.as_str())
        .execute(conn)
        .await
        .map_err(|e| map_sqlx_error("set_status", e))?;
    Ok(())
}

async fn adjust_inventory(
    conn: &mut PgConnection,
    product_id: ProductId,
    delta: i64,
) -> Result<(), StoreError> {
    sqlx::query("UPDATE products SET inventory = inventory + $2, updated_at = now() WHERE id = $1")
        .bind(product_id.as_uuid())
        .bind(delta)
        .execute(conn)
        .await
        .map_err(|e| map_sqlx_error("adjust_inventory", e))?;
    Ok(())
}

/// Re-derive and persist one order's total from its current line items.
async fn recompute_total(conn: &mut PgConnection, order_id: OrderId) -> Result<Decimal, StoreError> {
    let items = fetch_items(conn, order_id).await?;
    let total = order_total(&items);
    sqlx::query("UPDATE orders SET total_price = $2, updated_at = now() WHERE id = $1")
        .bind(order_id.as_uuid())
        .bind(total)
        .execute(conn)
        .await
        .map_err(|e| map_sqlx_error("recompute_total", e))?;
    Ok(total)
}

/// Shared cancel path: caller holds the order row lock and has re-checked
/// the status. Releases every line's quantity back to stock, then flips the
/// status. Used by manual cancel and by the stale-pending sweep.
pub(crate) async fn cancel_locked(
    conn: &mut PgConnection,
    order: &Order,
) -> Result<(), StoreError> {
    let items = fetch_items(conn, order.id).await?;
    let plan = plan_cancel(order, &items)?;

    let mut product_ids: Vec<ProductId> = plan.increments.iter().map(|(p, _)| *p).collect();
    product_ids.sort();
    lock_products(conn, &product_ids).await?;

    for (product_id, quantity) in &plan.increments {
        adjust_inventory(conn, *product_id, i64::from(*quantity)).await?;
    }
    set_status(conn, order.id, OrderStatus::Canceled).await
}

impl OrderService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self, op: &'static str) -> Result<sqlx::Transaction<'_, sqlx::Postgres>, StoreError> {
        self.pool.begin().await.map_err(|e| map_sqlx_error(op, e))
    }

    #[instrument(skip(self), fields(customer = %customer), err)]
    pub async fn create_order(
        &self,
        customer: UserId,
        now: DateTime<Utc>,
    ) -> Result<OrderView, StoreError> {
        let order = Order::new(OrderId::new(), customer, now);
        sqlx::query(
            "INSERT INTO orders (id, customer_id, status, total_price, tracking_code, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(order.id.as_uuid())
        .bind(order.customer.as_uuid())
        .bind(order.status.as_str())
        .bind(order.total_price)
        .bind(order.tracking_code.as_str())
        .bind(order.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_order", e))?;

        Ok(OrderView {
            order,
            items: Vec::new(),
        })
    }

    pub async fn get_order(&self, id: OrderId) -> Result<OrderView, StoreError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| map_sqlx_error("get_order", e))?;
        let order = fetch_order(&mut *conn, id).await?;
        let items = fetch_items(&mut *conn, id).await?;
        Ok(OrderView { order, items })
    }

    /// Add a product to a pending order.
    ///
    /// Validation (product exists, quantity >= 1, quantity within stock)
    /// runs before any write; on success the line is created with a fresh
    /// price/discount snapshot and the order total is recomputed, all in one
    /// transaction.
    #[instrument(skip(self), fields(order_id = %order_id, product_id = %product_id), err)]
    pub async fn add_item(
        &self,
        order_id: OrderId,
        product_id: ProductId,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<OrderView, StoreError> {
        let mut tx = self.begin("add_item").await?;

        let order = fetch_order_for_update(&mut *tx, order_id).await?;
        if !order.is_pending() {
            return Err(TransitionError::NotPending {
                status: order.status,
            }
            .into());
        }

        let product = fetch_product(&mut *tx, product_id).await?;
        validate_line_item(&LineItemCandidate {
            product: product.as_ref(),
            quantity,
        })?;
        let product = product.ok_or(DomainError::NotFound)?;

        let discounts = fetch_discounts(&mut *tx, &[product_id]).await?;
        let snapshot = snapshot_now(&product, &discounts, now);

        sqlx::query(
            "INSERT INTO order_items (id, order_id, product_id, quantity, price, discount_percentage)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(OrderItemId::new().as_uuid())
        .bind(order_id.as_uuid())
        .bind(product_id.as_uuid())
        .bind(quantity as i32)
        .bind(snapshot.price)
        .bind(snapshot.discount_percentage)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("add_item", e))?;

        recompute_total(&mut *tx, order_id).await?;
        tx.commit().await.map_err(|e| map_sqlx_error("add_item", e))?;

        self.get_order(order_id).await
    }

    /// Change a line's quantity. The snapshot is refreshed along the way, so
    /// an edit also picks up the product's current price and discount.
    #[instrument(skip(self), fields(order_id = %order_id, product_id = %product_id), err)]
    pub async fn update_item(
        &self,
        order_id: OrderId,
        product_id: ProductId,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<OrderView, StoreError> {
        let mut tx = self.begin("update_item").await?;

        let order = fetch_order_for_update(&mut *tx, order_id).await?;
        if !order.is_pending() {
            return Err(TransitionError::NotPending {
                status: order.status,
            }
            .into());
        }

        let product = fetch_product(&mut *tx, product_id).await?;
        validate_line_item(&LineItemCandidate {
            product: product.as_ref(),
            quantity,
        })?;
        let product = product.ok_or(DomainError::NotFound)?;

        let discounts = fetch_discounts(&mut *tx, &[product_id]).await?;
        let snapshot = snapshot_now(&product, &discounts, now);

        let updated = sqlx::query(
            "UPDATE order_items
             SET quantity = $3, price = $4, discount_percentage = $5
             WHERE order_id = $1 AND product_id = $2",
        )
        .bind(order_id.as_uuid())
        .bind(product_id.as_uuid())
        .bind(quantity as i32)
        .bind(snapshot.price)
        .bind(snapshot.discount_percentage)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_item", e))?;
        if updated.rows_affected() == 0 {
            return Err(DomainError::NotFound.into());
        }

        recompute_total(&mut *tx, order_id).await?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("update_item", e))?;

        self.get_order(order_id).await
    }

    /// Remove a product's line from a pending order.
    #[instrument(skip(self), fields(order_id = %order_id, product_id = %product_id), err)]
    pub async fn remove_item(
        &self,
        order_id: OrderId,
        product_id: ProductId,
    ) -> Result<OrderView, StoreError> {
        let mut tx = self.begin("remove_item").await?;

        let order = fetch_order_for_update(&mut *tx, order_id).await?;
        if !order.is_pending() {
            return Err(TransitionError::NotPending {
                status: order.status,
            }
            .into());
        }

        let deleted = sqlx::query("DELETE FROM order_items WHERE order_id = $1 AND product_id = $2")
            .bind(order_id.as_uuid())
            .bind(product_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("remove_item", e))?;
        if deleted.rows_affected() == 0 {
            return Err(DomainError::NotFound.into());
        }

        recompute_total(&mut *tx, order_id).await?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("remove_item", e))?;

        self.get_order(order_id).await
    }

    /// Confirm a pending order: check stock for every line, then decrement
    /// every product's inventory and flip the status, all or nothing. From
    /// here on the total is frozen.
    #[instrument(skip(self), fields(order_id = %order_id), err)]
    pub async fn confirm(&self, order_id: OrderId) -> Result<OrderView, StoreError> {
        let mut tx = self.begin("confirm").await?;

        let order = fetch_order_for_update(&mut *tx, order_id).await?;
        let items = fetch_items(&mut *tx, order_id).await?;

        let mut product_ids: Vec<ProductId> = items.iter().map(|i| i.product_id).collect();
        product_ids.sort();
        let products = lock_products(&mut *tx, &product_ids).await?;

        let plan = plan_confirm(&order, &items, &products)?;
        for (product_id, quantity) in &plan.decrements {
            adjust_inventory(&mut *tx, *product_id, -i64::from(*quantity)).await?;
        }
        set_status(&mut *tx, order_id, OrderStatus::Confirmed).await?;

        tx.commit().await.map_err(|e| map_sqlx_error("confirm", e))?;
        self.get_order(order_id).await
    }

    /// Cancel a pending or confirmed order, releasing every line's quantity
    /// back to stock.
    #[instrument(skip(self), fields(order_id = %order_id), err)]
    pub async fn cancel(&self, order_id: OrderId) -> Result<OrderView, StoreError> {
        let mut tx = self.begin("cancel").await?;

        let order = fetch_order_for_update(&mut *tx, order_id).await?;
        cancel_locked(&mut *tx, &order).await?;

        tx.commit().await.map_err(|e| map_sqlx_error("cancel", e))?;
        self.get_order(order_id).await
    }

    /// Complete a confirmed order. Pure status flip; inventory was already
    /// committed at confirm time.
    #[instrument(skip(self), fields(order_id = %order_id), err)]
    pub async fn complete(&self, order_id: OrderId) -> Result<OrderView, StoreError> {
        let mut tx = self.begin("complete").await?;

        let order = fetch_order_for_update(&mut *tx, order_id).await?;
        check_complete(&order)?;
        set_status(&mut *tx, order_id, OrderStatus::Completed).await?;

        tx.commit().await.map_err(|e| map_sqlx_error("complete", e))?;
        self.get_order(order_id).await
    }

    /// Regenerate a historical order as a fresh pending order owned by the
    /// acting user: quantities copied, prices and discounts re-snapshotted
    /// from the current catalog.
    #[instrument(skip(self), fields(source_order_id = %source_order_id, actor = %actor), err)]
    pub async fn regenerate(
        &self,
        source_order_id: OrderId,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> Result<OrderView, StoreError> {
        let mut tx = self.begin("regenerate").await?;

        // The source can be in any status; it is only read.
        fetch_order(&mut *tx, source_order_id).await?;
        let source_items = fetch_items(&mut *tx, source_order_id).await?;

        let product_ids: Vec<ProductId> = source_items.iter().map(|i| i.product_id).collect();
        let mut products = Vec::with_capacity(product_ids.len());
        for product_id in &product_ids {
            if let Some(product) = fetch_product(&mut *tx, *product_id).await? {
                products.push(product);
            }
        }
        let discounts = fetch_discounts(&mut *tx, &product_ids).await?;

        let lines = regenerate_lines(&source_items, &products, &discounts, now)?;

        let order = Order::new(OrderId::new(), actor, now);
        sqlx::query(
            "INSERT INTO orders (id, customer_id, status, total_price, tracking_code, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(order.id.as_uuid())
        .bind(order.customer.as_uuid())
        .bind(order.status.as_str())
        .bind(order.total_price)
        .bind(order.tracking_code.as_str())
        .bind(order.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("regenerate", e))?;

        for line in &lines {
            sqlx::query(
                "INSERT INTO order_items (id, order_id, product_id, quantity, price, discount_percentage)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(OrderItemId::new().as_uuid())
            .bind(order.id.as_uuid())
            .bind(line.product_id.as_uuid())
            .bind(line.quantity as i32)
            .bind(line.snapshot.price)
            .bind(line.snapshot.discount_percentage)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("regenerate", e))?;
        }

        recompute_total(&mut *tx, order.id).await?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("regenerate", e))?;

        self.get_order(order.id).await
    }

    /// One page of a customer's orders, newest first.
    pub async fn list_for_customer(
        &self,
        customer: UserId,
        page: Page,
    ) -> Result<Paginated<OrderView>, StoreError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE customer_id = $1")
            .bind(customer.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_for_customer", e))?;

        let records = sqlx::query_as::<_, OrderRecord>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders
             WHERE customer_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        ))
        .bind(customer.as_uuid())
        .bind(i64::from(page.page_size()))
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_for_customer", e))?;

        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| map_sqlx_error("list_for_customer", e))?;
        let mut views = Vec::with_capacity(records.len());
        for record in records {
            let order = record.into_domain()?;
            let items = fetch_items(&mut *conn, order.id).await?;
            views.push(OrderView { order, items });
        }

        Ok(Paginated {
            items: views,
            page: page.page(),
            page_size: page.page_size(),
            total,
        })
    }

    /// Top-selling products by summed line-item quantity, descending.
    pub async fn top_selling(&self, limit: i64) -> Result<Vec<TopSeller>, StoreError> {
        let rows = sqlx::query_as::<_, (Uuid, String, i64)>(
            "SELECT oi.product_id, p.name, SUM(oi.quantity)::BIGINT AS total_quantity
             FROM order_items oi
             JOIN products p ON p.id = oi.product_id
             GROUP BY oi.product_id, p.name
             ORDER BY total_quantity DESC
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("top_selling", e))?;

        Ok(rows
            .into_iter()
            .map(|(product_id, product_name, total_quantity)| TopSeller {
                product_id: ProductId::from_uuid(product_id),
                product_name,
                total_quantity,
            })
            .collect())
    }

    /// Income from completed orders over the past month: overall sum plus
    /// the top five customers by income.
    pub async fn monthly_income(&self, now: DateTime<Utc>) -> Result<MonthlyIncome, StoreError> {
        let cutoff = now.checked_sub_months(Months::new(1)).unwrap_or(now);

        let rows = sqlx::query_as::<_, (Uuid, Decimal)>(
            "SELECT customer_id, SUM(total_price) AS income
             FROM orders
             WHERE status = 'COMPLETED' AND created_at >= $1
             GROUP BY customer_id
             ORDER BY income DESC",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("monthly_income", e))?;

        let total_income = if rows.is_empty() {
            None
        } else {
            Some(rows.iter().map(|(_, income)| *income).sum())
        };
        let top_customers = rows
            .into_iter()
            .take(5)
            .map(|(customer_id, income)| CustomerIncome {
                customer_id: UserId::from_uuid(customer_id),
                income,
            })
            .collect();

        Ok(MonthlyIncome {
            total_income,
            top_customers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_and_clamps() {
        let default = Page::default();
        assert_eq!(default.page(), 1);
        assert_eq!(default.page_size(), Page::DEFAULT_SIZE);

        let clamped = Page::new(Some(0), Some(50));
        assert_eq!(clamped.page(), 1);
        assert_eq!(clamped.page_size(), Page::MAX_SIZE);

        let third = Page::new(Some(3), Some(10));
        assert_eq!(third.offset(), 20);
    }

    #[test]
    fn unknown_status_is_corrupt() {
        assert!(parse_status("SHIPPED").is_err());
        assert_eq!(parse_status("PENDING").unwrap(), OrderStatus::Pending);
        assert_eq!(parse_status("CANCELED").unwrap(), OrderStatus::Canceled);
    }
}
