//! Request/response DTOs and JSON mapping helpers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopworks_catalog::{Discount, Product, Review};
use shopworks_infra::{OrderView, Paginated};
use shopworks_orders::OrderItem;

// --- Requests ------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub inventory: u32,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePriceRequest {
    pub price: Decimal,
}

/// Bulk import payload: the tabular file already split into a header row
/// and data rows (cells in file order, empty cells as null).
#[derive(Debug, Deserialize)]
pub struct ImportProductsRequest {
    pub header: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

#[derive(Debug, Deserialize)]
pub struct DiscountRequest {
    pub percentage: Decimal,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateDiscountRequest {
    pub product_id: String,
    #[serde(flatten)]
    pub discount: DiscountRequest,
}

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub product_id: String,
    pub author_id: String,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateReviewRequest {
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: String,
}

#[derive(Debug, Deserialize)]
pub struct LineItemRequest {
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct AddLineItemRequest {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct RegenerateRequest {
    pub actor_id: String,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

// --- Responses -----------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub inventory: u32,
    pub description: String,
    pub rating: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    /// Effective unit price under the currently-active discount; absent
    /// (and omitted) when no discount applies right now.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discounted_price: Option<Decimal>,
}

impl ProductResponse {
    pub fn with_discounted_price(product: Product, discounted_price: Option<Decimal>) -> Self {
        Self {
            discounted_price,
            ..Self::from(product)
        }
    }
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name,
            price: product.price,
            inventory: product.inventory,
            description: product.description,
            rating: product.rating,
            created_at: product.created_at,
            discounted_price: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DiscountResponse {
    pub id: String,
    pub product_id: String,
    pub percentage: Decimal,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub is_active: bool,
}

impl From<Discount> for DiscountResponse {
    fn from(discount: Discount) -> Self {
        Self {
            id: discount.id.to_string(),
            product_id: discount.product_id.to_string(),
            percentage: discount.percentage,
            starts_at: discount.starts_at,
            ends_at: discount.ends_at,
            is_active: discount.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub id: String,
    pub product_id: String,
    pub author_id: String,
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl From<Review> for ReviewResponse {
    fn from(review: Review) -> Self {
        Self {
            id: review.id.to_string(),
            product_id: review.product_id.to_string(),
            author_id: review.author.to_string(),
            rating: review.rating,
            comment: review.comment,
            created_at: review.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub id: String,
    pub product_id: String,
    pub quantity: u32,
    pub price: Decimal,
    pub discount_percentage: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        Self {
            id: item.id.to_string(),
            product_id: item.product_id.to_string(),
            quantity: item.quantity,
            price: item.price,
            discount_percentage: item.discount_percentage,
            created_at: item.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub customer_id: String,
    pub status: String,
    pub is_pending: bool,
    pub total_price: Decimal,
    pub tracking_code: String,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemResponse>,
}

impl From<OrderView> for OrderResponse {
    fn from(view: OrderView) -> Self {
        let is_pending = view.is_pending();
        Self {
            id: view.order.id.to_string(),
            customer_id: view.order.customer.to_string(),
            status: view.order.status.to_string(),
            is_pending,
            total_price: view.order.total_price,
            tracking_code: view.order.tracking_code.to_string(),
            created_at: view.order.created_at,
            items: view.items.into_iter().map(OrderItemResponse::from).collect(),
        }
    }
}

/// Paginated envelope matching the front-end contract: page metadata plus
/// results.
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub count: i64,
    pub page: u32,
    pub page_size: u32,
    pub results: Vec<T>,
}

impl<T, S: Into<T>> From<Paginated<S>> for PaginatedResponse<T> {
    fn from(page: Paginated<S>) -> Self {
        Self {
            count: page.total,
            page: page.page,
            page_size: page.page_size,
            results: page.items.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal_macros::dec;

    use shopworks_core::{OrderId, UserId};
    use shopworks_orders::Order;

    use super::*;

    #[test]
    fn order_response_exposes_is_pending() {
        let order = Order::new(OrderId::new(), UserId::new(), Utc::now());
        let view = OrderView {
            order,
            items: Vec::new(),
        };
        let response = OrderResponse::from(view);
        assert!(response.is_pending);
        assert_eq!(response.status, "PENDING");
        assert_eq!(response.total_price, dec!(0.00));
    }
}
