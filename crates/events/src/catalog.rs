//! Catalog change events feeding the recompute dispatcher.
//!
//! These replace implicit framework hooks: catalog writes publish one of
//! these explicitly after commit, and the dispatcher refreshes every
//! affected pending order. Payloads carry only the product identity plus
//! business time; the dispatcher derives prices and active discounts from
//! the store at handling time, which is what makes reprocessing idempotent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopworks_core::ProductId;

use crate::event::Event;

/// A catalog mutation that can affect pending order totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CatalogEvent {
    /// A product's unit price was updated.
    ProductPriceChanged {
        product_id: ProductId,
        occurred_at: DateTime<Utc>,
    },
    /// A discount for the product was created or updated (including being
    /// toggled active/inactive).
    DiscountChanged {
        product_id: ProductId,
        occurred_at: DateTime<Utc>,
    },
    /// A discount for the product was deleted.
    DiscountRemoved {
        product_id: ProductId,
        occurred_at: DateTime<Utc>,
    },
}

impl CatalogEvent {
    /// The product whose pending line items need a snapshot refresh.
    pub fn product_id(&self) -> ProductId {
        match self {
            CatalogEvent::ProductPriceChanged { product_id, .. }
            | CatalogEvent::DiscountChanged { product_id, .. }
            | CatalogEvent::DiscountRemoved { product_id, .. } => *product_id,
        }
    }
}

impl Event for CatalogEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CatalogEvent::ProductPriceChanged { .. } => "catalog.product.price_changed",
            CatalogEvent::DiscountChanged { .. } => "catalog.discount.changed",
            CatalogEvent::DiscountRemoved { .. } => "catalog.discount.removed",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            CatalogEvent::ProductPriceChanged { occurred_at, .. }
            | CatalogEvent::DiscountChanged { occurred_at, .. }
            | CatalogEvent::DiscountRemoved { occurred_at, .. } => *occurred_at,
        }
    }
}
