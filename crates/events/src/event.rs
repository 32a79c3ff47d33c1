use chrono::{DateTime, Utc};

/// A domain-agnostic change notification.
///
/// Events are:
/// - **immutable** (treat them as facts)
/// - **triggers**, not state carriers: consumers re-read the store, so a
///   replayed or duplicated event must be harmless
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name/type identifier (e.g. "catalog.product.price_changed").
    fn event_type(&self) -> &'static str;

    /// When the event occurred (business time).
    fn occurred_at(&self) -> DateTime<Utc>;
}
