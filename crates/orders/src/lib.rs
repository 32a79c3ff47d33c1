//! `shopworks-orders` — order pricing and lifecycle domain.
//!
//! Pure computation and decision logic: the pricing engine over line-item
//! snapshots, the order status machine with its inventory planning, the
//! line-item validation chain, and regeneration of historical orders at
//! current prices. Execution (transactions, locking, persistence) lives in
//! `shopworks-infra`.

pub mod item;
pub mod order;
pub mod pricing;
pub mod validate;

pub use item::{OrderItem, Snapshot, snapshot_now};
pub use order::{
    Order, OrderStatus, RegeneratedLine, ReleasePlan, ReservationPlan, StockShortage,
    TrackingCode, TransitionError, check_complete, plan_cancel, plan_confirm, regenerate_lines,
};
pub use pricing::{line_total, order_total};
pub use validate::{LineItemCandidate, validate_line_item};
