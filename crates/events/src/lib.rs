//! Catalog/order change notifications and the bus that carries them.
//!
//! Persistence is state-based: the relational rows are the source of truth.
//! Events here are **change notifications** driving the recompute dispatcher,
//! not a storage mechanism. Consumers re-read current state, so delivery may
//! be at-least-once and out of order.

pub mod bus;
pub mod catalog;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use catalog::CatalogEvent;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
