//! Event publishing/subscription abstraction (mechanics only).
//!
//! A small pub/sub seam between catalog writes and the recompute dispatcher.
//! The contract is deliberately loose:
//!
//! - **Transport-agnostic**: in-memory channels here; a broker would fit the
//!   same trait.
//! - **At-least-once delivery**: consumers must be idempotent. The recompute
//!   dispatcher is: it derives totals fresh from current snapshots and never
//!   accumulates deltas.
//! - **No ordering guarantees across publishers**: events for different
//!   products/orders are independent and may be processed in any order.
//! - **No persistence**: the relational store is the source of truth; a lost
//!   notification is repaired by the next recompute touching the same data.

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

/// A subscription to an event stream.
///
/// Each subscription receives a copy of every event published to the bus
/// (broadcast semantics). Designed for single-threaded consumption, one
/// worker loop per subscription.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Block until the next message is available.
    pub fn recv(&self) -> Result<M, std::sync::mpsc::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, std::sync::mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, std::sync::mpsc::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

/// Domain-agnostic event bus (pub/sub abstraction).
///
/// `publish()` can fail (bus closed, transport error). Since the store has
/// already committed by the time an event is published, the caller may retry
/// or drop the notification; the dispatcher heals on the next event for the
/// same product either way.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        (**self).publish(message)
    }

    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }
}
