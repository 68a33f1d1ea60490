//! Publish/subscribe abstraction (mechanics only).
//!
//! A bus broadcasts every published message to all live subscriptions. Each
//! subscription may carry a warehouse filter; filtering happens per subscriber at
//! delivery time, so `publish` itself is filter-agnostic.
//!
//! ## Delivery Guarantees
//!
//! - **Ordered per subscriber**: a subscription sees messages in publish order.
//! - **Never blocks the publisher**: each subscriber owns an unbounded queue; a slow
//!   subscriber only grows its own queue, a disconnected one is dropped.
//! - **No replay**: a subscription only sees messages published after it attached.
//!   Use the [`EventLog`](crate::EventLog) for the retained history.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvError, RecvTimeoutError, TryRecvError};
use std::time::Duration;

use shipsync_core::WarehouseId;

/// Something that can be matched against a warehouse filter.
pub trait WarehouseScoped {
    /// Whether this item is relevant to observers of `warehouse`.
    fn concerns(&self, warehouse: &WarehouseId) -> bool;
}

/// Apply an optional warehouse filter. `None` lets everything through.
pub fn passes_filter<M: WarehouseScoped>(filter: Option<&WarehouseId>, item: &M) -> bool {
    filter.is_none_or(|warehouse| item.concerns(warehouse))
}

/// Bus-assigned identifier of a subscription.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub u64);

impl core::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "sub_{}", self.0)
    }
}

type DetachHook = Box<dyn FnOnce(SubscriptionId) + Send>;

/// A live registration on a bus.
///
/// Dropping the subscription (or calling [`Subscription::detach`]) unregisters it;
/// after that the bus no longer holds a sender for it, so nothing further can be
/// delivered.
///
/// ```ignore
/// let subscription = bus.subscribe(Some(WarehouseId::new("CHI")));
/// loop {
///     match subscription.recv_timeout(Duration::from_secs(1)) {
///         Ok(event) => handle(event),
///         Err(RecvTimeoutError::Timeout) => continue,
///         Err(RecvTimeoutError::Disconnected) => break,
///     }
/// }
/// ```
pub struct Subscription<M> {
    id: SubscriptionId,
    filter: Option<WarehouseId>,
    receiver: Receiver<M>,
    detach: Option<DetachHook>,
}

impl<M> Subscription<M> {
    pub fn new(
        id: SubscriptionId,
        filter: Option<WarehouseId>,
        receiver: Receiver<M>,
        detach: impl FnOnce(SubscriptionId) + Send + 'static,
    ) -> Self {
        Self {
            id,
            filter,
            receiver,
            detach: Some(Box::new(detach)),
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn filter(&self) -> Option<&WarehouseId> {
        self.filter.as_ref()
    }

    /// Block until the next message is available.
    pub fn recv(&self) -> Result<M, RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Everything already queued, without blocking.
    pub fn drain(&self) -> Vec<M> {
        self.receiver.try_iter().collect()
    }

    /// Unregister from the bus. Safe to call while another thread is publishing.
    pub fn detach(mut self) {
        self.run_detach();
    }

    fn run_detach(&mut self) {
        if let Some(hook) = self.detach.take() {
            hook(self.id);
        }
    }
}

impl<M> Drop for Subscription<M> {
    fn drop(&mut self) {
        self.run_detach();
    }
}

impl<M> core::fmt::Debug for Subscription<M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("filter", &self.filter)
            .field("attached", &self.detach.is_some())
            .finish()
    }
}

/// Broadcast channel with per-subscriber warehouse filters.
///
/// `publish` returns how many subscribers the message was delivered to.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<usize, Self::Error>;

    fn subscribe(&self, filter: Option<WarehouseId>) -> Subscription<M>;
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, message: M) -> Result<usize, Self::Error> {
        (**self).publish(message)
    }

    fn subscribe(&self, filter: Option<WarehouseId>) -> Subscription<M> {
        (**self).subscribe(filter)
    }
}
