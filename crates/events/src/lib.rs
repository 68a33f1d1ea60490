//! Event ingestion and fan-out.
//!
//! - [`Event`] / [`NewEvent`]: immutable state-change facts and their drafts.
//! - [`EventLog`]: bounded, append-only ring buffer (oldest evicted first).
//! - [`EventBus`] / [`InMemoryEventBus`]: warehouse-filtered broadcast to live observers.

pub mod bus;
pub mod event;
pub mod in_memory_bus;
pub mod log;

pub use bus::{EventBus, Subscription, SubscriptionId, WarehouseScoped, passes_filter};
pub use event::{EntityKind, Event, EventId, EventKind, NewEvent};
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use log::{DEFAULT_CAPACITY, EventLog, EventLogError};
