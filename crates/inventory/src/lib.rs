//! Read-only state snapshot of the warehouse network.
//!
//! The core never owns durable storage: an external collaborator builds a
//! [`StateSnapshot`] and publishes it through a [`SnapshotStore`]. Every scan or plan
//! works against one `Arc<StateSnapshot>`, i.e. one consistent point-in-time view.

pub mod order;
pub mod snapshot;
pub mod store;

pub use order::{Order, OrderStatus, Shipment, ShipmentStatus};
pub use snapshot::{InventoryRecord, Location, Sku, SnapshotData, StateSnapshot, Warehouse};
pub use store::SnapshotStore;
