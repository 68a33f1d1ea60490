//! `shipsync-core`: shared building blocks for the redistribution core.
//!
//! This crate contains **pure** primitives (no infrastructure concerns): identifiers,
//! the error taxonomy and the value-object marker.

pub mod error;
pub mod id;
pub mod value_object;

pub use error::{DomainError, DomainResult};
pub use id::{OrderId, RecommendationId, ShipmentId, SkuId, WarehouseId};
pub use value_object::ValueObject;
