//! `shipsync-service`: the operation surface of the redistribution core.
//!
//! Transport layers (GraphQL, HTTP, WebSocket) call into [`ShipSyncCore`]; this crate
//! contains no IO itself.

pub mod applier;
pub mod config;
pub mod error;
pub mod services;

pub use applier::ActionApplier;
pub use config::CoreConfig;
pub use error::CoreError;
pub use services::ShipSyncCore;
