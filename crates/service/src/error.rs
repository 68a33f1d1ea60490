use thiserror::Error;

use shipsync_core::DomainError;
use shipsync_events::EventLogError;

/// Error surfaced by every [`ShipSyncCore`](crate::ShipSyncCore) operation.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Validation or insufficient-stock failure; nothing was changed.
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Log(#[from] EventLogError),

    /// Fan-out failed after the event was appended to the log.
    #[error("publication failed: {0}")]
    Publish(String),
}

impl CoreError {
    pub fn is_validation(&self) -> bool {
        matches!(self, CoreError::Domain(e) if e.is_validation())
    }

    pub fn is_insufficient_stock(&self) -> bool {
        matches!(self, CoreError::Domain(e) if e.is_insufficient_stock())
    }
}
