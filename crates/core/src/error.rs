//! Domain error model.

use thiserror::Error;

/// Result type used across the core.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic failures. Every variant is raised before any
/// state changes, so callers can always retry with corrected input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed or out-of-range request parameters (non-positive quantity,
    /// unknown warehouse/SKU, unknown action type).
    #[error("validation failed: {0}")]
    Validation(String),

    /// No source warehouse holds enough stock to satisfy a transfer request.
    #[error("insufficient stock: {0}")]
    InsufficientStock(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn insufficient_stock(msg: impl Into<String>) -> Self {
        Self::InsufficientStock(msg.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_insufficient_stock(&self) -> bool {
        matches!(self, Self::InsufficientStock(_))
    }
}
