//! Ledger error model.

use thiserror::Error;

use crate::id::ProductId;

/// Result type used across the ledger.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Ledger-level error.
///
/// Every operation returns one of these as a typed result. `InsufficientStock`
/// is the order-rejection path; `LockTimeout` and `Unavailable` are transient
/// and safe for the caller to retry with backoff.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// No stock record exists for the product.
    #[error("no stock record for product {0}")]
    NotFound(ProductId),

    /// A stock record already exists for the product.
    #[error("stock record already exists for product {0}")]
    AlreadyExists(ProductId),

    /// A reservation asked for more units than are available.
    #[error("insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: ProductId,
        available: u64,
        requested: u64,
    },

    /// A confirm/release asked for more units than are reserved.
    #[error("invalid state for product {product_id}: reserved {reserved}, requested {requested}")]
    InvalidState {
        product_id: ProductId,
        reserved: u64,
        requested: u64,
    },

    /// A request parameter failed validation (zero quantity, overflow, malformed id).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Exclusive access was not obtained within the configured deadline.
    /// The mutation was not applied.
    #[error("timed out waiting for exclusive access to product {0}")]
    LockTimeout(ProductId),

    /// The backing store could not serve the request.
    #[error("stock store unavailable: {0}")]
    Unavailable(String),

    /// The ledger caught itself producing an inconsistent record. Nothing was
    /// written; this is a bug, not bad input.
    #[error("internal ledger error: {0}")]
    Internal(String),
}

impl LedgerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Transient failures the caller may retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::LockTimeout(_) | Self::Unavailable(_))
    }

    /// Stable machine-readable code (used by the HTTP layer and logs).
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::AlreadyExists(_) => "already_exists",
            Self::InsufficientStock { .. } => "insufficient_stock",
            Self::InvalidState { .. } => "invalid_state",
            Self::Validation(_) => "validation_error",
            Self::LockTimeout(_) => "lock_timeout",
            Self::Unavailable(_) => "unavailable",
            Self::Internal(_) => "internal_error",
        }
    }
}
