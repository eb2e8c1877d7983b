//! Cart error types.

use std::time::Duration;

use http::StatusCode;
use thiserror::Error;

use crate::context::Interrupted;
use crate::ids::ProductId;

/// Errors that can occur in cart operations.
///
/// An absent cart record is not an error: it reads as an empty cart.
#[derive(Error, Debug)]
pub enum CartError {
    /// Update or remove referenced a product that is not in the cart.
    #[error("Item not in cart: {0}")]
    ItemNotFound(ProductId),

    /// Malformed request payload, rejected before any I/O.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The key-value backend could not be reached.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A stored cart record could not be deserialized.
    #[error("Corrupt cart record at {key}: {reason}")]
    CorruptRecord { key: String, reason: String },

    /// A cart could not be serialized for writing.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The caller's deadline elapsed before the backend answered.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// The caller canceled the operation.
    #[error("Operation canceled")]
    Canceled,

    /// Optimistic save kept losing to concurrent writers.
    #[error("Concurrent modification: gave up after {attempts} attempts")]
    Conflict { attempts: u32 },
}

impl CartError {
    /// Stable machine-readable kind, suitable for error bodies and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            CartError::ItemNotFound(_) => "item_not_found",
            CartError::Validation(_) => "validation_error",
            CartError::StoreUnavailable(_) => "store_unavailable",
            CartError::CorruptRecord { .. } => "corrupt_record",
            CartError::Serialization(_) => "serialization_error",
            CartError::Timeout(_) => "timeout",
            CartError::Canceled => "canceled",
            CartError::Conflict { .. } => "conflict",
        }
    }

    /// HTTP status an adapter should answer with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            CartError::ItemNotFound(_) => StatusCode::NOT_FOUND,
            CartError::Validation(_) => StatusCode::BAD_REQUEST,
            CartError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            CartError::Canceled => StatusCode::REQUEST_TIMEOUT,
            CartError::Conflict { .. } => StatusCode::CONFLICT,
            CartError::StoreUnavailable(_)
            | CartError::CorruptRecord { .. }
            | CartError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the client caused this error.
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl From<Interrupted> for CartError {
    fn from(e: Interrupted) -> Self {
        match e {
            Interrupted::Timeout(budget) => CartError::Timeout(budget),
            Interrupted::Canceled => CartError::Canceled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            CartError::ItemNotFound(ProductId::new(99)).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            CartError::Validation("quantity".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            CartError::StoreUnavailable("refused".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            CartError::CorruptRecord {
                key: "cart:s1".into(),
                reason: "eof".into()
            }
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_kinds_are_distinguishable() {
        assert_eq!(CartError::ItemNotFound(ProductId::new(1)).kind(), "item_not_found");
        assert_eq!(CartError::Canceled.kind(), "canceled");
        assert!(CartError::Validation("x".into()).is_client_error());
        assert!(!CartError::StoreUnavailable("x".into()).is_client_error());
    }

    #[test]
    fn test_from_interrupted() {
        let err: CartError = Interrupted::Timeout(Duration::from_millis(5)).into();
        assert!(matches!(err, CartError::Timeout(d) if d == Duration::from_millis(5)));

        let err: CartError = Interrupted::Canceled.into();
        assert!(matches!(err, CartError::Canceled));
    }
}
