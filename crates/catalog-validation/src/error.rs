//! Protocol error types.

use std::fmt;
use std::time::Duration;

use cart_core::Interrupted;
use thiserror::Error;

/// Status code carried by a failed protocol call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    InvalidArgument,
    Internal,
    DeadlineExceeded,
    Cancelled,
    Unavailable,
}

impl StatusCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusCode::InvalidArgument => "INVALID_ARGUMENT",
            StatusCode::Internal => "INTERNAL",
            StatusCode::DeadlineExceeded => "DEADLINE_EXCEEDED",
            StatusCode::Cancelled => "CANCELLED",
            StatusCode::Unavailable => "UNAVAILABLE",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors a protocol call can fail with.
///
/// "Product not found" is not among them: it is a normal negative response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Malformed request, rejected before any lookup.
    #[error("{0}")]
    InvalidArgument(String),

    /// The product backend failed.
    #[error("{0}")]
    Internal(String),

    /// The caller's deadline passed.
    #[error("Deadline exceeded after {0:?}")]
    DeadlineExceeded(Duration),

    /// The caller canceled.
    #[error("Request cancelled")]
    Cancelled,

    /// The catalog service could not be reached.
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
}

impl CatalogError {
    /// Status code for this error.
    pub fn code(&self) -> StatusCode {
        match self {
            CatalogError::InvalidArgument(_) => StatusCode::InvalidArgument,
            CatalogError::Internal(_) => StatusCode::Internal,
            CatalogError::DeadlineExceeded(_) => StatusCode::DeadlineExceeded,
            CatalogError::Cancelled => StatusCode::Cancelled,
            CatalogError::Unavailable(_) => StatusCode::Unavailable,
        }
    }
}

impl From<Interrupted> for CatalogError {
    fn from(e: Interrupted) -> Self {
        match e {
            Interrupted::Timeout(budget) => CatalogError::DeadlineExceeded(budget),
            Interrupted::Canceled => CatalogError::Cancelled,
        }
    }
}

/// The product backend failed for a reason other than "not found".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Product lookup failed: {0}")]
pub struct LookupError(pub String);

impl LookupError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Errors loading a product list.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read product file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON product list: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid TOML product list: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unsupported product file format: {0}")]
    UnsupportedFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            CatalogError::InvalidArgument("x".into()).code().as_str(),
            "INVALID_ARGUMENT"
        );
        assert_eq!(CatalogError::Internal("x".into()).code(), StatusCode::Internal);
        assert_eq!(CatalogError::Cancelled.code().to_string(), "CANCELLED");
    }

    #[test]
    fn test_interrupted_conversion() {
        let err = CatalogError::from(Interrupted::Timeout(Duration::from_secs(2)));
        assert_eq!(err, CatalogError::DeadlineExceeded(Duration::from_secs(2)));
        assert_eq!(CatalogError::from(Interrupted::Canceled), CatalogError::Cancelled);
    }
}
