//! Key-value backend error types.

use cart_core::CartError;
use thiserror::Error;

/// Errors that can occur when talking to the key-value backend.
///
/// A missing key is not an error; `get` returns `None` for it.
#[derive(Error, Debug)]
pub enum KvError {
    /// Backend refused the connection or failed the command.
    #[error("Store operation failed: {0}")]
    Unavailable(String),

    /// Backend did not answer in time.
    #[error("Store operation timed out: {0}")]
    Timeout(String),

    /// Backend does not implement the requested operation.
    #[error("Operation not supported by this store: {0}")]
    Unsupported(&'static str),
}

impl From<KvError> for CartError {
    fn from(e: KvError) -> Self {
        CartError::StoreUnavailable(e.to_string())
    }
}
