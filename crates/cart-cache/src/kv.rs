//! Narrow key-value interface the cart store is written against.

use std::time::Duration;

use async_trait::async_trait;

use crate::KvError;

/// Key-value backend with per-key expiry.
///
/// The cart store holds one of these by composition; nothing above this
/// trait knows which backend is in use.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Get the raw value at `key`, or `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KvError>;

    /// Write `value` at `key`, replacing any expiry with `ttl` from now.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), KvError>;

    /// Delete `key`. Returns whether a key was removed; absence is not an error.
    async fn delete(&self, key: &str) -> Result<bool, KvError>;

    /// Write `value` only if the current value equals `expected`
    /// (`None` meaning "absent"). Returns whether the write happened.
    async fn compare_and_set(
        &self,
        _key: &str,
        _expected: Option<&[u8]>,
        _value: Vec<u8>,
        _ttl: Duration,
    ) -> Result<bool, KvError> {
        Err(KvError::Unsupported("compare_and_set"))
    }

    /// Check the backend answers.
    async fn ping(&self) -> Result<(), KvError> {
        Ok(())
    }
}

/// Whole-second expiry applied by every backend. Redis rejects `EX 0`, so
/// anything under a second rounds up to one.
pub(crate) fn expiry_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}
