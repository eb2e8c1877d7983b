//! Session cart store for the cart services.
//!
//! Makes the cart mutation engine durable and session-addressable over a
//! key-value backend: one JSON record per session at `cart:<session_id>`,
//! written with a sliding 24 hour TTL.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cart_cache::{MemoryStore, SessionCartStore, StoreConfig};
//! use cart_core::prelude::*;
//! use cart_observability::Logger;
//!
//! let store = SessionCartStore::new(Arc::new(MemoryStore::new()), StoreConfig::default(), Logger::disabled());
//! let ctx = CallContext::background();
//! let session = SessionId::new("s1");
//!
//! // First read of a session yields an empty cart
//! let cart = store.get(&ctx, &session).await?;
//! assert!(cart.is_empty());
//!
//! // get -> mutate -> save with a refreshed TTL
//! let cart = store.add_item(&ctx, &session, ProductId::new(42), 2, Decimal::new(1000, 2), "Mug").await?;
//! ```

mod config;
mod error;
mod kv;
mod memory;
#[cfg(feature = "redis")]
mod redis;
mod store;

pub use config::{ConcurrencyMode, RedisConfig, StoreConfig, DEFAULT_TTL_SECS};
pub use error::KvError;
pub use kv::KvStore;
pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use self::redis::RedisStore;
pub use store::SessionCartStore;

/// Helper to build cache keys with namespacing.
///
/// # Example
///
/// ```rust,ignore
/// let key = cache_key!("cart", session_id);
/// // Returns "cart:s1"
/// ```
#[macro_export]
macro_rules! cache_key {
    ($prefix:expr, $($part:expr),+) => {{
        let mut key = String::from($prefix);
        $(
            key.push(':');
            key.push_str(&$part.to_string());
        )+
        key
    }};
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{ConcurrencyMode, KvError, KvStore, MemoryStore, SessionCartStore, StoreConfig};
}
