//! Session cart store: the read-modify-write cycle over a key-value backend.

use std::sync::Arc;

use cart_core::{
    CallContext, Cart, CartError, CartMutation, Decimal, ProductId, SessionId, MAX_QUANTITY,
};
use cart_observability::Logger;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::{cache_key, ConcurrencyMode, KvStore, StoreConfig};

/// Durable, session-addressable carts.
///
/// One JSON record per session at `<key_prefix>:<session_id>`. Every write
/// resets the record's TTL to the full window. A missing record reads as an
/// empty cart. Nothing here retries a failed backend call.
///
/// # Example
///
/// ```rust,ignore
/// let store = SessionCartStore::new(kv, StoreConfig::default(), telemetry.logger("cart_store"));
/// let ctx = CallContext::with_timeout(Duration::from_secs(2));
///
/// let cart = store.add_item(&ctx, &session, ProductId::new(42), 2, price, "Mug").await?;
/// let cart = store.update_quantity(&ctx, &session, ProductId::new(42), 0).await?;
/// assert!(cart.is_empty());
/// ```
pub struct SessionCartStore {
    kv: Arc<dyn KvStore>,
    config: StoreConfig,
    logger: Logger,
}

impl SessionCartStore {
    /// Create a store over `kv`.
    pub fn new(kv: Arc<dyn KvStore>, config: StoreConfig, logger: Logger) -> Self {
        Self { kv, config, logger }
    }

    /// Store configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Record key for a session.
    pub fn key(&self, session_id: &SessionId) -> String {
        cache_key!(self.config.key_prefix.as_str(), session_id)
    }

    /// Read a session's cart.
    ///
    /// A missing record yields a fresh empty cart that is not persisted until
    /// the next write. An unreadable record is a [`CartError::CorruptRecord`].
    pub async fn get(&self, ctx: &CallContext, session_id: &SessionId) -> Result<Cart, CartError> {
        self.logger
            .scope("get", async {
                let cart = match self.load(ctx, session_id).await? {
                    Some((cart, _)) => cart,
                    None => {
                        debug!(session_id = %session_id, "No cart record, starting empty");
                        Cart::new(session_id.clone())
                    }
                };
                Ok::<_, CartError>(cart)
            })
            .await
    }

    /// Write a cart back with a refreshed TTL.
    ///
    /// Stamps `updated_at` (and `created_at` on first write), bumps the
    /// version and recomputes the total. Returns the cart as written; on
    /// failure the cart is dropped.
    pub async fn save(&self, ctx: &CallContext, mut cart: Cart) -> Result<Cart, CartError> {
        self.logger
            .scope("save", async move {
                let key = self.key(&cart.session_id);
                let bytes = self.encode(&key, &mut cart, Utc::now())?;
                self.write(ctx, &key, bytes).await?;
                info!(
                    session_id = %cart.session_id,
                    item_count = cart.item_count(),
                    total = %cart.total,
                    ttl_secs = self.config.ttl_secs,
                    "Saved cart"
                );
                Ok::<_, CartError>(cart)
            })
            .await
    }

    /// Delete a session's record. Deleting an absent record succeeds.
    pub async fn delete(&self, ctx: &CallContext, session_id: &SessionId) -> Result<(), CartError> {
        self.logger
            .scope("delete", async {
                let key = self.key(session_id);
                let removed = ctx.run(self.kv.delete(&key)).await??;
                debug!(session_id = %session_id, removed, "Deleted cart record");
                Ok::<_, CartError>(())
            })
            .await
    }

    /// Empty a session's cart by deleting its record.
    ///
    /// Always succeeds against a reachable backend and returns the empty cart
    /// the session now reads as.
    pub async fn clear(&self, ctx: &CallContext, session_id: &SessionId) -> Result<Cart, CartError> {
        self.logger
            .scope("clear", async {
                let key = self.key(session_id);
                ctx.run(self.kv.delete(&key)).await??;
                info!(session_id = %session_id, "Cleared cart");
                Ok::<_, CartError>(Cart::new(session_id.clone()))
            })
            .await
    }

    /// Add units of a product; an existing line keeps its first-seen price.
    ///
    /// `quantity` must be positive; zero is rejected before any I/O.
    pub async fn add_item(
        &self,
        ctx: &CallContext,
        session_id: &SessionId,
        product_id: ProductId,
        quantity: u32,
        unit_price: Decimal,
        name: impl Into<String>,
    ) -> Result<Cart, CartError> {
        if quantity == 0 {
            return Err(CartError::Validation(
                "quantity must be greater than zero".to_string(),
            ));
        }
        if quantity > MAX_QUANTITY {
            return Err(CartError::Validation(format!(
                "quantity {} exceeds {}",
                quantity, MAX_QUANTITY
            )));
        }
        if unit_price.is_sign_negative() {
            return Err(CartError::Validation(
                "unit price must not be negative".to_string(),
            ));
        }
        self.mutate(
            ctx,
            session_id,
            CartMutation::Add {
                product_id,
                quantity,
                unit_price,
                name: name.into(),
            },
        )
        .await
    }

    /// Overwrite a line's quantity; zero removes the line.
    pub async fn update_quantity(
        &self,
        ctx: &CallContext,
        session_id: &SessionId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart, CartError> {
        self.mutate(
            ctx,
            session_id,
            CartMutation::SetQuantity {
                product_id,
                quantity,
            },
        )
        .await
    }

    /// Remove a line.
    pub async fn remove_item(
        &self,
        ctx: &CallContext,
        session_id: &SessionId,
        product_id: ProductId,
    ) -> Result<Cart, CartError> {
        self.mutate(ctx, session_id, CartMutation::Remove { product_id })
            .await
    }

    /// Run one get → mutate → save cycle.
    ///
    /// Under [`ConcurrencyMode::LastWriterWins`] the get and the save are two
    /// independent round trips; a concurrent writer on the same session can
    /// be overwritten. Under [`ConcurrencyMode::Optimistic`] the save only
    /// lands if the record is unchanged since the read, and the mutation is
    /// re-applied to fresh state up to `max_attempts` times.
    pub async fn mutate(
        &self,
        ctx: &CallContext,
        session_id: &SessionId,
        mutation: CartMutation,
    ) -> Result<Cart, CartError> {
        self.logger
            .scope(mutation.action(), async {
                let result = match self.config.concurrency {
                    ConcurrencyMode::LastWriterWins => {
                        self.mutate_unguarded(ctx, session_id, &mutation).await
                    }
                    ConcurrencyMode::Optimistic => {
                        self.mutate_optimistic(ctx, session_id, &mutation).await
                    }
                };

                let product_id = mutation.product_id().map(|p| p.get());
                match &result {
                    Ok(cart) => info!(
                        session_id = %session_id,
                        product_id,
                        item_count = cart.item_count(),
                        total = %cart.total,
                        ttl_secs = self.config.ttl_secs,
                        "Cart updated"
                    ),
                    Err(e) if e.is_client_error() => warn!(
                        session_id = %session_id,
                        product_id,
                        kind = e.kind(),
                        error = %e,
                        "Cart mutation rejected"
                    ),
                    Err(e) => error!(
                        session_id = %session_id,
                        product_id,
                        kind = e.kind(),
                        error = %e,
                        "Cart mutation failed"
                    ),
                }
                result
            })
            .await
    }

    /// Check that the backend answers.
    pub async fn health_check(&self, ctx: &CallContext) -> Result<(), CartError> {
        self.logger
            .scope("health_check", async {
                ctx.run(self.kv.ping()).await?.map_err(|e| {
                    warn!(error = %e, "Store health check failed");
                    CartError::from(e)
                })
            })
            .await
    }

    async fn mutate_unguarded(
        &self,
        ctx: &CallContext,
        session_id: &SessionId,
        mutation: &CartMutation,
    ) -> Result<Cart, CartError> {
        let key = self.key(session_id);
        let mut cart = match self.load(ctx, session_id).await? {
            Some((cart, _)) => cart,
            None => Cart::new(session_id.clone()),
        };

        let now = Utc::now();
        mutation.apply(&mut cart, now)?;
        let bytes = self.encode(&key, &mut cart, now)?;
        self.write(ctx, &key, bytes).await?;
        Ok(cart)
    }

    async fn mutate_optimistic(
        &self,
        ctx: &CallContext,
        session_id: &SessionId,
        mutation: &CartMutation,
    ) -> Result<Cart, CartError> {
        let key = self.key(session_id);
        let attempts = self.config.max_attempts.max(1);

        for attempt in 1..=attempts {
            let (mut cart, expected) = match self.load(ctx, session_id).await? {
                Some((cart, raw)) => (cart, Some(raw)),
                None => (Cart::new(session_id.clone()), None),
            };

            let now = Utc::now();
            mutation.apply(&mut cart, now)?;
            let bytes = self.encode(&key, &mut cart, now)?;

            let written = ctx
                .run(self.kv.compare_and_set(
                    &key,
                    expected.as_deref(),
                    bytes,
                    self.config.ttl(),
                ))
                .await??;
            if written {
                return Ok(cart);
            }
            debug!(session_id = %session_id, attempt, "Record changed since read, re-applying");
        }

        Err(CartError::Conflict { attempts })
    }

    /// Read and decode the record, keeping the raw bytes for compare-and-set.
    async fn load(
        &self,
        ctx: &CallContext,
        session_id: &SessionId,
    ) -> Result<Option<(Cart, Vec<u8>)>, CartError> {
        let key = self.key(session_id);
        let Some(raw) = ctx.run(self.kv.get(&key)).await?? else {
            return Ok(None);
        };

        let corrupt = |reason: String| {
            error!(key = %key, reason = %reason, "Corrupt cart record");
            CartError::CorruptRecord {
                key: key.clone(),
                reason,
            }
        };

        let mut cart =
            serde_json::from_slice::<Cart>(&raw).map_err(|e| corrupt(e.to_string()))?;
        if let Some(reason) = cart.invariant_violation() {
            return Err(corrupt(reason));
        }
        if cart.total != cart.computed_total() {
            warn!(key = %key, stored = %cart.total, "Stale cart total, recomputing");
            cart.recalculate_total();
        }
        Ok(Some((cart, raw)))
    }

    fn encode(&self, key: &str, cart: &mut Cart, now: DateTime<Utc>) -> Result<Vec<u8>, CartError> {
        cart.prepare_for_save(now);
        serde_json::to_vec(cart).map_err(|e| {
            error!(key, error = %e, "Failed to serialize cart");
            CartError::Serialization(e.to_string())
        })
    }

    async fn write(&self, ctx: &CallContext, key: &str, bytes: Vec<u8>) -> Result<(), CartError> {
        ctx.run(self.kv.set(key, bytes, self.config.ttl()))
            .await?
            .map_err(CartError::from)
    }
}

impl std::fmt::Debug for SessionCartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCartStore")
            .field("config", &self.config)
            .field("logger", &self.logger)
            .finish_non_exhaustive()
    }
}
