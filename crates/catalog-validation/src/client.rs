//! Caller side of the protocol.

use std::sync::Arc;
use std::time::Duration;

use cart_core::{CallContext, Cart};
use cart_observability::Logger;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    CartItemRequest, CartValidationRequest, CartValidationResponse, CatalogError, CatalogService,
    ProductPriceRequest, ProductPriceResponse, ProductValidationRequest,
    ProductValidationResponse,
};

/// Default per-call deadline.
pub const DEFAULT_TIMEOUT_MS: u64 = 2_000;

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Upper bound on each call, in milliseconds. A tighter deadline already
    /// on the caller's context wins.
    pub timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Calls a [`CatalogService`] under a per-call deadline.
///
/// Failures are returned as-is; retry policy belongs to the caller.
pub struct CatalogClient {
    service: Arc<dyn CatalogService>,
    config: ClientConfig,
    logger: Logger,
}

impl CatalogClient {
    pub fn new(service: Arc<dyn CatalogService>, config: ClientConfig, logger: Logger) -> Self {
        Self {
            service,
            config,
            logger,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Check one product against a requested quantity.
    pub async fn validate_product(
        &self,
        ctx: &CallContext,
        product_id: impl Into<String>,
        quantity: i32,
    ) -> Result<ProductValidationResponse, CatalogError> {
        let request = ProductValidationRequest::new(product_id, quantity);
        self.logger
            .scope("validate_product", async {
                let ctx = ctx.tighten(self.config.timeout());
                let result = ctx
                    .run(self.service.validate_product(&ctx, request))
                    .await
                    .map_err(CatalogError::from)
                    .and_then(|r| r);
                log_outcome(&result);
                result
            })
            .await
    }

    /// Look up a product's current price.
    pub async fn get_product_price(
        &self,
        ctx: &CallContext,
        product_id: impl Into<String>,
    ) -> Result<ProductPriceResponse, CatalogError> {
        let request = ProductPriceRequest::new(product_id);
        self.logger
            .scope("get_product_price", async {
                let ctx = ctx.tighten(self.config.timeout());
                let result = ctx
                    .run(self.service.get_product_price(&ctx, request))
                    .await
                    .map_err(CatalogError::from)
                    .and_then(|r| r);
                log_outcome(&result);
                result
            })
            .await
    }

    /// Validate a list of lines in order.
    pub async fn validate_cart_items(
        &self,
        ctx: &CallContext,
        items: Vec<CartItemRequest>,
    ) -> Result<CartValidationResponse, CatalogError> {
        self.validate_request(ctx, CartValidationRequest { items })
            .await
    }

    /// Validate every line of a session cart before checkout.
    pub async fn validate_cart(
        &self,
        ctx: &CallContext,
        cart: &Cart,
    ) -> Result<CartValidationResponse, CatalogError> {
        let request = CartValidationRequest::try_from(cart).inspect_err(|e| {
            warn!(error = %e, "Cart cannot be expressed as a validation request");
        })?;
        self.validate_request(ctx, request).await
    }

    async fn validate_request(
        &self,
        ctx: &CallContext,
        request: CartValidationRequest,
    ) -> Result<CartValidationResponse, CatalogError> {
        self.logger
            .scope("validate_cart_items", async {
                let ctx = ctx.tighten(self.config.timeout());
                let result = ctx
                    .run(self.service.validate_cart_items(&ctx, request))
                    .await
                    .map_err(CatalogError::from)
                    .and_then(|r| r);
                if let Ok(response) = &result {
                    debug!(
                        all_valid = response.all_valid,
                        total_price = %response.total_price,
                        "Cart validated"
                    );
                }
                log_outcome(&result);
                result
            })
            .await
    }
}

fn log_outcome<T>(result: &Result<T, CatalogError>) {
    if let Err(e) = result {
        warn!(code = e.code().as_str(), error = %e, "Catalog call failed");
    }
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
