//! Catalog authority side of the protocol.

use std::sync::Arc;

use async_trait::async_trait;
use cart_core::{CallContext, Currency, Decimal};
use cart_observability::Logger;
use tracing::{error, info, warn};

use crate::{
    CartValidationRequest, CartValidationResponse, CatalogError, CatalogService, ProductLookup,
    ProductPriceRequest, ProductPriceResponse, ProductValidationRequest,
    ProductValidationResponse,
};

/// Answers protocol calls from a [`ProductLookup`].
pub struct CatalogServer {
    lookup: Arc<dyn ProductLookup>,
    currency: Currency,
    logger: Logger,
}

impl CatalogServer {
    /// Create a server quoting prices in USD.
    pub fn new(lookup: Arc<dyn ProductLookup>, logger: Logger) -> Self {
        Self {
            lookup,
            currency: Currency::default(),
            logger,
        }
    }

    /// Quote prices in `currency`.
    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    async fn check_product(
        &self,
        ctx: &CallContext,
        request: &ProductValidationRequest,
    ) -> Result<ProductValidationResponse, CatalogError> {
        info!(
            product_id = %request.product_id,
            quantity = request.quantity,
            "Product validation request received"
        );

        if request.product_id.is_empty() {
            return Err(CatalogError::InvalidArgument(
                "product ID is required".to_string(),
            ));
        }
        if request.quantity <= 0 {
            return Err(CatalogError::InvalidArgument(
                "quantity must be positive".to_string(),
            ));
        }

        let product = ctx
            .run(self.lookup.find(&request.product_id))
            .await?
            .map_err(|e| {
                error!(product_id = %request.product_id, error = %e, "Failed to query product");
                CatalogError::Internal("Failed to retrieve product".to_string())
            })?;

        let Some(product) = product else {
            warn!(product_id = %request.product_id, "Product not found");
            return Ok(ProductValidationResponse::not_found());
        };

        let requested = i64::from(request.quantity);
        let in_stock = product.can_fulfill(requested);
        let error_message = (!in_stock).then(|| {
            format!(
                "Insufficient stock. Available: {}, Requested: {}",
                product.stock_quantity, requested
            )
        });

        info!(
            product_id = %request.product_id,
            product_name = %product.name,
            in_stock,
            available_quantity = product.stock_quantity,
            requested_quantity = requested,
            "Product validation completed"
        );

        Ok(ProductValidationResponse {
            valid: true,
            in_stock,
            available_quantity: product.stock_quantity,
            product_name: product.name,
            unit_price: product.price,
            error_message,
        })
    }
}

#[async_trait]
impl CatalogService for CatalogServer {
    async fn validate_product(
        &self,
        ctx: &CallContext,
        request: ProductValidationRequest,
    ) -> Result<ProductValidationResponse, CatalogError> {
        self.logger
            .scope("validate_product", self.check_product(ctx, &request))
            .await
    }

    async fn get_product_price(
        &self,
        ctx: &CallContext,
        request: ProductPriceRequest,
    ) -> Result<ProductPriceResponse, CatalogError> {
        self.logger
            .scope("get_product_price", async {
                if request.product_id.is_empty() {
                    return Err(CatalogError::InvalidArgument(
                        "product ID is required".to_string(),
                    ));
                }

                let product = ctx
                    .run(self.lookup.find(&request.product_id))
                    .await?
                    .map_err(|e| {
                        error!(product_id = %request.product_id, error = %e, "Failed to query product price");
                        CatalogError::Internal("Failed to retrieve product price".to_string())
                    })?;

                Ok(match product {
                    Some(product) => ProductPriceResponse {
                        found: true,
                        price: product.price,
                        currency: Some(self.currency),
                        error_message: None,
                    },
                    None => ProductPriceResponse {
                        found: false,
                        error_message: Some("Product not found".to_string()),
                        ..Default::default()
                    },
                })
            })
            .await
    }

    async fn validate_cart_items(
        &self,
        ctx: &CallContext,
        request: CartValidationRequest,
    ) -> Result<CartValidationResponse, CatalogError> {
        self.logger
            .scope("validate_cart_items", async {
                info!(items_count = request.items.len(), "Cart validation request received");

                let mut response = CartValidationResponse {
                    results: Vec::with_capacity(request.items.len()),
                    all_valid: true,
                    total_price: Decimal::ZERO,
                    currency: self.currency,
                };

                for (index, item) in request.items.iter().enumerate() {
                    let result = self
                        .check_product(ctx, &item.into())
                        .await
                        .inspect_err(|e| {
                            error!(index, product_id = %item.product_id, error = %e, "Failed to validate cart item");
                        })?;

                    if result.is_orderable() {
                        let line = result.unit_price.saturating_mul(Decimal::from(item.quantity));
                        response.total_price = response.total_price.saturating_add(line);
                    } else {
                        response.all_valid = false;
                    }
                    response.results.push(result);
                }

                info!(
                    items_count = request.items.len(),
                    all_valid = response.all_valid,
                    total_price = %response.total_price,
                    "Cart validation completed"
                );
                Ok::<_, CatalogError>(response)
            })
            .await
    }
}

impl std::fmt::Debug for CatalogServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogServer")
            .field("currency", &self.currency)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InMemoryCatalog, Product};

    fn server() -> CatalogServer {
        let catalog = InMemoryCatalog::with_products([
            Product::new(1, "Mug", Decimal::new(1000, 2)).with_stock(3)
        ]);
        CatalogServer::new(Arc::new(catalog), Logger::disabled())
    }

    #[tokio::test]
    async fn test_quantity_validated_before_lookup() {
        let err = server()
            .validate_product(&CallContext::background(), ProductValidationRequest::new("1", 0))
            .await
            .unwrap_err();
        assert_eq!(err, CatalogError::InvalidArgument("quantity must be positive".into()));
    }

    #[tokio::test]
    async fn test_in_stock_has_no_message() {
        let response = server()
            .validate_product(&CallContext::background(), ProductValidationRequest::new("1", 3))
            .await
            .unwrap();
        assert!(response.valid && response.in_stock);
        assert_eq!(response.product_name, "Mug");
        assert_eq!(response.unit_price, Decimal::new(1000, 2));
        assert!(response.error_message.is_none());
    }

    #[tokio::test]
    async fn test_price_currency() {
        let server = server().with_currency(Currency::EUR);
        let response = server
            .get_product_price(&CallContext::background(), ProductPriceRequest::new("1"))
            .await
            .unwrap();
        assert!(response.found);
        assert_eq!(response.currency, Some(Currency::EUR));
    }
}
