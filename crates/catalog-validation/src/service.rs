//! The catalog validation contract.

use async_trait::async_trait;
use cart_core::CallContext;

use crate::{
    CartValidationRequest, CartValidationResponse, CatalogError, ProductPriceRequest,
    ProductPriceResponse, ProductValidationRequest, ProductValidationResponse,
};

/// Request/response contract served by the catalog authority.
///
/// Every call is bound by the caller's [`CallContext`]; nothing is retried.
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Check that a product exists and stock covers `quantity`.
    ///
    /// Empty ids and non-positive quantities fail with
    /// [`CatalogError::InvalidArgument`] before any lookup. An unknown
    /// product is a successful response with `valid == false`.
    async fn validate_product(
        &self,
        ctx: &CallContext,
        request: ProductValidationRequest,
    ) -> Result<ProductValidationResponse, CatalogError>;

    /// Look up a product's current price.
    async fn get_product_price(
        &self,
        ctx: &CallContext,
        request: ProductPriceRequest,
    ) -> Result<ProductPriceResponse, CatalogError>;

    /// Validate every line in order.
    ///
    /// The first fatal error fails the whole call with no partial results.
    async fn validate_cart_items(
        &self,
        ctx: &CallContext,
        request: CartValidationRequest,
    ) -> Result<CartValidationResponse, CatalogError>;
}
