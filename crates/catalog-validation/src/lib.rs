//! Catalog validation protocol.
//!
//! A stateless request/response contract through which a checkout flow asks
//! the catalog authority whether cart lines exist, what they cost and
//! whether enough stock is on hand:
//!
//! - [`CatalogService::validate_product`]: one product and quantity
//! - [`CatalogService::get_product_price`]: price lookup only
//! - [`CatalogService::validate_cart_items`]: ordered bulk check with an
//!   aggregate total, failing fast on the first fatal error
//!
//! A missing product is a normal negative result, never an error.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use catalog_validation::{CatalogClient, CatalogServer, ClientConfig, InMemoryCatalog};
//!
//! let catalog = Arc::new(InMemoryCatalog::load("products.toml")?);
//! let server = Arc::new(CatalogServer::new(catalog, telemetry.logger("catalog")));
//! let client = CatalogClient::new(server, ClientConfig::default(), telemetry.logger("catalog_client"));
//!
//! let result = client.validate_product(&CallContext::background(), "1", 5).await?;
//! if !result.in_stock {
//!     println!("{}", result.error_message.unwrap_or_default());
//! }
//! ```

mod client;
mod error;
mod lookup;
mod messages;
mod product;
mod server;
mod service;

pub use client::{CatalogClient, ClientConfig, DEFAULT_TIMEOUT_MS};
pub use error::{CatalogError, LoadError, LookupError, StatusCode};
pub use lookup::{InMemoryCatalog, ProductLookup};
pub use messages::{
    CartItemRequest, CartValidationRequest, CartValidationResponse, ProductPriceRequest,
    ProductPriceResponse, ProductValidationRequest, ProductValidationResponse,
};
pub use product::Product;
pub use server::CatalogServer;
pub use service::CatalogService;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        CatalogClient, CatalogError, CatalogServer, CatalogService, InMemoryCatalog, Product,
        ProductLookup,
    };
}
