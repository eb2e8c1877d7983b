//! Product lookup seam between the protocol server and its data source.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use cart_core::ProductId;
use serde::Deserialize;

use crate::{LoadError, LookupError, Product};

/// Source of product records.
///
/// `Ok(None)` means the product does not exist. `Err` means the source
/// itself failed and the answer is unknown.
#[async_trait]
pub trait ProductLookup: Send + Sync {
    async fn find(&self, product_id: &str) -> Result<Option<Product>, LookupError>;
}

#[derive(Deserialize)]
struct ProductFile {
    #[serde(default)]
    products: Vec<Product>,
}

/// Product catalog held in memory.
///
/// Ids that do not parse as integers are unknown products. A failure can be
/// injected to exercise the backend-error path.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    products: RwLock<HashMap<ProductId, Product>>,
    failure: Mutex<Option<String>>,
}

impl InMemoryCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog holding `products`.
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let products = products.into_iter().map(|p| (p.id, p)).collect();
        Self {
            products: RwLock::new(products),
            failure: Mutex::new(None),
        }
    }

    /// Parse a `{"products": [...]}` document.
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        let file: ProductFile = serde_json::from_str(json)?;
        Ok(Self::with_products(file.products))
    }

    /// Parse a document of `[[products]]` tables.
    pub fn from_toml(source: &str) -> Result<Self, LoadError> {
        let file: ProductFile = toml::from_str(source)?;
        Ok(Self::with_products(file.products))
    }

    /// Load a `.json` or `.toml` product file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            Some("toml") => Self::from_toml(&content),
            other => Err(LoadError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }

    /// Insert or replace a product.
    pub fn insert(&self, product: Product) {
        if let Ok(mut products) = self.products.write() {
            products.insert(product.id, product);
        }
    }

    /// Overwrite the stock of a product. Returns false if it is unknown.
    pub fn set_stock(&self, id: ProductId, stock_quantity: i64) -> bool {
        self.products
            .write()
            .ok()
            .and_then(|mut products| {
                products
                    .get_mut(&id)
                    .map(|p| p.stock_quantity = stock_quantity)
            })
            .is_some()
    }

    /// Make every lookup fail with `reason`, or clear the failure with `None`.
    pub fn fail_with(&self, reason: Option<&str>) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = reason.map(str::to_string);
        }
    }

    /// All products, ordered by id.
    pub fn products(&self) -> Vec<Product> {
        let mut products: Vec<Product> = self
            .products
            .read()
            .map(|p| p.values().cloned().collect())
            .unwrap_or_default();
        products.sort_by_key(|p| p.id);
        products
    }

    /// Number of products.
    pub fn len(&self) -> usize {
        self.products.read().map(|p| p.len()).unwrap_or(0)
    }

    /// Check if the catalog holds no products.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ProductLookup for InMemoryCatalog {
    async fn find(&self, product_id: &str) -> Result<Option<Product>, LookupError> {
        let failure = self
            .failure
            .lock()
            .map_err(|_| LookupError::new("catalog lock poisoned"))?
            .clone();
        if let Some(reason) = failure {
            return Err(LookupError(reason));
        }

        let Ok(id) = product_id.parse::<ProductId>() else {
            return Ok(None);
        };
        let products = self
            .products
            .read()
            .map_err(|_| LookupError::new("catalog lock poisoned"))?;
        Ok(products.get(&id).cloned())
    }
}
