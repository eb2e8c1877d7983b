//! Catalog product record.

use cart_core::{Decimal, ProductId};
use serde::{Deserialize, Serialize};

/// A product as known to the catalog authority.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    /// Unique product identifier.
    pub id: ProductId,
    /// Product name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Current unit price.
    pub price: Decimal,
    /// Units on hand.
    #[serde(default)]
    pub stock_quantity: i64,
}

impl Product {
    /// Create a product with no stock.
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            price,
            stock_quantity: 0,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_stock(mut self, stock_quantity: i64) -> Self {
        self.stock_quantity = stock_quantity;
        self
    }

    /// Check if `quantity` units can be supplied from stock.
    pub fn can_fulfill(&self, quantity: i64) -> bool {
        self.stock_quantity >= quantity
    }

    /// Check if out of stock.
    pub fn is_out_of_stock(&self) -> bool {
        self.stock_quantity <= 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_fulfill() {
        let product = Product::new(1, "Mug", Decimal::new(1000, 2)).with_stock(3);
        assert!(product.can_fulfill(3));
        assert!(!product.can_fulfill(4));
        assert!(!product.is_out_of_stock());
    }

    #[test]
    fn test_deserialize_defaults() {
        let product: Product =
            serde_json::from_str(r#"{"id": 7, "name": "Cap", "price": "12.50"}"#).unwrap();
        assert_eq!(product.id, ProductId::new(7));
        assert_eq!(product.price, Decimal::new(1250, 2));
        assert_eq!(product.stock_quantity, 0);
        assert!(product.is_out_of_stock());
        assert!(product.description.is_empty());
    }
}
