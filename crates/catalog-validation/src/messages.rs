//! Protocol request and response messages.

use cart_core::{Cart, Currency, Decimal};
use serde::{Deserialize, Serialize};

use crate::CatalogError;

/// Check one product against a requested quantity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductValidationRequest {
    pub product_id: String,
    pub quantity: i32,
}

impl ProductValidationRequest {
    pub fn new(product_id: impl Into<String>, quantity: i32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Outcome of a single product check.
///
/// `valid` means the product exists; `in_stock` means it exists and stock
/// covers the requested quantity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ProductValidationResponse {
    pub valid: bool,
    pub in_stock: bool,
    pub available_quantity: i64,
    pub product_name: String,
    pub unit_price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ProductValidationResponse {
    /// Negative result for an unknown product.
    pub fn not_found() -> Self {
        Self {
            error_message: Some("Product not found".to_string()),
            ..Default::default()
        }
    }

    /// Whether this line can be ordered as requested.
    pub fn is_orderable(&self) -> bool {
        self.valid && self.in_stock
    }
}

/// Price lookup for one product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductPriceRequest {
    pub product_id: String,
}

impl ProductPriceRequest {
    pub fn new(product_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
        }
    }
}

/// Outcome of a price lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ProductPriceResponse {
    pub found: bool,
    pub price: Decimal,
    /// Set when `found`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// One line of a bulk check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartItemRequest {
    pub product_id: String,
    pub quantity: i32,
}

impl CartItemRequest {
    pub fn new(product_id: impl Into<String>, quantity: i32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

impl From<&CartItemRequest> for ProductValidationRequest {
    fn from(item: &CartItemRequest) -> Self {
        Self::new(item.product_id.clone(), item.quantity)
    }
}

/// Check a list of lines in order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CartValidationRequest {
    pub items: Vec<CartItemRequest>,
}

impl CartValidationRequest {
    pub fn new(items: impl IntoIterator<Item = CartItemRequest>) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
    }
}

impl TryFrom<&Cart> for CartValidationRequest {
    type Error = CatalogError;

    /// One line per cart item, in cart order. A quantity outside the
    /// protocol's `i32` range is rejected rather than checked short.
    fn try_from(cart: &Cart) -> Result<Self, Self::Error> {
        let items = cart
            .items
            .iter()
            .map(|item| {
                let quantity = i32::try_from(item.quantity).map_err(|_| {
                    CatalogError::InvalidArgument(format!(
                        "quantity {} of product {} is out of range",
                        item.quantity, item.product_id
                    ))
                })?;
                Ok(CartItemRequest::new(item.product_id.to_string(), quantity))
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;
        Ok(Self { items })
    }
}

/// Outcome of a bulk check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CartValidationResponse {
    /// One result per requested line, in request order.
    pub results: Vec<ProductValidationResponse>,
    /// True only if every line is valid and in stock.
    pub all_valid: bool,
    /// Σ(unit_price × quantity) over lines that are valid and in stock.
    pub total_price: Decimal,
    pub currency: Currency,
}

#[cfg(test)]
mod tests {
    use super::*;
    use cart_core::{ProductId, SessionId};

    #[test]
    fn test_not_found_response() {
        let response = ProductValidationResponse::not_found();
        assert!(!response.valid);
        assert!(!response.in_stock);
        assert!(!response.is_orderable());
        assert_eq!(response.error_message.as_deref(), Some("Product not found"));
    }

    #[test]
    fn test_request_from_cart_keeps_order() {
        let mut cart = Cart::new(SessionId::new("s"));
        cart.add_item(ProductId::new(9), 2, Decimal::ONE, "B").unwrap();
        cart.add_item(ProductId::new(3), 1, Decimal::ONE, "A").unwrap();

        let request = CartValidationRequest::try_from(&cart).unwrap();
        assert_eq!(
            request.items,
            vec![CartItemRequest::new("9", 2), CartItemRequest::new("3", 1)]
        );
    }

    #[test]
    fn test_request_from_cart_rejects_out_of_range_quantity() {
        let mut cart = Cart::new(SessionId::new("s"));
        cart.add_item(ProductId::new(1), 1, Decimal::ONE, "A").unwrap();
        cart.items[0].quantity = 3_000_000_000;

        assert!(matches!(
            CartValidationRequest::try_from(&cart),
            Err(CatalogError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_price_response_omits_empty_fields() {
        let json = serde_json::to_value(ProductPriceResponse {
            found: false,
            error_message: Some("Product not found".into()),
            ..Default::default()
        })
        .unwrap();
        assert!(json.get("currency").is_none());
        assert_eq!(json["error_message"], "Product not found");
    }
}
