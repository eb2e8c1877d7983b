//! Request payloads and response views for the cart HTTP contract.
//!
//! Route wiring lives outside this crate; these types pin down what the
//! adapter parses and returns:
//!
//! | Route | Payload | Success |
//! |---|---|---|
//! | `POST /cart/items` | [`AddItemRequest`] | 200 + [`CartSnapshot`] |
//! | `GET /cart` | - | 200 + [`CartSnapshot`] |
//! | `PUT /cart/items/{product_id}` | [`UpdateItemRequest`] | 200 + [`CartSnapshot`] |
//! | `DELETE /cart/items/{product_id}` | - | 200 + [`CartSnapshot`] |
//! | `DELETE /cart` | - | 200 |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cart::{Cart, CartItem, MAX_QUANTITY};
use crate::error::CartError;
use crate::ids::{ProductId, SessionId};
use crate::money::Decimal;

/// Body of `POST /cart/items`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddItemRequest {
    pub product_id: i64,
    pub quantity: i64,
}

impl AddItemRequest {
    /// Check the payload, returning the typed product and quantity.
    pub fn validate(&self) -> Result<(ProductId, u32), CartError> {
        if self.product_id <= 0 {
            return Err(CartError::Validation(format!(
                "product_id must be positive, got {}",
                self.product_id
            )));
        }
        if self.quantity <= 0 {
            return Err(CartError::Validation(format!(
                "quantity must be positive, got {}",
                self.quantity
            )));
        }
        Ok((ProductId::new(self.product_id), to_quantity(self.quantity)?))
    }
}

/// Body of `PUT /cart/items/{product_id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateItemRequest {
    pub quantity: i64,
}

impl UpdateItemRequest {
    /// Check the payload; zero is allowed and means "remove".
    pub fn validate(&self) -> Result<u32, CartError> {
        if self.quantity < 0 {
            return Err(CartError::Validation(format!(
                "quantity must not be negative, got {}",
                self.quantity
            )));
        }
        to_quantity(self.quantity)
    }
}

fn to_quantity(quantity: i64) -> Result<u32, CartError> {
    u32::try_from(quantity)
        .ok()
        .filter(|q| *q <= MAX_QUANTITY)
        .ok_or_else(|| {
            CartError::Validation(format!(
                "quantity {} exceeds {}",
                quantity, MAX_QUANTITY
            ))
        })
}

/// Parse a `{product_id}` path segment.
pub fn parse_product_id(segment: &str) -> Result<ProductId, CartError> {
    let id: ProductId = segment
        .parse()
        .map_err(|_| CartError::Validation(format!("invalid product id: {:?}", segment)))?;
    if id.get() <= 0 {
        return Err(CartError::Validation(format!(
            "product id must be positive, got {}",
            id
        )));
    }
    Ok(id)
}

/// Parse a JSON request body, mapping failures to [`CartError::Validation`].
pub fn parse_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, CartError> {
    serde_json::from_slice(body).map_err(|e| CartError::Validation(format!("invalid request body: {}", e)))
}

/// Cart as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartSnapshot {
    pub session_id: SessionId,
    pub items: Vec<CartItem>,
    pub total: Decimal,
    /// Number of distinct lines, not the sum of quantities.
    pub item_count: usize,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&Cart> for CartSnapshot {
    fn from(cart: &Cart) -> Self {
        Self {
            session_id: cart.session_id.clone(),
            items: cart.items.clone(),
            total: cart.total,
            item_count: cart.item_count(),
            created_at: cart.created_at,
            updated_at: cart.updated_at,
        }
    }
}

/// Error body returned alongside a non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    pub kind: String,
}

impl From<&CartError> for ErrorBody {
    fn from(err: &CartError) -> Self {
        Self {
            error: err.to_string(),
            kind: err.kind().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_request_validation() {
        let ok = AddItemRequest { product_id: 42, quantity: 2 };
        assert_eq!(ok.validate().unwrap(), (ProductId::new(42), 2));

        let zero_qty = AddItemRequest { product_id: 42, quantity: 0 };
        assert!(matches!(zero_qty.validate(), Err(CartError::Validation(_))));

        let bad_id = AddItemRequest { product_id: 0, quantity: 1 };
        assert!(matches!(bad_id.validate(), Err(CartError::Validation(_))));

        let huge = AddItemRequest { product_id: 1, quantity: i64::MAX };
        assert!(matches!(huge.validate(), Err(CartError::Validation(_))));
    }

    #[test]
    fn test_quantity_capped_at_protocol_range() {
        let max = AddItemRequest { product_id: 1, quantity: i64::from(i32::MAX) };
        assert_eq!(max.validate().unwrap().1, MAX_QUANTITY);

        let over = AddItemRequest { product_id: 1, quantity: i64::from(i32::MAX) + 1 };
        assert!(matches!(over.validate(), Err(CartError::Validation(_))));

        let over = UpdateItemRequest { quantity: 3_000_000_000 };
        assert!(matches!(over.validate(), Err(CartError::Validation(_))));
    }

    #[test]
    fn test_update_request_allows_zero() {
        assert_eq!(UpdateItemRequest { quantity: 0 }.validate().unwrap(), 0);
        assert!(UpdateItemRequest { quantity: -1 }.validate().is_err());
    }

    #[test]
    fn test_parse_body_rejects_malformed() {
        let parsed: AddItemRequest = parse_body(br#"{"product_id": 3, "quantity": 1}"#).unwrap();
        assert_eq!(parsed.product_id, 3);

        let missing = parse_body::<AddItemRequest>(br#"{"product_id": 3}"#);
        assert!(matches!(missing, Err(CartError::Validation(_))));
    }

    #[test]
    fn test_parse_product_id() {
        assert_eq!(parse_product_id("42").unwrap(), ProductId::new(42));
        assert!(parse_product_id("abc").is_err());
        assert!(parse_product_id("-3").is_err());
    }

    #[test]
    fn test_snapshot_counts_distinct_lines() {
        let mut cart = Cart::new(SessionId::new("s1"));
        cart.add_item(ProductId::new(1), 5, Decimal::new(100, 2), "A").unwrap();
        cart.add_item(ProductId::new(2), 1, Decimal::new(100, 2), "B").unwrap();

        let snapshot = cart.snapshot();
        assert_eq!(snapshot.item_count, 2);
        assert_eq!(snapshot.total, Decimal::new(600, 2));
    }

    #[test]
    fn test_error_body() {
        let body = ErrorBody::from(&CartError::ItemNotFound(ProductId::new(9)));
        assert_eq!(body.kind, "item_not_found");
        assert!(body.error.contains('9'));
    }
}
