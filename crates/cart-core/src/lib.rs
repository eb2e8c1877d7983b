//! Session cart domain types and logic.
//!
//! This crate provides the pieces shared by the cart store, the catalog
//! validation protocol and any HTTP adapter sitting in front of them:
//!
//! - **Cart**: cart record, line items and the mutation engine (add,
//!   set-quantity, remove, clear) that keeps totals consistent
//! - **Ids**: `SessionId` and `ProductId` newtypes, session resolution
//! - **Money**: decimal price helpers and currencies
//! - **Context**: per-call deadlines and cancellation
//! - **Api**: request payloads and the cart snapshot returned to clients
//!
//! # Example
//!
//! ```rust,ignore
//! use cart_core::prelude::*;
//!
//! let mut cart = Cart::new(SessionId::new("s1"));
//! cart.add_item(ProductId::new(42), 2, Decimal::new(1000, 2), "Mug")?;
//! cart.add_item(ProductId::new(42), 3, Decimal::new(1000, 2), "Mug")?;
//!
//! assert_eq!(cart.item_count(), 1);
//! assert_eq!(cart.total, Decimal::new(5000, 2));
//! ```

pub mod api;
pub mod cart;
pub mod context;
pub mod error;
pub mod ids;
pub mod money;

pub use cart::{Cart, CartItem, CartMutation, MAX_QUANTITY};
pub use context::{cancel_pair, CallContext, CancelHandle, CancelSignal, Interrupted};
pub use error::CartError;
pub use ids::{ProductId, SessionId};
pub use money::{Currency, Decimal};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::api::{AddItemRequest, CartSnapshot, UpdateItemRequest};
    pub use crate::cart::{Cart, CartItem, CartMutation};
    pub use crate::context::{CallContext, Interrupted};
    pub use crate::error::CartError;
    pub use crate::ids::{ProductId, SessionId};
    pub use crate::money::{Currency, Decimal};
}
