//! Cart record and mutation engine.
//!
//! All mutations are pure: they rewrite the in-memory [`Cart`] and recompute
//! its total, and never touch a store. Persistence lives in the cart store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::CartSnapshot;
use crate::error::CartError;
use crate::ids::{ProductId, SessionId};
use crate::money::{self, Decimal};

/// Largest quantity a line may hold; matches the catalog protocol's `i32`
/// quantity field.
pub const MAX_QUANTITY: u32 = i32::MAX as u32;

/// A session's shopping cart.
///
/// Invariants held by every mutation:
/// - no two items share a `product_id`
/// - every item has `0 < quantity <= MAX_QUANTITY`
/// - `total == Σ(unit_price × quantity)`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cart {
    /// Owning session.
    pub session_id: SessionId,
    /// Line items in insertion order.
    pub items: Vec<CartItem>,
    /// Sum of all line totals.
    pub total: Decimal,
    /// Record version, bumped on every save.
    #[serde(default)]
    pub version: u64,
    /// Set on the first save of this session's cart.
    pub created_at: Option<DateTime<Utc>>,
    /// Refreshed on every save.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Cart {
    /// Create an empty, never-saved cart for a session.
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            items: Vec::new(),
            total: Decimal::ZERO,
            version: 0,
            created_at: None,
            updated_at: None,
        }
    }

    /// Add `quantity` units of a product.
    ///
    /// An existing line only has its quantity incremented; the price and name
    /// it was first added with are kept. A zero quantity is a no-op. An add
    /// that would push the line past [`MAX_QUANTITY`] is rejected and leaves
    /// the cart unchanged.
    pub fn add_item(
        &mut self,
        product_id: ProductId,
        quantity: u32,
        unit_price: Decimal,
        name: impl Into<String>,
    ) -> Result<(), CartError> {
        self.add_item_at(product_id, quantity, unit_price, name, Utc::now())
    }

    /// [`Cart::add_item`] with an explicit `added_at` for new lines.
    pub fn add_item_at(
        &mut self,
        product_id: ProductId,
        quantity: u32,
        unit_price: Decimal,
        name: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), CartError> {
        if quantity == 0 {
            return Ok(());
        }

        if let Some(existing) = self.items.iter_mut().find(|i| i.product_id == product_id) {
            existing.quantity = existing
                .quantity
                .checked_add(quantity)
                .filter(|q| *q <= MAX_QUANTITY)
                .ok_or_else(|| {
                    CartError::Validation(format!(
                        "quantity of product {} would exceed {}",
                        product_id, MAX_QUANTITY
                    ))
                })?;
        } else {
            check_quantity(quantity)?;
            self.items.push(CartItem {
                product_id,
                quantity,
                unit_price,
                name: name.into(),
                added_at: now,
            });
        }
        self.recalculate_total();
        Ok(())
    }

    /// Overwrite the quantity of a line; zero removes it.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return self.remove_item(product_id).map(|_| ());
        }

        let item = self
            .items
            .iter_mut()
            .find(|i| i.product_id == product_id)
            .ok_or(CartError::ItemNotFound(product_id))?;
        check_quantity(quantity)?;
        item.quantity = quantity;
        self.recalculate_total();
        Ok(())
    }

    /// Remove a line, returning it.
    pub fn remove_item(&mut self, product_id: ProductId) -> Result<CartItem, CartError> {
        let index = self
            .items
            .iter()
            .position(|i| i.product_id == product_id)
            .ok_or(CartError::ItemNotFound(product_id))?;
        let removed = self.items.remove(index);
        self.recalculate_total();
        Ok(removed)
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.items.clear();
        self.recalculate_total();
    }

    /// Recompute `total` from the current lines.
    pub fn recalculate_total(&mut self) -> Decimal {
        self.total = self.computed_total();
        self.total
    }

    /// Σ(unit_price × quantity) over the current lines.
    pub fn computed_total(&self) -> Decimal {
        money::sum_lines(self.items.iter().map(|i| (i.unit_price, i.quantity)))
    }

    /// Stamp the cart for a write: refresh `updated_at`, set `created_at`
    /// if it was never set, bump the version and recompute the total.
    pub fn prepare_for_save(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now);
        if self.created_at.is_none() {
            self.created_at = Some(now);
        }
        self.version = self.version.wrapping_add(1);
        self.recalculate_total();
    }

    /// Find the first broken structural invariant: a zero or oversized
    /// quantity, or a product listed twice. A stale `total` is not reported;
    /// [`Cart::recalculate_total`] repairs it.
    pub fn invariant_violation(&self) -> Option<String> {
        let mut seen = std::collections::HashSet::new();
        for item in &self.items {
            if item.quantity == 0 || item.quantity > MAX_QUANTITY {
                return Some(format!(
                    "product {} has quantity {}",
                    item.product_id, item.quantity
                ));
            }
            if !seen.insert(item.product_id) {
                return Some(format!("product {} appears more than once", item.product_id));
            }
        }
        None
    }

    /// Number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Sum of quantities over all lines.
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    /// Check if cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get a line by product.
    pub fn get_item(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }

    /// Client-facing view of this cart.
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot::from(self)
    }
}

/// A line item in the cart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartItem {
    /// Product being purchased.
    pub product_id: ProductId,
    /// Always greater than zero.
    pub quantity: u32,
    /// Price captured when the line was first added.
    pub unit_price: Decimal,
    /// Product name (denormalized for display).
    pub name: String,
    /// When the line was first added.
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// `unit_price × quantity`.
    pub fn line_total(&self) -> Decimal {
        money::line_total(self.unit_price, self.quantity)
    }
}

fn check_quantity(quantity: u32) -> Result<(), CartError> {
    if quantity > MAX_QUANTITY {
        return Err(CartError::Validation(format!(
            "quantity {} exceeds {}",
            quantity, MAX_QUANTITY
        )));
    }
    Ok(())
}

/// A single cart mutation, replayable against any cart state.
///
/// The store applies mutations inside its read-modify-write cycle; keeping
/// them as values lets an optimistic save re-run one against fresh state.
#[derive(Debug, Clone, PartialEq)]
pub enum CartMutation {
    /// Add units of a product.
    Add {
        product_id: ProductId,
        quantity: u32,
        unit_price: Decimal,
        name: String,
    },
    /// Overwrite a line's quantity (zero removes).
    SetQuantity { product_id: ProductId, quantity: u32 },
    /// Remove a line.
    Remove { product_id: ProductId },
    /// Empty the cart.
    Clear,
}

impl CartMutation {
    /// Apply the mutation to `cart`.
    pub fn apply(&self, cart: &mut Cart, now: DateTime<Utc>) -> Result<(), CartError> {
        match self {
            CartMutation::Add {
                product_id,
                quantity,
                unit_price,
                name,
            } => cart.add_item_at(*product_id, *quantity, *unit_price, name.clone(), now),
            CartMutation::SetQuantity {
                product_id,
                quantity,
            } => cart.set_quantity(*product_id, *quantity),
            CartMutation::Remove { product_id } => cart.remove_item(*product_id).map(|_| ()),
            CartMutation::Clear => {
                cart.clear();
                Ok(())
            }
        }
    }

    /// Short action name for logging.
    pub fn action(&self) -> &'static str {
        match self {
            CartMutation::Add { .. } => "add_item",
            CartMutation::SetQuantity { .. } => "update_quantity",
            CartMutation::Remove { .. } => "remove_item",
            CartMutation::Clear => "clear",
        }
    }

    /// Product the mutation targets, if any.
    pub fn product_id(&self) -> Option<ProductId> {
        match self {
            CartMutation::Add { product_id, .. }
            | CartMutation::SetQuantity { product_id, .. }
            | CartMutation::Remove { product_id } => Some(*product_id),
            CartMutation::Clear => None,
        }
    }
}
