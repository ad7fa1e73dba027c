//! Session cart state.
//!
//! A [`Cart`] is an ordered list of [`CartItem`]s keyed by product id. It is
//! mutated only through four operations (`add_to_cart`, `remove_from_cart`,
//! `update_quantity`, `clear_cart`); the total is always derived from the
//! current items and never stored.
//!
//! # Invariants
//!
//! - At most one item per product id
//! - Every item has `quantity >= 1`
//! - Items keep insertion order

use serde::{Deserialize, Serialize};

use crate::types::{Price, Product, ProductId};

/// A product plus the requested quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    /// Price × quantity for this line.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price * self.quantity
    }
}

/// The shopping cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Whether the cart has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of price × quantity over all items.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Sum of quantities (the navbar badge count).
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Look up an item by product id.
    #[must_use]
    pub fn get(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.product.id == product_id)
    }

    /// Add one unit of `product`.
    ///
    /// Increments the existing line if the product is already in the cart,
    /// otherwise appends a new line with quantity 1.
    pub fn add_to_cart(&mut self, product: &Product) {
        if let Some(item) = self.item_mut(&product.id) {
            item.quantity = item.quantity.saturating_add(1);
        } else {
            self.items.push(CartItem {
                product: product.clone(),
                quantity: 1,
            });
        }
    }

    /// Remove the line for `product_id`. Absent ids are a no-op.
    pub fn remove_from_cart(&mut self, product_id: &ProductId) {
        self.items.retain(|item| &item.product.id != product_id);
    }

    /// Set the quantity for `product_id`.
    ///
    /// A quantity of zero or less removes the line. Unknown ids are a no-op.
    pub fn update_quantity(&mut self, product_id: &ProductId, quantity: i64) {
        if quantity <= 0 {
            self.remove_from_cart(product_id);
            return;
        }

        if let Some(item) = self.item_mut(product_id) {
            item.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        }
    }

    /// Empty the cart.
    pub fn clear_cart(&mut self) {
        self.items.clear();
    }

    fn item_mut(&mut self, product_id: &ProductId) -> Option<&mut CartItem> {
        self.items
            .iter_mut()
            .find(|item| &item.product.id == product_id)
    }
}
