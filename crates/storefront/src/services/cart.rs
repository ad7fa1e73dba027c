//! Session-backed cart store.
//!
//! [`CartStore`] is a per-request handle: load it from the session, call the
//! cart operations, and every mutation is written straight back. Handlers
//! that mutate the cart add an `HX-Trigger: cart-updated` header so the
//! navbar badge and open cart fragments re-render.

use tower_sessions::Session;
use zinga_core::{Cart, Product, ProductId};

use crate::models::session_keys;

/// HTMX event fired after every cart mutation.
pub const CART_UPDATED_EVENT: &str = "cart-updated";

/// Errors that can occur reading or writing the session cart.
pub type CartStoreError = tower_sessions::session::Error;

/// Cart bound to the current session.
pub struct CartStore {
    session: Session,
    cart: Cart,
}

impl CartStore {
    /// Load the cart from the session (empty when none is stored).
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails or the stored cart
    /// cannot be decoded.
    pub async fn load(session: Session) -> Result<Self, CartStoreError> {
        let cart = session
            .get::<Cart>(session_keys::CART)
            .await?
            .unwrap_or_default();
        Ok(Self { session, cart })
    }

    /// Current cart contents.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Consume the store, returning the cart.
    #[must_use]
    pub fn into_cart(self) -> Cart {
        self.cart
    }

    /// Add one unit of a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be written.
    pub async fn add_to_cart(&mut self, product: &Product) -> Result<(), CartStoreError> {
        self.cart.add_to_cart(product);
        self.persist().await
    }

    /// Remove a product's line.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be written.
    pub async fn remove_from_cart(&mut self, product_id: &ProductId) -> Result<(), CartStoreError> {
        self.cart.remove_from_cart(product_id);
        self.persist().await
    }

    /// Set a product's quantity (zero or less removes it).
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be written.
    pub async fn update_quantity(
        &mut self,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<(), CartStoreError> {
        self.cart.update_quantity(product_id, quantity);
        self.persist().await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be written.
    pub async fn clear_cart(&mut self) -> Result<(), CartStoreError> {
        self.cart.clear_cart();
        self.persist().await
    }

    async fn persist(&self) -> Result<(), CartStoreError> {
        self.session.insert(session_keys::CART, &self.cart).await
    }
}
