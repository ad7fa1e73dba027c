//! Request-scoped services and outbound clients.
//!
//! - [`cart`] - Session-backed cart store
//! - [`orders`] - Order webhook forwarding
//! - [`recipes`] - Recipe generation

pub mod cart;
pub mod orders;
pub mod recipes;

pub use cart::{CART_UPDATED_EVENT, CartStore, CartStoreError};
pub use orders::{DeliveryOutcome, DeliveryPolicy, OrderError, OrderForwarder};
pub use recipes::{RecipeClient, RecipeError};
