//! Core types for Zinga.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod order;
pub mod price;
pub mod product;
pub mod recipe;

pub use email::{Email, EmailError};
pub use id::*;
pub use order::{ContactDetails, OrderLine, OrderPayload, ShippingAddress};
pub use price::Price;
pub use product::Product;
pub use recipe::{Dietary, Recipe, RecipeRequest};
