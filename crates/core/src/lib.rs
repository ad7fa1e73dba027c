//! Zinga Core - Shared domain types for the Zinga storefront.
//!
//! This crate provides the storefront's domain model:
//! - Catalog types (`Product`, type-safe IDs, `Price`)
//! - The session cart (`Cart`, `CartItem`) and its four mutations
//! - The checkout state machine and the order payload forwarded on submit
//! - Recipe generator request/response types
//! - The image URL normalizer used by every product view
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no session handling. The `storefront` crate owns all of that.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers, products, orders and recipes
//! - [`cart`] - Cart state and derived totals
//! - [`checkout`] - Checkout phases and form validation
//! - [`image`] - CDN-aware image URL rewriting

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod image;
pub mod types;

pub use cart::{Cart, CartItem};
pub use checkout::{CheckoutError, CheckoutForm, CheckoutPhase, FieldError};
pub use image::optimized_image_url;
pub use types::*;
