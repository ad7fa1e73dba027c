//! Session-stored models for the storefront.

pub mod session;

pub use session::{CheckoutState, Flash, keys as session_keys};
