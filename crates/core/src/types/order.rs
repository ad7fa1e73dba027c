//! Order payload forwarded to the order webhook on checkout.
//!
//! The wire format is flat camelCase JSON: contact and shipping fields at the
//! top level, then the line items, the amount and the payment-method token.
//! No provider credential is ever part of this payload; anything that needs
//! the payment provider's secret key stays on the server.

use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::{PaymentMethodId, ProductId};
use super::price::{self, Price};
use crate::cart::{Cart, CartItem};

/// Customer contact fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: String,
}

impl ContactDetails {
    /// Full name as sent to the payment provider's billing details.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Shipping address fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub address: String,
    pub city: String,
    pub zip: String,
}

/// A single product line in the forwarded order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: ProductId,
    pub name: String,
    pub quantity: u32,
    #[serde(with = "price::as_number")]
    pub price: Price,
}

impl From<&CartItem> for OrderLine {
    fn from(item: &CartItem) -> Self {
        Self {
            id: item.product.id.clone(),
            name: item.product.name.clone(),
            quantity: item.quantity,
            price: item.product.price,
        }
    }
}

/// The full order forwarded on a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    #[serde(flatten)]
    pub contact: ContactDetails,
    #[serde(flatten)]
    pub shipping: ShippingAddress,
    pub products: Vec<OrderLine>,
    #[serde(with = "price::as_number")]
    pub amount: Price,
    pub payment_method_id: PaymentMethodId,
}

impl OrderPayload {
    /// Snapshot the cart into an order payload.
    ///
    /// `amount` is taken from the cart's derived total at the moment of the
    /// snapshot, so it always matches the forwarded lines.
    #[must_use]
    pub fn new(
        contact: ContactDetails,
        shipping: ShippingAddress,
        cart: &Cart,
        payment_method_id: PaymentMethodId,
    ) -> Self {
        Self {
            contact,
            shipping,
            products: cart.items().iter().map(OrderLine::from).collect(),
            amount: cart.total(),
            payment_method_id,
        }
    }
}
