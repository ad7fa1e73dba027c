//! Raw Stripe REST API response types.
//!
//! Only the fields the storefront reads are modeled; everything else in the
//! response is ignored by serde.

use std::collections::HashMap;

use serde::Deserialize;

/// A paginated list envelope (`{"object": "list", "data": [...]}`).
#[derive(Debug, Deserialize)]
pub struct List<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
}

/// A Stripe product.
#[derive(Debug, Deserialize)]
pub struct StripeProduct {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub default_price: Option<DefaultPrice>,
}

/// `default_price` is a bare id unless expanded.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum DefaultPrice {
    Expanded(StripePrice),
    Id(String),
}

/// A Stripe price object.
#[derive(Debug, Deserialize)]
pub struct StripePrice {
    pub id: String,
    /// Amount in the smallest currency unit.
    #[serde(default)]
    pub unit_amount: Option<i64>,
}

/// A Stripe payment method, as returned by `GET /v1/payment_methods/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentMethod {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Error envelope (`{"error": {"message": ...}}`).
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub message: Option<String>,
}
