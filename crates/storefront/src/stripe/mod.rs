//! Stripe REST API client.
//!
//! # Architecture
//!
//! - Plain `reqwest` calls against the REST API, authenticated with the
//!   secret key as a bearer token
//! - The secret key never leaves this module; nothing here is rendered or
//!   forwarded
//! - No caching: every catalog request hits Stripe
//!
//! # Calls
//!
//! - `GET /v1/products?active=true&expand[]=data.default_price` for the
//!   catalog (paginated with `starting_after`)
//! - `GET /v1/payment_methods/{id}` to verify a token created by Stripe.js
//!
//! # Example
//!
//! ```rust,ignore
//! use zinga_storefront::stripe::StripeClient;
//!
//! let client = StripeClient::new(&stripe_config, Duration::from_secs(15))?;
//! let products = client.list_products().await?;
//! ```

mod conversions;
pub mod types;

pub use conversions::{DEFAULT_CATEGORY, DEFAULT_INGREDIENT};
pub use types::PaymentMethod;

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;
use zinga_core::{PaymentMethodId, Product};

use crate::config::StripeConfig;
use conversions::convert_product;
use types::{ErrorBody, List, StripeProduct};

/// Page size for product listing (Stripe's maximum).
const PAGE_SIZE: &str = "100";

/// Upper bound on pages fetched for one listing.
const MAX_PAGES: usize = 20;

/// Errors that can occur when calling the Stripe API.
#[derive(Debug, Error)]
pub enum StripeError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Stripe returned an error response.
    #[error("Stripe API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Rate limited by Stripe.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configured API base is not a valid URL.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl StripeError {
    /// Message safe to show a customer on the checkout form.
    ///
    /// Client-side errors (declined card, bad token) carry Stripe's own
    /// message; everything else gets a generic retry hint.
    #[must_use]
    pub fn customer_message(&self) -> String {
        match self {
            Self::Api { status, message } if (400..500).contains(status) && *status != 401 => {
                message.clone()
            }
            _ => "We couldn't verify your payment details. Please try again.".to_string(),
        }
    }
}

/// Client for the Stripe REST API.
#[derive(Clone)]
pub struct StripeClient {
    inner: Arc<StripeClientInner>,
}

struct StripeClientInner {
    client: reqwest::Client,
    api_base: String,
    secret_key: SecretString,
}

impl StripeClient {
    /// Create a new Stripe client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &StripeConfig, timeout: Duration) -> Result<Self, StripeError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            inner: Arc::new(StripeClientInner {
                client,
                api_base: config.api_base.trim_end_matches('/').to_string(),
                secret_key: config.secret_key.clone(),
            }),
        })
    }

    fn url(&self, path: &str) -> Result<Url, StripeError> {
        Ok(Url::parse(&format!("{}{path}", self.inner.api_base))?)
    }

    /// Execute an authenticated GET and decode the JSON body.
    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, StripeError> {
        let response = self
            .inner
            .client
            .get(url)
            .bearer_auth(self.inner.secret_key.expose_secret())
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(StripeError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&response_text)
                .ok()
                .and_then(|body| body.error.message)
                .unwrap_or_else(|| format!("HTTP {status}"));
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Stripe API returned non-success status"
            );
            return Err(StripeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %response_text.chars().take(500).collect::<String>(),
                "Failed to parse Stripe response"
            );
            StripeError::Parse(e)
        })
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// List every active product with its default price expanded.
    ///
    /// # Errors
    ///
    /// Returns an error if any page request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, StripeError> {
        let mut products = Vec::new();
        let mut starting_after: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let mut url = self.url("/v1/products")?;
            {
                let mut query = url.query_pairs_mut();
                query
                    .append_pair("active", "true")
                    .append_pair("limit", PAGE_SIZE)
                    .append_pair("expand[]", "data.default_price");
                if let Some(cursor) = &starting_after {
                    query.append_pair("starting_after", cursor);
                }
            }

            let page: List<StripeProduct> = self.get(url).await?;
            starting_after = page.data.last().map(|p| p.id.clone());
            let has_more = page.has_more && starting_after.is_some();

            products.extend(page.data.into_iter().map(convert_product));

            if !has_more {
                break;
            }
        }

        debug!(count = products.len(), "Fetched products from Stripe");
        Ok(products)
    }

    // =========================================================================
    // Payment Methods
    // =========================================================================

    /// Look up a payment method token created by Stripe.js.
    ///
    /// A successful lookup proves the token exists on this account.
    ///
    /// # Errors
    ///
    /// Returns `StripeError::Api` with Stripe's message for unknown or
    /// invalid tokens.
    #[instrument(skip(self), fields(payment_method_id = %id))]
    pub async fn retrieve_payment_method(
        &self,
        id: &PaymentMethodId,
    ) -> Result<PaymentMethod, StripeError> {
        let mut url = self.url("/v1/payment_methods")?;
        url.path_segments_mut()
            .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .push(id.as_str());

        let method: PaymentMethod = self.get(url).await?;
        debug!(kind = %method.kind, "Verified payment method");
        Ok(method)
    }
}
