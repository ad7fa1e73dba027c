//! Order webhook client.
//!
//! Forwards a completed checkout as JSON to the configured order endpoint.
//! The endpoint is write-only from our side: anything in the response body
//! beyond the status code is ignored.

use std::time::Duration;

use thiserror::Error;
use tracing::instrument;
use zinga_core::OrderPayload;

use crate::config::OrderWebhookConfig;

/// Message shown when an order could not be forwarded.
pub const ORDER_FAILED_MESSAGE: &str =
    "There was an issue processing your order. Please check your details and try again.";

/// How to treat a delivery whose outcome is unknown.
///
/// A request that timed out, or whose response body could not be read,
/// may still have reached the endpoint. `Optimistic` counts those as
/// delivered; the risk is a lost order that the customer believes was placed.
/// `Strict` treats them as failures; the risk is a duplicate order if the
/// customer retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryPolicy {
    #[default]
    Optimistic,
    Strict,
}

impl std::str::FromStr for DeliveryPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "optimistic" => Ok(Self::Optimistic),
            "strict" => Ok(Self::Strict),
            other => Err(format!("expected 'optimistic' or 'strict', got '{other}'")),
        }
    }
}

/// Errors that can occur when forwarding an order.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The endpoint could not be reached.
    #[error("Connection failed: {0}")]
    Connect(#[source] reqwest::Error),

    /// The request was sent but its outcome is unknown (strict policy only).
    #[error("Delivery outcome unknown: {0}")]
    Ambiguous(#[source] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("Order endpoint returned {status}")]
    Rejected { status: u16 },

    /// Any other HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// How an order was delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The endpoint acknowledged the order with a 2xx response.
    Confirmed,
    /// The outcome was unknown and the optimistic policy assumed success.
    Assumed,
}

/// Client for the order webhook.
#[derive(Clone)]
pub struct OrderForwarder {
    client: reqwest::Client,
    url: String,
    policy: DeliveryPolicy,
}

impl OrderForwarder {
    /// Create a new order forwarder.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &OrderWebhookConfig, timeout: Duration) -> Result<Self, OrderError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
            policy: config.policy,
        })
    }

    /// The configured delivery policy.
    #[must_use]
    pub const fn policy(&self) -> DeliveryPolicy {
        self.policy
    }

    /// POST the order payload to the webhook.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Connect` if the endpoint is unreachable and
    /// `OrderError::Rejected` on a non-2xx status, whatever the policy.
    /// Under the strict policy, timeouts and unreadable responses return
    /// `OrderError::Ambiguous`.
    #[instrument(skip(self, payload), fields(lines = payload.products.len(), amount = %payload.amount))]
    pub async fn forward(&self, payload: &OrderPayload) -> Result<DeliveryOutcome, OrderError> {
        let response = match self.client.post(&self.url).json(payload).send().await {
            Ok(response) => response,
            Err(e) if e.is_connect() => return Err(OrderError::Connect(e)),
            Err(e) if e.is_timeout() => return self.ambiguous(e),
            Err(e) => return Err(OrderError::Http(e)),
        };

        let status = response.status();
        if !status.is_success() {
            tracing::error!(status = %status, "Order endpoint rejected order");
            return Err(OrderError::Rejected {
                status: status.as_u16(),
            });
        }

        match response.bytes().await {
            Ok(_) => {
                tracing::info!("Order forwarded");
                Ok(DeliveryOutcome::Confirmed)
            }
            Err(e) => self.ambiguous(e),
        }
    }

    fn ambiguous(&self, error: reqwest::Error) -> Result<DeliveryOutcome, OrderError> {
        match self.policy {
            DeliveryPolicy::Optimistic => {
                tracing::warn!(
                    error = %error,
                    "Order delivery outcome unknown, assuming success"
                );
                Ok(DeliveryOutcome::Assumed)
            }
            DeliveryPolicy::Strict => Err(OrderError::Ambiguous(error)),
        }
    }
}
