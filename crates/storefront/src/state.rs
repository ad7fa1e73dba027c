//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::catalog::ProductSource;
use crate::config::{CatalogSource, StorefrontConfig};
use crate::services::orders::{OrderError, OrderForwarder};
use crate::services::recipes::{RecipeClient, RecipeError};
use crate::stripe::{StripeClient, StripeError};

/// Error building outbound clients from configuration.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("stripe client: {0}")]
    Stripe(#[from] StripeError),
    #[error("order forwarder: {0}")]
    Order(#[from] OrderError),
    #[error("recipe client: {0}")]
    Recipe(#[from] RecipeError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. Optional services are `None`
/// when their configuration is absent, and the matching pages say so.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    products: ProductSource,
    stripe: Option<StripeClient>,
    orders: Option<OrderForwarder>,
    recipes: Option<RecipeClient>,
}

impl AppState {
    /// Create a new application state, building every configured client.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let stripe = config
            .stripe
            .as_ref()
            .map(|c| StripeClient::new(c, config.http_timeout))
            .transpose()?;

        let products = match (config.catalog_source, &stripe) {
            (CatalogSource::Stripe, Some(client)) => ProductSource::Stripe(client.clone()),
            _ => ProductSource::mock(),
        };

        let orders = config
            .orders
            .as_ref()
            .map(|c| OrderForwarder::new(c, config.http_timeout))
            .transpose()?;

        let recipes = config
            .gemini
            .as_ref()
            .map(|c| RecipeClient::new(c, config.http_timeout))
            .transpose()?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                products,
                stripe,
                orders,
                recipes,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get the product source.
    #[must_use]
    pub fn products(&self) -> &ProductSource {
        &self.inner.products
    }

    /// Get the Stripe client, if configured.
    #[must_use]
    pub fn stripe(&self) -> Option<&StripeClient> {
        self.inner.stripe.as_ref()
    }

    /// Get the order forwarder, if configured.
    #[must_use]
    pub fn orders(&self) -> Option<&OrderForwarder> {
        self.inner.orders.as_ref()
    }

    /// Get the recipe client, if configured.
    #[must_use]
    pub fn recipes(&self) -> Option<&RecipeClient> {
        self.inner.recipes.as_ref()
    }

    /// Publishable key and clients needed to take payment, when checkout is
    /// fully configured.
    #[must_use]
    pub fn checkout(&self) -> Option<CheckoutServices<'_>> {
        let stripe = self.stripe()?;
        let orders = self.orders()?;
        let publishable_key = self
            .config()
            .stripe
            .as_ref()?
            .publishable_key
            .as_deref()?;

        Some(CheckoutServices {
            stripe,
            orders,
            publishable_key,
            stale_after: self.config().http_timeout * 2 + SUBMISSION_SLACK,
        })
    }
}

/// Session work on top of the two outbound calls a submission makes.
const SUBMISSION_SLACK: Duration = Duration::from_secs(1);

/// Everything checkout needs, borrowed from [`AppState`].
#[derive(Clone, Copy)]
pub struct CheckoutServices<'a> {
    pub stripe: &'a StripeClient,
    pub orders: &'a OrderForwarder,
    pub publishable_key: &'a str,
    /// After this long a stored `Submitting` phase is treated as abandoned.
    pub stale_after: Duration,
}
