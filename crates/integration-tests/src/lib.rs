//! Integration tests for the Zinga storefront.
//!
//! Each test spawns the full storefront router on an ephemeral port and
//! drives it with a cookie-keeping `reqwest` client, so session behavior
//! (the cart, flash messages) is exercised exactly as a browser sees it.
//! Outbound services are `wiremock` servers.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p zinga-integration-tests
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use reqwest::{Client, redirect};
use secrecy::SecretString;
use zinga_storefront::config::{OrderWebhookConfig, StorefrontConfig, StripeConfig};
use zinga_storefront::services::orders::DeliveryPolicy;
use zinga_storefront::state::AppState;

/// Publishable key used by checkout tests.
pub const TEST_PUBLISHABLE_KEY: &str = "pk_test_TYooMQauvdEDq54NiTphI7jx";

/// A running storefront plus a client bound to one browser session.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
}

impl TestContext {
    /// Start a storefront with the mock catalog and no outbound services.
    ///
    /// # Panics
    ///
    /// Panics if the server cannot be started.
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    /// Start a storefront with checkout pointed at `stripe_base` (Stripe
    /// API) and `webhook_url` (order endpoint).
    ///
    /// # Panics
    ///
    /// Panics if the server cannot be started.
    pub async fn with_checkout(stripe_base: &str, webhook_url: &str) -> Self {
        Self::with_config(checkout_config(stripe_base, webhook_url)).await
    }

    /// Start a storefront with the given configuration.
    ///
    /// # Panics
    ///
    /// Panics if the server cannot be started.
    pub async fn with_config(config: StorefrontConfig) -> Self {
        let state = AppState::new(config).expect("Failed to build application state");
        let app = zinga_storefront::app(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");

        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("Test server error");
        });

        let client = Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: format!("http://{addr}"),
        }
    }

    /// Absolute URL for `path` on the test server.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Stripe settings pointed at a mock API.
#[must_use]
pub fn stripe_config(stripe_base: &str) -> StripeConfig {
    StripeConfig {
        secret_key: SecretString::from("sk_test_4eC39HqLyjWDarjtT1zdp7dc".to_string()),
        publishable_key: Some(TEST_PUBLISHABLE_KEY.to_string()),
        api_base: stripe_base.to_string(),
    }
}

/// Configuration with checkout enabled and strict delivery.
#[must_use]
pub fn checkout_config(stripe_base: &str, webhook_url: &str) -> StorefrontConfig {
    let mut config = test_config();
    config.stripe = Some(stripe_config(stripe_base));
    config.orders = Some(OrderWebhookConfig {
        url: webhook_url.to_string(),
        policy: DeliveryPolicy::Strict,
    });
    config
}

/// Local configuration with static files resolved from this workspace.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    let mut config = StorefrontConfig::local();
    config.static_dir =
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../storefront/static");
    config
}
