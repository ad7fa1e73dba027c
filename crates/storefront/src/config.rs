//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Server
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_BASE_URL` - Public URL (default: http://localhost:3000)
//! - `STOREFRONT_STATIC_DIR` - Static asset directory (default: crates/storefront/static)
//! - `HTTP_TIMEOUT_SECS` - Timeout for outbound requests (default: 15)
//!
//! ## Catalog & payments
//! - `PRODUCT_SOURCE` - `mock` or `stripe` (default: mock)
//! - `STRIPE_SECRET_KEY` - Server-side Stripe key (required for `stripe` source and checkout)
//! - `STRIPE_PUBLISHABLE_KEY` - Browser key for Stripe.js (required for checkout)
//! - `STRIPE_API_BASE` - Stripe API base URL (default: https://api.stripe.com)
//!
//! ## Orders
//! - `ORDER_WEBHOOK_URL` - Order forwarding endpoint (checkout disabled when unset)
//! - `ORDER_DELIVERY_POLICY` - `optimistic` or `strict` (default: optimistic)
//!
//! ## Recipes
//! - `GEMINI_API_KEY` - Generative AI key (recipes disabled when unset)
//! - `GEMINI_MODEL` - Model name (default: gemini-2.5-flash)
//! - `GEMINI_API_BASE` - API base URL (default: https://generativelanguage.googleapis.com)
//!
//! ## Error tracking
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

use crate::services::orders::DeliveryPolicy;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";
const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Where the product catalog comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatalogSource {
    /// Built-in product list.
    #[default]
    Mock,
    /// Live Stripe product listing.
    Stripe,
}

impl std::str::FromStr for CatalogSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(Self::Mock),
            "stripe" => Ok(Self::Stripe),
            other => Err(format!("expected 'mock' or 'stripe', got '{other}'")),
        }
    }
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    /// Timeout applied to every outbound HTTP call
    pub http_timeout: Duration,
    /// Product catalog source
    pub catalog_source: CatalogSource,
    /// Stripe configuration (catalog listing and payment tokens)
    pub stripe: Option<StripeConfig>,
    /// Order webhook configuration
    pub orders: Option<OrderWebhookConfig>,
    /// Recipe generator configuration
    pub gemini: Option<GeminiConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Stripe API configuration.
///
/// Implements `Debug` manually to redact the secret key.
#[derive(Clone)]
pub struct StripeConfig {
    /// Server-side secret key. Never rendered or forwarded.
    pub secret_key: SecretString,
    /// Publishable key for Stripe.js (safe to expose in browser)
    pub publishable_key: Option<String>,
    /// API base URL
    pub api_base: String,
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &"[REDACTED]")
            .field("publishable_key", &self.publishable_key)
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Order webhook configuration.
#[derive(Debug, Clone)]
pub struct OrderWebhookConfig {
    /// Endpoint that receives the order payload
    pub url: String,
    /// How to treat ambiguous delivery outcomes
    pub policy: DeliveryPolicy,
}

/// Generative AI (Gemini) configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct GeminiConfig {
    /// API key
    pub api_key: SecretString,
    /// Model name
    pub model: String,
    /// API base URL
    pub api_base: String,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if variables are invalid, a required secret is
    /// missing, or a secret fails validation (placeholder detection, entropy).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`StorefrontConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let host = env.parse_or("STOREFRONT_HOST", "127.0.0.1")?;
        let port = env.parse_or("STOREFRONT_PORT", "3000")?;
        let base_url = env.or_default("STOREFRONT_BASE_URL", "http://localhost:3000");
        let static_dir = PathBuf::from(
            env.or_default("STOREFRONT_STATIC_DIR", "crates/storefront/static"),
        );
        let http_timeout = Duration::from_secs(env.parse_or("HTTP_TIMEOUT_SECS", "15")?);
        let catalog_source: CatalogSource = env.parse_or("PRODUCT_SOURCE", "mock")?;

        let stripe = StripeConfig::from_env(&env)?;
        if catalog_source == CatalogSource::Stripe && stripe.is_none() {
            return Err(ConfigError::MissingEnvVar("STRIPE_SECRET_KEY".to_string()));
        }

        let orders = OrderWebhookConfig::from_env(&env)?;
        let gemini = GeminiConfig::from_env(&env)?;

        Ok(Self {
            host,
            port,
            base_url,
            static_dir,
            http_timeout,
            catalog_source,
            stripe,
            orders,
            gemini,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: env
                .optional("SENTRY_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.0),
            sentry_traces_sample_rate: env
                .optional("SENTRY_TRACES_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.1),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether checkout has everything it needs (tokens and a webhook).
    #[must_use]
    pub fn checkout_enabled(&self) -> bool {
        self.orders.is_some()
            && self
                .stripe
                .as_ref()
                .is_some_and(|s| s.publishable_key.is_some())
    }

    /// Configuration for local development and tests: mock catalog, no
    /// outbound services.
    #[must_use]
    pub fn local() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            static_dir: PathBuf::from("crates/storefront/static"),
            http_timeout: Duration::from_secs(15),
            catalog_source: CatalogSource::Mock,
            stripe: None,
            orders: None,
            gemini: None,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
        }
    }
}

impl StripeConfig {
    fn from_env(env: &Env<'_>) -> Result<Option<Self>, ConfigError> {
        let Some(secret_key) = env.validated_secret("STRIPE_SECRET_KEY")? else {
            return Ok(None);
        };

        Ok(Some(Self {
            secret_key,
            publishable_key: env.optional("STRIPE_PUBLISHABLE_KEY"),
            api_base: env.or_default("STRIPE_API_BASE", DEFAULT_STRIPE_API_BASE),
        }))
    }
}

impl OrderWebhookConfig {
    fn from_env(env: &Env<'_>) -> Result<Option<Self>, ConfigError> {
        let Some(url) = env.optional("ORDER_WEBHOOK_URL") else {
            return Ok(None);
        };
        url::Url::parse(&url).map_err(|e| {
            ConfigError::InvalidEnvVar("ORDER_WEBHOOK_URL".to_string(), e.to_string())
        })?;

        Ok(Some(Self {
            url,
            policy: env.parse_or("ORDER_DELIVERY_POLICY", "optimistic")?,
        }))
    }
}

impl GeminiConfig {
    fn from_env(env: &Env<'_>) -> Result<Option<Self>, ConfigError> {
        let Some(api_key) = env.validated_secret("GEMINI_API_KEY")? else {
            return Ok(None);
        };

        Ok(Some(Self {
            api_key,
            model: env.or_default("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
            api_base: env.or_default("GEMINI_API_BASE", DEFAULT_GEMINI_API_BASE),
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable lookup with typed accessors.
struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    /// Get an optional variable. Empty values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parse_or<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.or_default(key, default)
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }

    /// Load and validate an optional secret.
    fn validated_secret(&self, key: &str) -> Result<Option<SecretString>, ConfigError> {
        self.optional(key)
            .map(|value| {
                validate_secret_strength(&value, key)?;
                Ok(SecretString::from(value))
            })
            .transpose()
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}
