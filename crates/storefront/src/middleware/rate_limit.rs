//! Rate limiting middleware using governor and `tower_governor`.
//!
//! Only the two routes that call paid or side-effecting upstream APIs are
//! limited:
//! - `checkout_rate_limiter`: `POST /checkout` (~6/min per IP)
//! - `recipe_rate_limiter`: `POST /recipes` (~10/min per IP)

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

// =============================================================================
// Client IP Key Extractor
// =============================================================================

/// Key extractor that reads the client IP from proxy headers:
/// `CF-Connecting-IP`, then the first `X-Forwarded-For` entry, then
/// `X-Real-IP`, then the peer address when the server records it.
#[derive(Clone, Copy)]
pub struct CloudflareIpKeyExtractor;

fn header_ip<T>(req: &Request<T>, name: &str) -> Option<IpAddr> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
}

impl tower_governor::key_extractor::KeyExtractor for CloudflareIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        header_ip(req, "cf-connecting-ip")
            .or_else(|| header_ip(req, "x-forwarded-for"))
            .or_else(|| header_ip(req, "x-real-ip"))
            .or_else(|| {
                req.extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|info| info.0.ip())
            })
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

// =============================================================================
// Rate Limiter Configuration
// =============================================================================

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<CloudflareIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Build a limiter replenishing one token every `seconds`, with `burst`.
///
/// # Panics
///
/// Panics if `seconds` or `burst` is zero. Callers in this module pass
/// positive constants only.
fn limiter(seconds: u64, burst: u32) -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(CloudflareIpKeyExtractor)
        .per_second(seconds)
        .burst_size(burst)
        .finish()
        .expect("rate limiter config with positive period and burst is valid");
    GovernorLayer::new(Arc::new(config))
}

/// Limiter for order submission: one token every 10 seconds, burst of 3.
#[must_use]
pub fn checkout_rate_limiter() -> RateLimiterLayer {
    limiter(10, 3)
}

/// Limiter for recipe generation: one token every 6 seconds, burst of 5.
#[must_use]
pub fn recipe_rate_limiter() -> RateLimiterLayer {
    limiter(6, 5)
}
