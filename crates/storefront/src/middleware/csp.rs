//! Content Security Policy with a per-request nonce.
//!
//! Every request gets a fresh nonce; pages put it on their inline scripts
//! and `security_headers_middleware` puts it in the policy.

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use rand::RngCore;

/// Image CDNs product photos are served from.
const IMAGE_SOURCES: &str = "https://res.cloudinary.com https://images.unsplash.com https://files.stripe.com";

/// Script hosts: Stripe.js and HTMX.
const SCRIPT_SOURCES: &str = "https://js.stripe.com https://unpkg.com";

/// A CSP nonce value for inline scripts (128-bit, base64-encoded).
#[derive(Clone, Debug)]
pub struct CspNonce(pub String);

impl CspNonce {
    /// Generate a new random nonce.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::rng().fill_bytes(&mut bytes);
        Self(STANDARD.encode(bytes))
    }

    /// Get the nonce value for use in templates.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }

    /// The full policy for a response carrying this nonce.
    ///
    /// Stripe Elements renders card fields inside frames from
    /// `js.stripe.com` and talks to `api.stripe.com` directly.
    #[must_use]
    pub fn policy(&self) -> String {
        format!(
            "default-src 'none'; \
             script-src 'self' 'nonce-{nonce}' {SCRIPT_SOURCES}; \
             style-src 'self'; \
             font-src 'self'; \
             img-src 'self' data: {IMAGE_SOURCES}; \
             connect-src 'self' https://api.stripe.com; \
             frame-src https://js.stripe.com https://hooks.stripe.com; \
             object-src 'none'; \
             base-uri 'self'; \
             form-action 'self'; \
             frame-ancestors 'none'; \
             upgrade-insecure-requests",
            nonce = self.0
        )
    }
}

/// Middleware that generates a CSP nonce and stores it in request extensions.
///
/// Must run before `security_headers_middleware` so the nonce is available
/// when building the CSP header.
pub async fn csp_nonce_middleware(mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(CspNonce::generate());
    next.run(request).await
}

impl<S> FromRequestParts<S> for CspNonce
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Self>().cloned().unwrap_or_else(|| {
            tracing::warn!(
                "CSP nonce not found in request extensions - middleware may be misconfigured"
            );
            Self(String::new())
        }))
    }
}
