//! Security headers middleware for XSS, clickjacking, and isolation protection.
//!
//! Locked down by default. The only loosening is what Stripe Elements and
//! the two product image CDNs need; see [`CspNonce::policy`].

use axum::{
    extract::Request,
    http::{
        HeaderName, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

use super::csp::CspNonce;

/// Add security headers to all responses.
///
/// Headers applied:
/// - `X-Frame-Options: DENY`
/// - `X-Content-Type-Options: nosniff`
/// - `Referrer-Policy: strict-origin-when-cross-origin` (share links need the origin)
/// - `Content-Security-Policy` built from the request's nonce
/// - `Permissions-Policy` denying sensitive features except payment for Stripe
/// - `Cache-Control: no-store` on pages (carts are per-session)
/// - `Cross-Origin-Opener-Policy: same-origin-allow-popups` (share popups)
/// - `X-DNS-Prefetch-Control: off`
///
/// No `Cross-Origin-Embedder-Policy`: the Stripe card frame and CDN images
/// do not send CORP headers.
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let nonce = request
        .extensions()
        .get::<CspNonce>()
        .cloned()
        .unwrap_or_else(CspNonce::generate);
    let is_static = request.uri().path().starts_with("/static/");

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(
        REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    if let Ok(policy) = HeaderValue::from_str(&nonce.policy()) {
        headers.insert(CONTENT_SECURITY_POLICY, policy);
    }

    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(
            "accelerometer=(), \
             camera=(), \
             display-capture=(), \
             geolocation=(), \
             gyroscope=(), \
             magnetometer=(), \
             microphone=(), \
             midi=(), \
             payment=(self \"https://js.stripe.com\"), \
             usb=(), \
             xr-spatial-tracking=()",
        ),
    );

    if !is_static {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store, max-age=0"));
    }

    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin-allow-popups"),
    );

    headers.insert(
        HeaderName::from_static("x-dns-prefetch-control"),
        HeaderValue::from_static("off"),
    );

    response
}
