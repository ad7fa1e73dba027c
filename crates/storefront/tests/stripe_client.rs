//! Integration tests for `StripeClient`.
//!
//! Uses `wiremock` to stand up a local Stripe API for each test so no real
//! network traffic is made.

use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zinga_core::{PaymentMethodId, Price};
use zinga_storefront::catalog::{CatalogListing, ProductSource};
use zinga_storefront::config::StripeConfig;
use zinga_storefront::stripe::{StripeClient, StripeError};

const SECRET_KEY: &str = "sk_test_4eC39HqLyjWDarjtT1zdp7dc";

fn test_client(server: &MockServer) -> StripeClient {
    let config = StripeConfig {
        secret_key: SecretString::from(SECRET_KEY.to_string()),
        publishable_key: Some("pk_test_TYooMQauvdEDq54NiTphI7jx".to_string()),
        api_base: server.uri(),
    };
    StripeClient::new(&config, Duration::from_secs(5)).expect("failed to build test StripeClient")
}

fn product_json(id: &str, cents: i64) -> serde_json::Value {
    json!({
        "id": id,
        "object": "product",
        "name": format!("Zinga Ginger Ground {id}"),
        "description": "Sun-dried ginger.",
        "images": [format!("https://files.stripe.com/{id}.png")],
        "metadata": {"category": "Bulk"},
        "default_price": {"id": format!("price_{id}"), "unit_amount": cents, "currency": "usd"}
    })
}

// ---------------------------------------------------------------------------
// Product listing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_list_products_converts_expanded_prices() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/products"))
        .and(query_param("active", "true"))
        .and(query_param("expand[]", "data.default_price"))
        .and(header("authorization", format!("Bearer {SECRET_KEY}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [product_json("prod_a", 300), product_json("prod_b", 700)],
            "has_more": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let products = test_client(&server)
        .list_products()
        .await
        .expect("listing should succeed");

    assert_eq!(products.len(), 2);
    assert_eq!(products[0].id.as_str(), "prod_a");
    assert_eq!(products[0].price, Price::from_cents(300));
    assert_eq!(products[0].price_reference_id.as_str(), "price_prod_a");
    assert_eq!(products[1].category, "Bulk");
    assert_eq!(products[1].image, "https://files.stripe.com/prod_b.png");
}

#[tokio::test]
async fn test_list_products_follows_pagination_cursor() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/products"))
        .and(query_param_is_missing("starting_after"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [product_json("prod_a", 300), product_json("prod_b", 700)],
            "has_more": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/products"))
        .and(query_param("starting_after", "prod_b"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [product_json("prod_c", 1400)],
            "has_more": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let products = test_client(&server)
        .list_products()
        .await
        .expect("listing should succeed");

    let ids: Vec<&str> = products.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["prod_a", "prod_b", "prod_c"]);
}

#[tokio::test]
async fn test_list_products_surfaces_api_error_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/products"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Invalid API Key provided", "type": "invalid_request_error"}
        })))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .list_products()
        .await
        .expect_err("401 should be an error");

    match &err {
        StripeError::Api { status, message } => {
            assert_eq!(*status, 401);
            assert_eq!(message, "Invalid API Key provided");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    assert!(!err.customer_message().contains("API Key"));
}

#[tokio::test]
async fn test_list_products_rate_limit_reads_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/products"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .list_products()
        .await
        .expect_err("429 should be an error");

    assert!(matches!(err, StripeError::RateLimited(7)), "got {err:?}");
}

#[tokio::test]
async fn test_list_products_rejects_malformed_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/products"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .list_products()
        .await
        .expect_err("garbage should be an error");

    assert!(matches!(err, StripeError::Parse(_)), "got {err:?}");
}

// ---------------------------------------------------------------------------
// Payment methods
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_retrieve_payment_method_returns_verified_method() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/payment_methods/pm_card_visa"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "pm_card_visa",
            "object": "payment_method",
            "type": "card",
            "card": {"brand": "visa", "last4": "4242", "exp_month": 12, "exp_year": 2030}
        })))
        .mount(&server)
        .await;

    let method = test_client(&server)
        .retrieve_payment_method(&PaymentMethodId::new("pm_card_visa"))
        .await
        .expect("lookup should succeed");

    assert_eq!(method.id, "pm_card_visa");
    assert_eq!(method.kind, "card");
}

#[tokio::test]
async fn test_retrieve_unknown_payment_method_passes_message_to_customer() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/payment_methods/pm_missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {
                "message": "No such PaymentMethod: 'pm_missing'",
                "type": "invalid_request_error",
                "code": "resource_missing"
            }
        })))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .retrieve_payment_method(&PaymentMethodId::new("pm_missing"))
        .await
        .expect_err("404 should be an error");

    assert_eq!(err.customer_message(), "No such PaymentMethod: 'pm_missing'");
}

// ---------------------------------------------------------------------------
// Product source
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_stripe_source_reports_fetch_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/products"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let listing = ProductSource::Stripe(test_client(&server)).fetch_products().await;

    assert!(listing.is_failed(), "expected FetchFailed, got {listing:?}");
    assert!(listing.products().is_empty());
}

#[tokio::test]
async fn test_stripe_source_empty_listing_is_not_a_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/products"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": [], "has_more": false})),
        )
        .mount(&server)
        .await;

    let listing = ProductSource::Stripe(test_client(&server)).fetch_products().await;

    assert_eq!(listing, CatalogListing::Empty);
}
