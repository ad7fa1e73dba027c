//! Integration tests for `OrderForwarder`.
//!
//! Covers each delivery outcome: confirmed, rejected, unreachable, and the
//! ambiguous timeout under both delivery policies.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zinga_core::{
    Cart, ContactDetails, Email, OrderPayload, PaymentMethodId, ShippingAddress,
};
use zinga_storefront::catalog::mock_catalog;
use zinga_storefront::config::OrderWebhookConfig;
use zinga_storefront::services::orders::{
    DeliveryOutcome, DeliveryPolicy, OrderError, OrderForwarder,
};

fn forwarder(url: String, policy: DeliveryPolicy, timeout: Duration) -> OrderForwarder {
    OrderForwarder::new(&OrderWebhookConfig { url, policy }, timeout)
        .expect("failed to build test OrderForwarder")
}

fn payload() -> OrderPayload {
    let catalog = mock_catalog();
    let mut cart = Cart::default();
    cart.add_to_cart(&catalog[0]);
    cart.add_to_cart(&catalog[0]);
    cart.add_to_cart(&catalog[1]);

    OrderPayload::new(
        ContactDetails {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: Email::parse("ada@example.com").expect("valid email"),
            phone: "555-0100".to_string(),
        },
        ShippingAddress {
            address: "1 Spice Lane".to_string(),
            city: "Ginger Bay".to_string(),
            zip: "12345".to_string(),
        },
        &cart,
        PaymentMethodId::new("pm_card_visa"),
    )
}

#[tokio::test]
async fn test_forward_posts_camel_case_payload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/orders"))
        .and(body_partial_json(json!({
            "firstName": "Ada",
            "email": "ada@example.com",
            "zip": "12345",
            "amount": 13.0,
            "paymentMethodId": "pm_card_visa",
            "products": [
                {"id": "prod_Tc88iHqWbl52O7", "quantity": 2, "price": 3.0},
                {"id": "prod_Tc8B9WROVdT2cv", "quantity": 1, "price": 7.0}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = forwarder(
        format!("{}/orders", server.uri()),
        DeliveryPolicy::Strict,
        Duration::from_secs(5),
    )
    .forward(&payload())
    .await
    .expect("delivery should succeed");

    assert_eq!(outcome, DeliveryOutcome::Confirmed);
}

#[tokio::test]
async fn test_forward_non_success_status_is_rejected_under_any_policy() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = forwarder(
        format!("{}/orders", server.uri()),
        DeliveryPolicy::Optimistic,
        Duration::from_secs(5),
    )
    .forward(&payload())
    .await
    .expect_err("500 should be an error");

    assert!(matches!(err, OrderError::Rejected { status: 500 }), "got {err:?}");
}

#[tokio::test]
async fn test_forward_timeout_is_assumed_delivered_when_optimistic() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let outcome = forwarder(
        format!("{}/orders", server.uri()),
        DeliveryPolicy::Optimistic,
        Duration::from_millis(200),
    )
    .forward(&payload())
    .await
    .expect("optimistic policy should assume success");

    assert_eq!(outcome, DeliveryOutcome::Assumed);
}

#[tokio::test]
async fn test_forward_timeout_fails_when_strict() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let err = forwarder(
        format!("{}/orders", server.uri()),
        DeliveryPolicy::Strict,
        Duration::from_millis(200),
    )
    .forward(&payload())
    .await
    .expect_err("strict policy should fail");

    assert!(matches!(err, OrderError::Ambiguous(_)), "got {err:?}");
}

#[tokio::test]
async fn test_forward_unreachable_endpoint_fails_under_any_policy() {
    // Bind then drop a listener to get a port nothing is listening on.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .expect("ephemeral port")
        .port();

    let err = forwarder(
        format!("http://127.0.0.1:{port}/orders"),
        DeliveryPolicy::Optimistic,
        Duration::from_secs(2),
    )
    .forward(&payload())
    .await
    .expect_err("connection refused should be an error");

    assert!(matches!(err, OrderError::Connect(_)), "got {err:?}");
}
