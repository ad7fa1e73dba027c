//! Checkout against mocked Stripe and order webhook endpoints.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zinga_integration_tests::{TEST_PUBLISHABLE_KEY, TestContext, checkout_config};
use zinga_storefront::services::orders::DeliveryPolicy;

const SMALL_JAR: &str = "prod_Tc88iHqWbl52O7";

fn order_form(payment_method_id: &str) -> Vec<(&'static str, String)> {
    vec![
        ("first_name", "Ada".to_string()),
        ("last_name", "Lovelace".to_string()),
        ("email", "ada@example.com".to_string()),
        ("phone", "555-0100".to_string()),
        ("address", "1 Spice Lane".to_string()),
        ("city", "Ginger Bay".to_string()),
        ("zip", "12345".to_string()),
        ("payment_method_id", payment_method_id.to_string()),
    ]
}

async fn add_small_jar(ctx: &TestContext) {
    let resp = ctx
        .client
        .post(ctx.url("/cart/add"))
        .form(&[("product_id", SMALL_JAR)])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

async fn submit(ctx: &TestContext, form: &[(&'static str, String)]) -> reqwest::Response {
    ctx.client
        .post(ctx.url("/checkout"))
        .form(form)
        .send()
        .await
        .unwrap()
}

fn payment_method() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "pm_card_visa",
        "type": "card",
        "card": {"brand": "visa", "last4": "4242"}
    }))
}

async fn mount_payment_method(stripe: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/payment_methods/pm_card_visa"))
        .respond_with(payment_method())
        .mount(stripe)
        .await;
}

async fn mount_accepting_webhook(webhook: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(webhook)
        .await;
}

async fn assert_order_placed(ctx: &TestContext) {
    let home = ctx.client.get(ctx.url("/")).send().await.unwrap().text().await.unwrap();
    assert!(home.contains("Order placed successfully! Welcome to the Zinga family."));

    let cart = ctx.client.get(ctx.url("/cart")).send().await.unwrap().text().await.unwrap();
    assert!(cart.contains("Your cart is empty."));
}

#[tokio::test]
async fn test_checkout_with_empty_cart_redirects_to_cart() {
    let ctx = TestContext::new().await;
    let resp = ctx.client.get(ctx.url("/checkout")).send().await.unwrap();
    assert!(resp.status().is_redirection());
    assert_eq!(resp.headers()["location"], "/cart");
}

#[tokio::test]
async fn test_checkout_page_without_payment_config_disables_submit() {
    let ctx = TestContext::new().await;
    add_small_jar(&ctx).await;

    let body = ctx
        .client
        .get(ctx.url("/checkout"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("Online payment is not available right now."));
    assert!(body.contains("disabled"));
    assert!(!body.contains("js.stripe.com"));
}

#[tokio::test]
async fn test_submit_without_payment_config_is_unavailable() {
    let ctx = TestContext::new().await;
    add_small_jar(&ctx).await;

    let resp = submit(&ctx, &order_form("pm_card_visa")).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_checkout_page_renders_publishable_key_only() {
    let stripe = MockServer::start().await;
    let webhook = MockServer::start().await;
    let ctx = TestContext::with_checkout(&stripe.uri(), &format!("{}/orders", webhook.uri())).await;
    add_small_jar(&ctx).await;

    let body = ctx
        .client
        .get(ctx.url("/checkout"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains(TEST_PUBLISHABLE_KEY));
    assert!(!body.contains("sk_test_"));
    assert!(body.contains("Pay $3.00"));
}

#[tokio::test]
async fn test_successful_order_clears_cart_and_flashes() {
    let stripe = MockServer::start().await;
    let webhook = MockServer::start().await;
    mount_payment_method(&stripe).await;

    Mock::given(method("POST"))
        .and(path("/orders"))
        .and(body_partial_json(json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "city": "Ginger Bay",
            "amount": 3.0,
            "paymentMethodId": "pm_card_visa",
            "products": [{"id": SMALL_JAR, "name": "Zinga Ginger Ground - 200g", "quantity": 1}]
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&webhook)
        .await;

    let ctx = TestContext::with_checkout(&stripe.uri(), &format!("{}/orders", webhook.uri())).await;
    add_small_jar(&ctx).await;

    let resp = submit(&ctx, &order_form("pm_card_visa")).await;
    assert!(resp.status().is_redirection(), "got {}", resp.status());
    assert_eq!(resp.headers()["location"], "/");

    let home = ctx.client.get(ctx.url("/")).send().await.unwrap().text().await.unwrap();
    assert!(home.contains("Order placed successfully! Welcome to the Zinga family."));

    // Flash is shown once.
    let home = ctx.client.get(ctx.url("/")).send().await.unwrap().text().await.unwrap();
    assert!(!home.contains("Order placed successfully!"));

    let cart = ctx.client.get(ctx.url("/cart")).send().await.unwrap().text().await.unwrap();
    assert!(cart.contains("Your cart is empty."));
}

#[tokio::test]
async fn test_invalid_fields_keep_input_and_skip_payment() {
    let stripe = MockServer::start().await;
    let webhook = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&webhook)
        .await;

    let ctx = TestContext::with_checkout(&stripe.uri(), &format!("{}/orders", webhook.uri())).await;
    add_small_jar(&ctx).await;

    let mut form = order_form("pm_card_visa");
    form[2].1 = "not-an-email".to_string();
    form[6].1 = "   ".to_string();

    let resp = submit(&ctx, &form).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = resp.text().await.unwrap();
    assert!(body.contains("Please correct the highlighted fields."));
    assert!(body.contains("value=\"Ada\""));
    assert!(body.contains("value=\"not-an-email\""));
    assert!(body.contains("is required"));
}

#[tokio::test]
async fn test_missing_card_token_is_inline_error() {
    let stripe = MockServer::start().await;
    let webhook = MockServer::start().await;
    let ctx = TestContext::with_checkout(&stripe.uri(), &format!("{}/orders", webhook.uri())).await;
    add_small_jar(&ctx).await;

    let resp = submit(&ctx, &order_form("")).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(resp.text().await.unwrap().contains("Please enter your card details."));
}

#[tokio::test]
async fn test_webhook_failure_keeps_cart() {
    let stripe = MockServer::start().await;
    let webhook = MockServer::start().await;
    mount_payment_method(&stripe).await;

    Mock::given(method("POST"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&webhook)
        .await;

    let ctx = TestContext::with_checkout(&stripe.uri(), &format!("{}/orders", webhook.uri())).await;
    add_small_jar(&ctx).await;

    let resp = submit(&ctx, &order_form("pm_card_visa")).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = resp.text().await.unwrap();
    assert!(body.contains("There was an issue processing your order."));
    assert!(body.contains("value=\"Lovelace\""));

    let cart = ctx.client.get(ctx.url("/cart")).send().await.unwrap().text().await.unwrap();
    assert!(cart.contains("Zinga Ginger Ground - 200g"));
}

#[tokio::test]
async fn test_concurrent_submission_is_rejected() {
    let stripe = MockServer::start().await;
    let webhook = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/payment_methods/pm_card_visa"))
        .respond_with(payment_method().set_delay(Duration::from_secs(1)))
        .mount(&stripe)
        .await;
    mount_accepting_webhook(&webhook).await;

    let ctx = TestContext::with_checkout(&stripe.uri(), &format!("{}/orders", webhook.uri())).await;
    add_small_jar(&ctx).await;

    let first = {
        let client = ctx.client.clone();
        let url = ctx.url("/checkout");
        let form = order_form("pm_card_visa");
        tokio::spawn(async move { client.post(url).form(&form).send().await.unwrap() })
    };

    tokio::time::sleep(Duration::from_millis(300)).await;
    let second = submit(&ctx, &order_form("pm_card_visa")).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);

    let first = first.await.unwrap();
    assert!(first.status().is_redirection(), "got {}", first.status());
    assert_eq!(first.headers()["location"], "/");
    assert_order_placed(&ctx).await;
}

#[tokio::test]
async fn test_dropped_submission_does_not_lock_checkout() {
    let stripe = MockServer::start().await;
    let webhook = MockServer::start().await;

    // Only the first lookup is slow.
    Mock::given(method("GET"))
        .and(path("/v1/payment_methods/pm_card_visa"))
        .respond_with(payment_method().set_delay(Duration::from_secs(2)))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&stripe)
        .await;
    mount_payment_method(&stripe).await;
    mount_accepting_webhook(&webhook).await;

    let mut config = checkout_config(&stripe.uri(), &format!("{}/orders", webhook.uri()));
    config.http_timeout = Duration::from_millis(500);
    let ctx = TestContext::with_config(config).await;
    add_small_jar(&ctx).await;

    let err = ctx
        .client
        .post(ctx.url("/checkout"))
        .form(&order_form("pm_card_visa"))
        .timeout(Duration::from_millis(300))
        .send()
        .await
        .unwrap_err();
    assert!(err.is_timeout());

    // Past two outbound timeouts plus slack, the stored phase is stale.
    tokio::time::sleep(Duration::from_millis(2500)).await;

    let resp = submit(&ctx, &order_form("pm_card_visa")).await;
    assert!(resp.status().is_redirection(), "got {}", resp.status());
    assert_eq!(resp.headers()["location"], "/");
    assert_order_placed(&ctx).await;
}

#[tokio::test]
async fn test_optimistic_policy_places_order_on_slow_webhook() {
    let stripe = MockServer::start().await;
    let webhook = MockServer::start().await;
    mount_payment_method(&stripe).await;

    Mock::given(method("POST"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .expect(1)
        .mount(&webhook)
        .await;

    let mut config = checkout_config(&stripe.uri(), &format!("{}/orders", webhook.uri()));
    config.http_timeout = Duration::from_millis(500);
    if let Some(orders) = config.orders.as_mut() {
        orders.policy = DeliveryPolicy::Optimistic;
    }
    let ctx = TestContext::with_config(config).await;
    add_small_jar(&ctx).await;

    let resp = submit(&ctx, &order_form("pm_card_visa")).await;
    assert!(resp.status().is_redirection(), "got {}", resp.status());
    assert_eq!(resp.headers()["location"], "/");
    assert_order_placed(&ctx).await;
}

#[tokio::test]
async fn test_strict_policy_keeps_cart_on_slow_webhook() {
    let stripe = MockServer::start().await;
    let webhook = MockServer::start().await;
    mount_payment_method(&stripe).await;

    Mock::given(method("POST"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&webhook)
        .await;

    let mut config = checkout_config(&stripe.uri(), &format!("{}/orders", webhook.uri()));
    config.http_timeout = Duration::from_millis(500);
    let ctx = TestContext::with_config(config).await;
    add_small_jar(&ctx).await;

    let resp = submit(&ctx, &order_form("pm_card_visa")).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // A failed attempt returns to editing, so the customer can retry at once.
    let retry = submit(&ctx, &order_form("pm_card_visa")).await;
    assert_eq!(retry.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let cart = ctx.client.get(ctx.url("/cart")).send().await.unwrap().text().await.unwrap();
    assert!(cart.contains("Zinga Ginger Ground - 200g"));
}
