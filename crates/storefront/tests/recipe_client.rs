//! Integration tests for `RecipeClient`.

use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zinga_core::RecipeRequest;
use zinga_storefront::config::GeminiConfig;
use zinga_storefront::services::recipes::{RecipeClient, RecipeError};

const MODEL: &str = "gemini-2.5-flash";
const ENDPOINT: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

fn test_client(server: &MockServer) -> RecipeClient {
    let config = GeminiConfig {
        api_key: SecretString::from("AIzaSyTestKeyForWiremockOnly0123456789".to_string()),
        model: MODEL.to_string(),
        api_base: server.uri(),
    };
    RecipeClient::new(&config, Duration::from_secs(5)).expect("failed to build test RecipeClient")
}

fn request() -> RecipeRequest {
    RecipeRequest::from_form("chicken, rice", "Gluten-Free").expect("ingredients given")
}

fn text_response(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
}

#[tokio::test]
async fn test_generate_decodes_recipe() {
    let server = MockServer::start().await;

    let recipe = json!({
        "title": "Ginger Chicken Rice",
        "description": "A warming one-pot dinner.",
        "ingredients": ["2 chicken thighs", "1 cup rice", "1 tsp Zinga Ginger Powder"],
        "instructions": ["Brown the chicken.", "Add rice and water.", "Simmer 20 minutes."],
        "prepTime": "10 min",
        "cookTime": "25 min",
        "servings": "2",
        "difficulty": "Easy"
    });

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(header("x-goog-api-key", "AIzaSyTestKeyForWiremockOnly0123456789"))
        .and(body_partial_json(json!({
            "generationConfig": {"responseMimeType": "application/json"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response(&recipe.to_string())))
        .expect(1)
        .mount(&server)
        .await;

    let recipe = test_client(&server)
        .generate(&request())
        .await
        .expect("generation should succeed")
        .expect("recipe expected");

    assert_eq!(recipe.title, "Ginger Chicken Rice");
    assert_eq!(recipe.instructions.len(), 3);
    assert_eq!(recipe.prep_time, "10 min");
    assert_eq!(recipe.difficulty, "Easy");
}

#[tokio::test]
async fn test_generate_without_text_is_none() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .mount(&server)
        .await;

    let recipe = test_client(&server)
        .generate(&request())
        .await
        .expect("empty answer is not an error");

    assert!(recipe.is_none());
}

#[tokio::test]
async fn test_generate_invalid_recipe_json_is_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(text_response("{\"title\": \"Half a rec")),
        )
        .mount(&server)
        .await;

    let err = test_client(&server)
        .generate(&request())
        .await
        .expect_err("truncated JSON should fail");

    assert!(matches!(err, RecipeError::Parse(_)), "got {err:?}");
}

#[tokio::test]
async fn test_generate_api_error_carries_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}
        })))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .generate(&request())
        .await
        .expect_err("400 should fail");

    match err {
        RecipeError::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "API key not valid.");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}
