//! Recipe generator backed by the Gemini `generateContent` API.
//!
//! One request per generation, constrained to a JSON response schema so the
//! reply decodes straight into a [`Recipe`].

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::instrument;
use zinga_core::{Recipe, RecipeRequest};

use crate::config::GeminiConfig;

/// Message shown whenever generation fails, whatever the cause.
pub const RECIPE_FAILED_MESSAGE: &str = "Our AI chef is having a moment. Please try again later.";

/// Errors that can occur when generating a recipe.
#[derive(Debug, Error)]
pub enum RecipeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API returned an error response.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Rate limited by the API.
    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The response or the recipe inside it did not parse.
    #[error("parse error: {0}")]
    Parse(String),

    /// The API key cannot be sent as a header.
    #[error("invalid API key: {0}")]
    InvalidKey(String),
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate, if it has any.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

/// Response schema every generated recipe must satisfy.
fn recipe_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": {"type": "STRING"},
            "description": {"type": "STRING"},
            "ingredients": {"type": "ARRAY", "items": {"type": "STRING"}},
            "instructions": {"type": "ARRAY", "items": {"type": "STRING"}},
            "prepTime": {"type": "STRING"},
            "cookTime": {"type": "STRING"},
            "servings": {"type": "STRING"},
            "difficulty": {"type": "STRING"}
        },
        "required": ["title", "description", "ingredients", "instructions", "prepTime", "cookTime"]
    })
}

// =============================================================================
// RecipeClient
// =============================================================================

/// Gemini API client for recipe generation.
#[derive(Clone)]
pub struct RecipeClient {
    inner: Arc<RecipeClientInner>,
}

struct RecipeClientInner {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl RecipeClient {
    /// Create a new recipe client.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is not a valid header value or the
    /// HTTP client cannot be built.
    pub fn new(config: &GeminiConfig, timeout: Duration) -> Result<Self, RecipeError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(config.api_key.expose_secret())
                .map_err(|e| RecipeError::InvalidKey(e.to_string()))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        let endpoint = format!(
            "{}/v1beta/models/{}:generateContent",
            config.api_base.trim_end_matches('/'),
            config.model
        );

        Ok(Self {
            inner: Arc::new(RecipeClientInner {
                client,
                endpoint,
                model: config.model.clone(),
            }),
        })
    }

    /// Generate a recipe featuring Zinga ginger powder.
    ///
    /// Returns `Ok(None)` when the model answers without any text.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the API answers with an error,
    /// or the text does not decode into a recipe.
    #[instrument(skip(self, request), fields(model = %self.inner.model, dietary = request.dietary.label()))]
    pub async fn generate(&self, request: &RecipeRequest) -> Result<Option<Recipe>, RecipeError> {
        let body = GenerateRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(request.prompt()),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: recipe_schema(),
            },
        };

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return Err(RecipeError::RateLimited(retry_after));
        }

        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorResponse>(&text)
                .map_or_else(|_| text.chars().take(200).collect(), |e| e.error.message);
            return Err(RecipeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let response: GenerateResponse = serde_json::from_str(&text)
            .map_err(|e| RecipeError::Parse(format!("Failed to parse response: {e}")))?;

        let Some(recipe_json) = response.text() else {
            tracing::warn!("Model returned no text");
            return Ok(None);
        };

        serde_json::from_str(&recipe_json)
            .map(Some)
            .map_err(|e| RecipeError::Parse(format!("Failed to parse recipe: {e}")))
    }
}
