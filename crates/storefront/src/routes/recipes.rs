//! Recipe generator route handlers.
//!
//! The form posts via HTMX and the result (or an error) is swapped into the
//! page as a fragment.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Form, extract::State, response::IntoResponse};
use serde::Deserialize;
use tracing::instrument;
use zinga_core::{Dietary, Recipe, RecipeRequest};

use crate::filters;
use crate::middleware::CspNonce;
use crate::services::recipes::RECIPE_FAILED_MESSAGE;
use crate::state::AppState;

const NO_INGREDIENTS_MESSAGE: &str = "Tell us what's in your pantry first.";
const UNAVAILABLE_MESSAGE: &str = "The recipe generator is not available right now.";

/// One `<option>` of the dietary select.
#[derive(Clone)]
pub struct DietaryOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

fn dietary_options(selected: Dietary) -> Vec<DietaryOption> {
    Dietary::ALL
        .into_iter()
        .map(|d| DietaryOption {
            value: if d == Dietary::None { "" } else { d.label() },
            label: d.label(),
            selected: d == selected,
        })
        .collect()
}

/// Recipe form data.
#[derive(Debug, Default, Deserialize)]
pub struct RecipeForm {
    #[serde(default)]
    pub ingredients: String,
    #[serde(default)]
    pub dietary: String,
}

/// Recipe page template.
#[derive(Template, WebTemplate)]
#[template(path = "recipes/show.html")]
pub struct RecipesTemplate {
    pub options: Vec<DietaryOption>,
    pub available: bool,
    pub nonce: String,
}

/// Recipe result fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/recipe_result.html")]
pub struct RecipeResultTemplate {
    pub recipe: Option<Recipe>,
    pub error: Option<String>,
}

impl RecipeResultTemplate {
    fn error(message: &str) -> Self {
        Self {
            recipe: None,
            error: Some(message.to_string()),
        }
    }
}

/// Display the recipe generator form.
#[instrument(skip(state, nonce))]
pub async fn show(State(state): State<AppState>, CspNonce(nonce): CspNonce) -> impl IntoResponse {
    RecipesTemplate {
        options: dietary_options(Dietary::None),
        available: state.recipes().is_some(),
        nonce,
    }
}

/// Generate a recipe (HTMX).
///
/// Blank ingredients never reach the model. Every failure renders the same
/// retry-later message.
#[instrument(skip(state))]
pub async fn generate(
    State(state): State<AppState>,
    Form(form): Form<RecipeForm>,
) -> RecipeResultTemplate {
    let Some(request) = RecipeRequest::from_form(&form.ingredients, &form.dietary) else {
        return RecipeResultTemplate::error(NO_INGREDIENTS_MESSAGE);
    };

    let Some(client) = state.recipes() else {
        return RecipeResultTemplate::error(UNAVAILABLE_MESSAGE);
    };

    match client.generate(&request).await {
        Ok(recipe) => RecipeResultTemplate {
            recipe,
            error: None,
        },
        Err(e) => {
            let event_id = sentry::capture_error(&e);
            tracing::error!(error = %e, sentry_event_id = %event_id, "Recipe generation failed");
            RecipeResultTemplate::error(RECIPE_FAILED_MESSAGE)
        }
    }
}
