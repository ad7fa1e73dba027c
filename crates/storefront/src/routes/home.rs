//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use super::products::ProductView;
use crate::catalog::FEATURED_COUNT;
use crate::filters;
use crate::middleware::CspNonce;
use crate::models::Flash;
use crate::state::AppState;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub featured: Vec<ProductView>,
    pub load_failed: bool,
    pub flash: Option<String>,
    pub nonce: String,
}

/// Display home page: hero, featured products, and any pending flash message.
#[instrument(skip(state, session, nonce))]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    CspNonce(nonce): CspNonce,
) -> impl IntoResponse {
    let listing = state.products().fetch_products().await;
    let flash = Flash::take(&session).await.map(|f| f.message);

    HomeTemplate {
        featured: listing
            .products()
            .iter()
            .take(FEATURED_COUNT)
            .map(ProductView::from)
            .collect(),
        load_failed: listing.is_failed(),
        flash,
        nonce,
    }
}
