//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page (hero, featured products, flash)
//! GET  /health                 - Health check
//!
//! # Products
//! GET  /products               - Product listing
//! GET  /product/{id}           - Product detail
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add to cart (returns count badge, triggers cart-updated)
//! POST /cart/update            - Update quantity (returns cart_items fragment)
//! POST /cart/remove            - Remove item (returns cart_items fragment)
//! POST /cart/clear             - Empty the cart (returns cart_items fragment)
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Checkout
//! GET  /checkout               - Checkout form
//! POST /checkout               - Place order (rate limited)
//!
//! # Recipes
//! GET  /recipes                - Recipe generator form
//! POST /recipes                - Generate a recipe (HTMX fragment, rate limited)
//!
//! # API
//! GET  /api/products           - Product listing as JSON
//! ```
//!
//! Any other path redirects to `/`.

pub mod api;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod products;
pub mod recipes;

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};

use crate::middleware::{checkout_rate_limiter, recipe_rate_limiter};
use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create the JSON API router.
pub fn api_routes() -> Router<AppState> {
    Router::new().route("/products", get(api::products))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Product routes
        .route("/products", get(products::index))
        .route("/product/{id}", get(products::show))
        // Cart routes
        .nest("/cart", cart_routes())
        // Checkout (only submission is rate limited)
        .route(
            "/checkout",
            get(checkout::show).merge(post(checkout::submit).layer(checkout_rate_limiter())),
        )
        // Recipe generator
        .route(
            "/recipes",
            get(recipes::show).merge(post(recipes::generate).layer(recipe_rate_limiter())),
        )
        // JSON API
        .nest("/api", api_routes())
}

/// Unknown paths go back to the home page.
pub async fn fallback() -> Redirect {
    Redirect::to("/")
}
