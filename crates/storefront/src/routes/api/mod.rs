//! JSON API handlers.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::instrument;
use zinga_core::Product;
use zinga_core::types::price::{self, Price};

use crate::catalog::CatalogListing;
use crate::state::AppState;

/// Product as exposed by `GET /api/products`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductJson<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub description: &'a str,
    #[serde(with = "price::as_number")]
    pub price: Price,
    pub image: &'a str,
    pub category: &'a str,
    pub ingredients: &'a [String],
    pub price_reference_id: &'a str,
}

impl<'a> From<&'a Product> for ProductJson<'a> {
    fn from(product: &'a Product) -> Self {
        Self {
            id: product.id.as_str(),
            name: &product.name,
            description: &product.description,
            price: product.price,
            image: &product.image,
            category: &product.category,
            ingredients: &product.ingredients,
            price_reference_id: product.price_reference_id.as_str(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorJson {
    message: &'static str,
}

/// List products as JSON.
///
/// Answers 500 with `{"message": "Failed to fetch products"}` when the
/// product source fails; an empty catalog is `[]`.
#[instrument(skip(state))]
pub async fn products(State(state): State<AppState>) -> Response {
    match state.products().fetch_products().await {
        CatalogListing::FetchFailed(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorJson {
                message: "Failed to fetch products",
            }),
        )
            .into_response(),
        listing => {
            let body: Vec<ProductJson<'_>> =
                listing.products().iter().map(ProductJson::from).collect();
            Json(body).into_response()
        }
    }
}
