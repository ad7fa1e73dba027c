//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::instrument;
use zinga_core::image::DEFAULT_QUALITY;
use zinga_core::{Product, ProductId, optimized_image_url};

use crate::catalog::RELATED_COUNT;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::CspNonce;
use crate::state::AppState;

/// Width of product card images.
const CARD_IMAGE_WIDTH: u32 = 600;

/// Width of the product detail image.
const DETAIL_IMAGE_WIDTH: u32 = 1200;

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub category: String,
    pub ingredients: Vec<String>,
    /// Card-sized image URL.
    pub image: String,
    /// Full-width image URL.
    pub image_large: String,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        let image = Some(product.image.as_str());
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.display(),
            category: product.category.clone(),
            ingredients: product.ingredients.clone(),
            image: optimized_image_url(image, CARD_IMAGE_WIDTH, DEFAULT_QUALITY),
            image_large: optimized_image_url(image, DETAIL_IMAGE_WIDTH, 90),
        }
    }
}

/// Social share links for a product page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShareLinks {
    pub facebook: String,
    pub twitter: String,
    pub pinterest: String,
}

impl ShareLinks {
    /// Build share links for `product` as served from `base_url`.
    #[must_use]
    pub fn new(base_url: &str, product: &Product) -> Self {
        let page = format!(
            "{}/product/{}",
            base_url.trim_end_matches('/'),
            urlencoding::encode(product.id.as_str())
        );
        let url = urlencoding::encode(&page);
        let text = urlencoding::encode(&format!("Check out {} at Zinga Spice Co.!", product.name))
            .into_owned();
        let image = urlencoding::encode(&product.image);

        Self {
            facebook: format!("https://www.facebook.com/sharer/sharer.php?u={url}"),
            twitter: format!("https://twitter.com/intent/tweet?url={url}&text={text}"),
            pinterest: format!(
                "https://pinterest.com/pin/create/button/?url={url}&media={image}&description={text}"
            ),
        }
    }
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub products: Vec<ProductView>,
    pub load_failed: bool,
    pub nonce: String,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: ProductView,
    pub related: Vec<ProductView>,
    pub share: ShareLinks,
    pub nonce: String,
}

/// Display product listing page.
#[instrument(skip(state, nonce))]
pub async fn index(State(state): State<AppState>, CspNonce(nonce): CspNonce) -> impl IntoResponse {
    let listing = state.products().fetch_products().await;

    ProductsIndexTemplate {
        products: listing.products().iter().map(ProductView::from).collect(),
        load_failed: listing.is_failed(),
        nonce,
    }
}

/// Display product detail page with related products and share links.
#[instrument(skip(state, nonce), fields(product_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
    CspNonce(nonce): CspNonce,
) -> Result<ProductShowTemplate> {
    let id = ProductId::new(id);
    let catalog = state.products().fetch_products().await.into_products();

    let product = catalog
        .iter()
        .find(|p| p.id == id)
        .ok_or_else(|| AppError::NotFound(format!("Product {id}")))?;

    Ok(ProductShowTemplate {
        product: ProductView::from(product),
        related: product
            .related(&catalog, RELATED_COUNT)
            .into_iter()
            .map(ProductView::from)
            .collect(),
        share: ShareLinks::new(&state.config().base_url, product),
        nonce,
    })
}
