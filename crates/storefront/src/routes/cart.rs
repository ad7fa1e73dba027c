//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! The cart itself lives in the session; every mutation answers with
//! `HX-Trigger: cart-updated` so the navbar badge refreshes.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use zinga_core::image::DEFAULT_QUALITY;
use zinga_core::{Cart, CartItem, ProductId, optimized_image_url};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::CspNonce;
use crate::services::cart::{CART_UPDATED_EVENT, CartStore};
use crate::state::AppState;

/// Width of cart line thumbnails.
const THUMBNAIL_WIDTH: u32 = 200;

/// Cart item display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub id: String,
    pub name: String,
    pub category: String,
    pub image: String,
    pub quantity: u32,
    pub price: String,
    pub line_total: String,
}

impl From<&CartItem> for CartItemView {
    fn from(item: &CartItem) -> Self {
        Self {
            id: item.product.id.to_string(),
            name: item.product.name.clone(),
            category: item.product.category.clone(),
            image: optimized_image_url(
                Some(item.product.image.as_str()),
                THUMBNAIL_WIDTH,
                DEFAULT_QUALITY,
            ),
            quantity: item.quantity,
            price: item.product.price.display(),
            line_total: item.line_total().display(),
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total: String,
    pub item_count: u64,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.items().iter().map(CartItemView::from).collect(),
            total: cart.total().display(),
            item_count: cart.item_count(),
        }
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: String,
    pub quantity: i64,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
    pub nonce: String,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u64,
}

/// Fragment response that also tells the page the cart changed.
fn updated(fragment: impl IntoResponse) -> Response {
    (
        AppendHeaders([("HX-Trigger", CART_UPDATED_EVENT)]),
        fragment,
    )
        .into_response()
}

/// Display cart page.
#[instrument(skip(session, nonce))]
pub async fn show(session: Session, CspNonce(nonce): CspNonce) -> Result<CartShowTemplate> {
    let store = CartStore::load(session).await?;

    Ok(CartShowTemplate {
        cart: CartView::from(store.cart()),
        nonce,
    })
}

/// Add one unit of a product to the cart (HTMX).
///
/// Returns the updated count badge.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let product_id = ProductId::new(form.product_id);
    let product = state
        .products()
        .fetch_product_by_id(&product_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Product {product_id}")))?;

    let mut store = CartStore::load(session).await?;
    store.add_to_cart(&product).await?;
    add_breadcrumb("cart", "Added product", Some(&[("product_id", product_id.as_str())]));

    Ok(updated(CartCountTemplate {
        count: store.cart().item_count(),
    }))
}

/// Set a line's quantity (HTMX). Zero or less removes the line.
#[instrument(skip(session))]
pub async fn update(session: Session, Form(form): Form<UpdateCartForm>) -> Result<Response> {
    let mut store = CartStore::load(session).await?;
    store
        .update_quantity(&ProductId::new(form.product_id), form.quantity)
        .await?;

    Ok(updated(CartItemsTemplate {
        cart: CartView::from(store.cart()),
    }))
}

/// Remove a line from the cart (HTMX).
#[instrument(skip(session))]
pub async fn remove(session: Session, Form(form): Form<RemoveFromCartForm>) -> Result<Response> {
    let mut store = CartStore::load(session).await?;
    store
        .remove_from_cart(&ProductId::new(form.product_id))
        .await?;

    Ok(updated(CartItemsTemplate {
        cart: CartView::from(store.cart()),
    }))
}

/// Empty the cart (HTMX).
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<Response> {
    let mut store = CartStore::load(session).await?;
    store.clear_cart().await?;

    Ok(updated(CartItemsTemplate {
        cart: CartView::from(store.cart()),
    }))
}

/// Get cart count badge (HTMX).
#[instrument(skip(session))]
pub async fn count(session: Session) -> Result<CartCountTemplate> {
    let store = CartStore::load(session).await?;

    Ok(CartCountTemplate {
        count: store.cart().item_count(),
    })
}
