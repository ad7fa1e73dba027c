//! Product source: the built-in catalog or a live Stripe listing.
//!
//! Fetch failures are logged here and surfaced as
//! [`CatalogListing::FetchFailed`]; they never reach a handler as an error,
//! so a page can tell "no products" apart from "could not load products".

use tracing::instrument;
use zinga_core::{Price, PriceReferenceId, Product, ProductId};

use crate::stripe::{DEFAULT_INGREDIENT, StripeClient};

/// Number of products shown on the home page.
pub const FEATURED_COUNT: usize = 3;

/// Number of related products shown on a product page.
pub const RELATED_COUNT: usize = 3;

/// Result of fetching the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogListing {
    /// At least one product.
    Products(Vec<Product>),
    /// The source answered with no products.
    Empty,
    /// The source could not be reached or returned garbage.
    FetchFailed(String),
}

impl CatalogListing {
    fn from_products(products: Vec<Product>) -> Self {
        if products.is_empty() {
            Self::Empty
        } else {
            Self::Products(products)
        }
    }

    /// Products in the listing; empty for `Empty` and `FetchFailed`.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        match self {
            Self::Products(products) => products,
            Self::Empty | Self::FetchFailed(_) => &[],
        }
    }

    /// Consume the listing, keeping only its products.
    #[must_use]
    pub fn into_products(self) -> Vec<Product> {
        match self {
            Self::Products(products) => products,
            Self::Empty | Self::FetchFailed(_) => Vec::new(),
        }
    }

    /// Whether the fetch failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::FetchFailed(_))
    }
}

/// Where products come from.
#[derive(Clone)]
pub enum ProductSource {
    /// A fixed in-memory catalog.
    Mock(Vec<Product>),
    /// Live Stripe product listing.
    Stripe(StripeClient),
}

impl ProductSource {
    /// The built-in Zinga ginger catalog.
    #[must_use]
    pub fn mock() -> Self {
        Self::Mock(mock_catalog())
    }

    /// Fetch the full catalog.
    #[instrument(skip(self), fields(source = self.name()))]
    pub async fn fetch_products(&self) -> CatalogListing {
        match self {
            Self::Mock(products) => CatalogListing::from_products(products.clone()),
            Self::Stripe(client) => match client.list_products().await {
                Ok(products) => CatalogListing::from_products(products),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to fetch products");
                    CatalogListing::FetchFailed(e.to_string())
                }
            },
        }
    }

    /// Fetch one product by id.
    ///
    /// Filters the full listing, so a failed fetch looks the same as an
    /// unknown id.
    pub async fn fetch_product_by_id(&self, id: &ProductId) -> Option<Product> {
        self.fetch_products()
            .await
            .into_products()
            .into_iter()
            .find(|p| &p.id == id)
    }

    const fn name(&self) -> &'static str {
        match self {
            Self::Mock(_) => "mock",
            Self::Stripe(_) => "stripe",
        }
    }
}

fn unsplash(photo: &str) -> String {
    format!("https://images.unsplash.com/{photo}?auto=format&fit=crop&w=800&q=80")
}

fn mock_product(
    id: &str,
    name: &str,
    cents: i64,
    description: &str,
    photo: &str,
    category: &str,
    price_id: &str,
) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        price: Price::from_cents(cents),
        description: description.to_string(),
        image: unsplash(photo),
        category: category.to_string(),
        ingredients: vec![DEFAULT_INGREDIENT.to_string()],
        price_reference_id: PriceReferenceId::new(price_id),
    }
}

/// The four Zinga ginger powder sizes.
#[must_use]
pub fn mock_catalog() -> Vec<Product> {
    vec![
        mock_product(
            "prod_Tc88iHqWbl52O7",
            "Zinga Ginger Ground - 200g",
            300,
            "Premium finely ground ginger root in a convenient 200g (7oz) jar. Perfect for \
             trying out our signature spice or for small households.",
            "photo-1615485290382-441e4d049cb5",
            "Essentials",
            "price_1SetsfDWAhEwNqo7XgMaa2RU",
        ),
        mock_product(
            "prod_Tc8B9WROVdT2cv",
            "Zinga Ginger Ground - 500g",
            700,
            "Our signature ginger powder in a 500g (17.6oz) eco-friendly paper bag. A pantry \
             staple for baking and cooking enthusiasts.",
            "photo-1596040033229-a9821ebd058d",
            "Essentials",
            "price_1SetukDWAhEwNqo7qbiPqXTE",
        ),
        mock_product(
            "prod_Tc8DlYLdhVR9P8",
            "Zinga Ginger Ground - 1000g",
            1400,
            "A substantial 1000g (35.3oz) jar of our aromatic, sun-dried ginger powder. \
             Excellent value for daily wellness routines.",
            "photo-1532336414038-cf19250c5757",
            "Bulk",
            "price_1SetweDWAhEwNqo7hGsI36jN",
        ),
        mock_product(
            "prod_Tc8EluZFz7iZV4",
            "Zinga Ginger Ground - 2000g",
            2500,
            "The ultimate 2000g (70.6oz) supply. The professional choice for maximum flavor, \
             longevity, and savings.",
            "photo-1635563138905-596784476e48",
            "Bulk",
            "price_1Sety4DWAhEwNqo7YQbsAIFX",
        ),
    ]
}
