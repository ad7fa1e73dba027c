//! Stripe response to domain type conversions.

use zinga_core::{Price, PriceReferenceId, Product, ProductId};

use super::types::{DefaultPrice, StripeProduct};

/// Category used when a product carries no `category` metadata.
pub const DEFAULT_CATEGORY: &str = "Essentials";

/// Ingredient list used when a product carries no `ingredients` metadata.
pub const DEFAULT_INGREDIENT: &str = "100% Organic Ginger Root";

/// Convert a Stripe product into a catalog product.
pub fn convert_product(product: StripeProduct) -> Product {
    let (price, price_reference_id) = match product.default_price {
        Some(DefaultPrice::Expanded(price)) => (
            price.unit_amount.map_or(Price::ZERO, Price::from_cents),
            price.id,
        ),
        Some(DefaultPrice::Id(id)) => (Price::ZERO, id),
        None => (Price::ZERO, String::new()),
    };

    let category = product
        .metadata
        .get("category")
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map_or_else(|| DEFAULT_CATEGORY.to_string(), str::to_string);

    Product {
        id: ProductId::new(product.id),
        name: product.name,
        price,
        description: product.description.unwrap_or_default(),
        image: product.images.into_iter().next().unwrap_or_default(),
        category,
        ingredients: parse_ingredients(product.metadata.get("ingredients").map(String::as_str)),
        price_reference_id: PriceReferenceId::new(price_reference_id),
    }
}

/// Split comma-separated ingredient metadata.
fn parse_ingredients(raw: Option<&str>) -> Vec<String> {
    let ingredients: Vec<String> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if ingredients.is_empty() {
        vec![DEFAULT_INGREDIENT.to_string()]
    } else {
        ingredients
    }
}
