//! Catalog product.

use serde::{Deserialize, Serialize};

use super::id::{PriceReferenceId, ProductId};
use super::price::Price;

/// A purchasable catalog entry.
///
/// Products are immutable once fetched from the product source; the cart
/// keeps its own copy so a later catalog change never rewrites a line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Unique product identifier.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Unit price in currency units.
    pub price: Price,
    /// Long-form description.
    pub description: String,
    /// Raw image URL (may be empty).
    pub image: String,
    /// Category label used for grouping and related products.
    pub category: String,
    /// Ordered ingredient list.
    pub ingredients: Vec<String>,
    /// External price reference used by the payment provider.
    pub price_reference_id: PriceReferenceId,
}

impl Product {
    /// Pick products to show next to `self`: every other product, those in
    /// the same category first, at most `limit` of them.
    ///
    /// The order within each group follows `catalog` order.
    #[must_use]
    pub fn related<'a>(&self, catalog: &'a [Self], limit: usize) -> Vec<&'a Self> {
        let (same, other): (Vec<&Self>, Vec<&Self>) = catalog
            .iter()
            .filter(|p| p.id != self.id)
            .partition(|p| p.category == self.category);

        same.into_iter().chain(other).take(limit).collect()
    }
}
