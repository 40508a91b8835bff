//! Catalog entries and stock levels as served by the catalog API.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// A product as returned by `GET /products/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product ID.
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// Unit price.
    pub price: Price,
    /// Image URL.
    pub image: String,
}

/// Stock level as returned by `GET /stock/{id}`.
///
/// `amount` is the maximum quantity of the product that may be in a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    /// Product ID.
    pub id: ProductId,
    /// Maximum purchasable quantity.
    pub amount: u32,
}

impl Stock {
    /// Whether `requested` units can be covered by this stock level.
    #[must_use]
    pub const fn covers(&self, requested: u32) -> bool {
        requested <= self.amount
    }
}
