//! Cart line items and the cart snapshot.
//!
//! A [`Cart`] serializes as a bare JSON array of flat line items, which is the
//! layout kept under the cart's storage key:
//!
//! ```json
//! [{"id":1,"title":"...","price":179.9,"image":"...","amount":2}]
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use super::id::ProductId;
use super::price::Price;
use super::product::Product;

/// A product in the cart together with the quantity being purchased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Product ID.
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// Unit price.
    pub price: Price,
    /// Image URL.
    pub image: String,
    /// Quantity in the cart. Always at least 1.
    pub amount: u32,
}

impl CartItem {
    /// Build a line item from a catalog product.
    #[must_use]
    pub fn from_product(product: Product, amount: u32) -> Self {
        Self {
            id: product.id,
            title: product.title,
            price: product.price,
            image: product.image,
            amount,
        }
    }

    /// Price of the whole line (`price × amount`).
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.amount)
    }
}

/// A stored list of line items that does not form a valid cart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidCart {
    #[error("product {0} appears more than once")]
    DuplicateItem(ProductId),

    #[error("product {0} has amount 0")]
    ZeroAmount(ProductId),
}

/// An ordered collection of line items, unique by product ID.
///
/// Insertion order is kept for display. Deserialization rejects duplicate
/// product IDs and zero amounts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// All line items in display order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up the line item for a product.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Position of the product's line item, if present.
    #[must_use]
    pub fn position(&self, id: ProductId) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    /// Quantity of the product currently in the cart (0 if absent).
    #[must_use]
    pub fn amount_of(&self, id: ProductId) -> u32 {
        self.get(id).map_or(0, |item| item.amount)
    }

    /// Total number of units across all line items.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.amount)).sum()
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Append a line item, or replace the existing one for the same product
    /// in place.
    pub fn insert(&mut self, item: CartItem) {
        match self.items.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
    }

    /// Set the quantity of an existing line item.
    ///
    /// Returns `false` if the product is not in the cart.
    pub fn set_amount(&mut self, id: ProductId, amount: u32) -> bool {
        match self.items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.amount = amount;
                true
            }
            None => false,
        }
    }

    /// Remove the product's line item, returning it if it was present.
    pub fn remove(&mut self, id: ProductId) -> Option<CartItem> {
        self.position(id).map(|index| self.items.remove(index))
    }

    /// Check that every product appears once with an amount of at least 1.
    ///
    /// # Errors
    ///
    /// Returns the first rule violation found in display order.
    pub fn validate(&self) -> Result<(), InvalidCart> {
        let mut seen = HashSet::with_capacity(self.items.len());
        for item in &self.items {
            if item.amount == 0 {
                return Err(InvalidCart::ZeroAmount(item.id));
            }
            if !seen.insert(item.id) {
                return Err(InvalidCart::DuplicateItem(item.id));
            }
        }
        Ok(())
    }
}

impl<'de> Deserialize<'de> for Cart {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let cart = Self {
            items: Vec::deserialize(deserializer)?,
        };
        cart.validate().map_err(serde::de::Error::custom)?;
        Ok(cart)
    }
}

impl From<Vec<CartItem>> for Cart {
    fn from(items: Vec<CartItem>) -> Self {
        Self { items }
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a CartItem;
    type IntoIter = core::slice::Iter<'a, CartItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
