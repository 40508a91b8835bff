//! JSON-file catalog database.
//!
//! The file holds two top-level arrays:
//!
//! ```json
//! {
//!   "products": [{"id": 1, "title": "...", "price": 179.9, "image": "..."}],
//!   "stock": [{"id": 1, "amount": 3}]
//! }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rocketshoes_core::{Product, ProductId, Stock};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading the catalog database.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid catalog database {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Duplicate {kind} id {id}")]
    DuplicateId { kind: &'static str, id: ProductId },
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    products: Vec<Product>,
    #[serde(default)]
    stock: Vec<Stock>,
}

/// In-memory, read-only catalog.
#[derive(Debug, Default)]
pub struct CatalogDb {
    products: Vec<Product>,
    stock: Vec<Stock>,
    product_index: HashMap<ProductId, usize>,
    stock_index: HashMap<ProductId, usize>,
}

impl CatalogDb {
    /// Build a catalog from product and stock lists.
    ///
    /// # Errors
    ///
    /// Returns `DbError::DuplicateId` if an id appears twice in either list.
    pub fn new(products: Vec<Product>, stock: Vec<Stock>) -> Result<Self, DbError> {
        let product_index = index_by_id("product", products.iter().map(|p| p.id))?;
        let stock_index = index_by_id("stock", stock.iter().map(|s| s.id))?;
        Ok(Self {
            products,
            stock,
            product_index,
            stock_index,
        })
    }

    /// Load a catalog from a JSON database file.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the file cannot be read or is invalid.
    pub fn load(path: &Path) -> Result<Self, DbError> {
        let contents = std::fs::read_to_string(path).map_err(|source| DbError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents).map_err(|err| match err {
            DbError::Parse { source, .. } => DbError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Parse a catalog from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the JSON is invalid or contains duplicate ids.
    pub fn from_json(json: &str) -> Result<Self, DbError> {
        let file: CatalogFile = serde_json::from_str(json).map_err(|source| DbError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        Self::new(file.products, file.stock)
    }

    /// All products in file order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// All stock levels in file order.
    #[must_use]
    pub fn stock(&self) -> &[Stock] {
        &self.stock
    }

    #[must_use]
    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.product_index
            .get(&id)
            .and_then(|&index| self.products.get(index))
    }

    #[must_use]
    pub fn stock_of(&self, id: ProductId) -> Option<Stock> {
        self.stock_index
            .get(&id)
            .and_then(|&index| self.stock.get(index))
            .copied()
    }
}

fn index_by_id(
    kind: &'static str,
    ids: impl Iterator<Item = ProductId>,
) -> Result<HashMap<ProductId, usize>, DbError> {
    let mut index = HashMap::new();
    for (position, id) in ids.enumerate() {
        if index.insert(id, position).is_some() {
            return Err(DbError::DuplicateId { kind, id });
        }
    }
    Ok(index)
}
