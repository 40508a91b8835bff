//! Remote catalog and stock service.
//!
//! # Architecture
//!
//! - [`Catalog`] is the seam the cart store depends on; tests substitute
//!   in-memory doubles for it
//! - [`CatalogClient`] talks to the real service over HTTP with `reqwest`
//! - Product lookups are cached via `moka`; stock is always fetched live
//!
//! # Endpoints
//!
//! - `GET /products/{id}` - product data (`id`, `title`, `price`, `image`)
//! - `GET /stock/{id}` - maximum purchasable quantity (`id`, `amount`)

mod client;

use std::future::Future;
use std::sync::Arc;

use rocketshoes_core::{Product, ProductId, Stock};
use thiserror::Error;

pub use client::CatalogClient;

/// Errors that can occur when talking to the catalog service.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("Catalog returned HTTP {status} for {path}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Request path.
        path: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configured base URL cannot have path segments appended.
    #[error("Invalid catalog base URL: {0}")]
    InvalidBaseUrl(String),
}

impl CatalogError {
    /// Whether the service reported that the resource does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

/// Read access to product data and live stock levels.
pub trait Catalog: Send + Sync {
    /// Fetch product data for `id`.
    fn product(&self, id: ProductId) -> impl Future<Output = Result<Product, CatalogError>> + Send;

    /// Fetch the current stock level for `id`.
    fn stock(&self, id: ProductId) -> impl Future<Output = Result<Stock, CatalogError>> + Send;
}

impl<C: Catalog> Catalog for Arc<C> {
    fn product(&self, id: ProductId) -> impl Future<Output = Result<Product, CatalogError>> + Send {
        (**self).product(id)
    }

    fn stock(&self, id: ProductId) -> impl Future<Output = Result<Stock, CatalogError>> + Send {
        (**self).stock(id)
    }
}
