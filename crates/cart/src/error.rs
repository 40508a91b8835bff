//! Cart error taxonomy and its mapping to shopper notifications.
//!
//! Operations return `Result<_, CartError>` internally. The fire-and-forget
//! store API converts each error into a [`Notification`] via
//! [`CartError::notification`] and reports infrastructure failures to Sentry.

use core::fmt;

use rocketshoes_core::ProductId;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::notify::Notification;
use crate::storage::StorageError;

/// Shown whenever the requested quantity exceeds available stock.
pub const OUT_OF_STOCK_MESSAGE: &str = "Requested quantity is out of stock";

/// The store operation an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CartOperation {
    AddProduct,
    RemoveProduct,
    UpdateProductAmount,
    Clear,
}

impl CartOperation {
    /// Generic failure message for this operation.
    #[must_use]
    pub const fn failure_message(self) -> &'static str {
        match self {
            Self::AddProduct => "Failed to add product",
            Self::RemoveProduct => "Failed to remove product",
            Self::UpdateProductAmount => "Failed to update product quantity",
            Self::Clear => "Failed to clear cart",
        }
    }
}

impl fmt::Display for CartOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AddProduct => "add_product",
            Self::RemoveProduct => "remove_product",
            Self::UpdateProductAmount => "update_product_amount",
            Self::Clear => "clear",
        };
        f.write_str(name)
    }
}

/// Errors produced by cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Requested quantity exceeds available stock.
    #[error("Product {product_id} out of stock: requested {requested}, available {available}")]
    OutOfStock {
        product_id: ProductId,
        requested: u64,
        available: u32,
    },

    /// The product is not in the cart.
    #[error("Product {0} is not in the cart")]
    NotFound(ProductId),

    /// Requested quantity is below 1.
    #[error("Invalid amount {0}: must be at least 1")]
    InvalidAmount(i64),

    /// Catalog/stock service failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Local persistence failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl CartError {
    /// Whether this is an infrastructure failure rather than an expected
    /// rejection of the shopper's request.
    #[must_use]
    pub const fn is_infrastructure(&self) -> bool {
        matches!(self, Self::Catalog(_) | Self::Storage(_))
    }

    /// The notification to show the shopper when `operation` fails with this
    /// error.
    ///
    /// Out-of-stock has its own message; everything else collapses to the
    /// operation's generic failure message.
    #[must_use]
    pub fn notification(&self, operation: CartOperation) -> Notification {
        match self {
            Self::OutOfStock { .. } => Notification::error(OUT_OF_STOCK_MESSAGE),
            _ => Notification::error(operation.failure_message()),
        }
    }

    /// Log the error and capture infrastructure failures to Sentry.
    pub fn report(&self, operation: CartOperation) {
        if self.is_infrastructure() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                %operation,
                sentry_event_id = %event_id,
                "Cart operation failed"
            );
        } else {
            tracing::warn!(error = %self, %operation, "Cart operation rejected");
        }
    }
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;
