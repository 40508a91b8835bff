//! Application state shared across handlers.

use std::sync::Arc;

use crate::db::CatalogDb;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    db: CatalogDb,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(db: CatalogDb) -> Self {
        Self {
            inner: Arc::new(AppStateInner { db }),
        }
    }

    /// Get a reference to the catalog database.
    #[must_use]
    pub fn db(&self) -> &CatalogDb {
        &self.inner.db
    }
}
