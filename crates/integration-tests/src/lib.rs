//! Integration test support for the Rocketshoes cart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p rocketshoes-integration-tests
//! ```
//!
//! The tests need no external services: [`spawn_catalog`] serves the catalog
//! router on an ephemeral local port and storage lives under the system
//! temp directory.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use rocketshoes_cart::config::CatalogConfig;
use rocketshoes_catalog_server::{AppState, CatalogDb, router};
use tokio::task::JoinHandle;
use url::Url;

/// A catalog server running in the background for the duration of a test.
pub struct TestCatalog {
    pub addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl TestCatalog {
    /// Client configuration pointing at this server, with product caching off.
    ///
    /// # Panics
    ///
    /// Panics if the bound address does not form a valid URL.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn config(&self) -> CatalogConfig {
        CatalogConfig {
            base_url: Url::parse(&format!("http://{}", self.addr)).expect("valid catalog URL"),
            product_cache_ttl: Duration::ZERO,
        }
    }
}

impl Drop for TestCatalog {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Serve `db_json` (the `server.json` format) on `127.0.0.1:0`.
///
/// # Panics
///
/// Panics if the JSON is invalid or no local port can be bound.
#[allow(clippy::expect_used)]
pub async fn spawn_catalog(db_json: &str) -> TestCatalog {
    let db = CatalogDb::from_json(db_json).expect("valid catalog JSON");
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local address");

    let app = router(AppState::new(db));
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    TestCatalog { addr, handle }
}

/// A fresh storage file path under the system temp directory.
#[must_use]
pub fn temp_storage_path() -> PathBuf {
    std::env::temp_dir()
        .join(format!("rocketshoes-it-{}", uuid::Uuid::new_v4()))
        .join("storage.json")
}
