//! Rocketshoes catalog server library.
//!
//! Serves product data and stock levels from a JSON file, in the same shape
//! as the remote catalog API the cart talks to. Exposed as a library so
//! integration tests can mount the router on an ephemeral port.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod state;

pub use config::CatalogServerConfig;
pub use db::CatalogDb;
pub use routes::router;
pub use state::AppState;
