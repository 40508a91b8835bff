//! Rocketshoes cart library.
//!
//! The [`store::CartStore`] owns the shopper's cart. It checks every change
//! against live stock from a [`catalog::Catalog`], mirrors each accepted
//! snapshot into a [`storage::CartStorage`] and reports failures through a
//! [`notify::Notifier`] instead of returning them to the UI.
//!
//! # Example
//!
//! ```rust,ignore
//! use rocketshoes_cart::{CartConfig, CartStore, CatalogClient, FileStorage, LogNotifier};
//!
//! let config = CartConfig::from_env()?;
//! let store = CartStore::initialize(
//!     CatalogClient::new(&config.catalog),
//!     FileStorage::new(&config.storage.path),
//!     LogNotifier,
//!     config.storage.key.clone(),
//! )?;
//!
//! store.add_product(ProductId::new(1)).await;
//! println!("{} items", store.cart().item_count());
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod error;
pub mod notify;
pub mod storage;
pub mod store;

pub use catalog::{Catalog, CatalogClient, CatalogError};
pub use config::{CartConfig, ConfigError};
pub use error::{CartError, CartOperation};
pub use notify::{BroadcastNotifier, LogNotifier, Notification, NotificationLevel, Notifier};
pub use storage::{CartStorage, FileStorage, MemoryStorage, StorageError};
pub use store::CartStore;
