//! Cart commands.
//!
//! Each command opens the file-backed cart, runs one store operation through
//! the fire-and-forget API and prints the resulting cart. A rejected
//! operation is reported by the notifier and turns into a non-zero exit code.

use std::fmt::Write as _;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rocketshoes_cart::{
    CartConfig, CartError, CartStore, CatalogClient, FileStorage, LogNotifier, Notification,
    NotificationLevel, Notifier, StorageError,
};
use rocketshoes_core::{Cart, ProductId};
use thiserror::Error;

type Store = CartStore<CatalogClient, FileStorage, Arc<ExitNotifier>>;

/// Errors that end a command with a non-zero exit code.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The stored cart could not be read.
    #[error("Could not load cart: {0}. Run `rs-cli clear` to start over")]
    Load(#[source] CartError),

    /// The stored cart could not be replaced with an empty one.
    #[error("Could not reset cart: {0}")]
    Reset(#[source] CartError),

    /// The store rejected the operation; the notifier already said why.
    #[error("Cart was not changed")]
    Rejected,

    /// JSON output failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Logs notifications and remembers whether any of them was an error.
#[derive(Debug, Default)]
pub struct ExitNotifier {
    failed: AtomicBool,
}

impl ExitNotifier {
    fn failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }
}

impl Notifier for ExitNotifier {
    fn notify(&self, notification: Notification) {
        if notification.level == NotificationLevel::Error {
            self.failed.store(true, Ordering::SeqCst);
        }
        LogNotifier.notify(notification);
    }
}

fn open(config: &CartConfig) -> Result<(Store, Arc<ExitNotifier>), CommandError> {
    let notifier = Arc::new(ExitNotifier::default());
    let storage = FileStorage::new(&config.storage.path);
    tracing::debug!(path = %storage.path().display(), "Opening cart");
    let store = CartStore::initialize(
        CatalogClient::new(&config.catalog),
        storage,
        Arc::clone(&notifier),
        config.storage.key.clone(),
    )
    .map_err(CommandError::Load)?;
    Ok((store, notifier))
}

fn finish(store: &Store, notifier: &ExitNotifier) -> Result<(), CommandError> {
    print(&render(&store.cart()));
    if notifier.failed() {
        return Err(CommandError::Rejected);
    }
    Ok(())
}

/// Print the cart as a table or as its stored JSON.
pub fn show(config: &CartConfig, json: bool) -> Result<(), CommandError> {
    let (store, _) = open(config)?;
    if json {
        print(&serde_json::to_string_pretty(&store.cart())?);
    } else {
        print(&render(&store.cart()));
    }
    Ok(())
}

pub async fn add(config: &CartConfig, id: ProductId) -> Result<(), CommandError> {
    let (store, notifier) = open(config)?;
    store.add_product(id).await;
    finish(&store, &notifier)
}

pub fn remove(config: &CartConfig, id: ProductId) -> Result<(), CommandError> {
    let (store, notifier) = open(config)?;
    store.remove_product(id);
    finish(&store, &notifier)
}

pub async fn update(config: &CartConfig, id: ProductId, amount: i64) -> Result<(), CommandError> {
    let (store, notifier) = open(config)?;
    store.update_product_amount(id, amount).await;
    finish(&store, &notifier)
}

/// Empty the cart. A corrupt storage value is replaced instead of read.
pub fn clear(config: &CartConfig) -> Result<(), CommandError> {
    match open(config) {
        Ok((store, notifier)) => {
            store.clear();
            finish(&store, &notifier)
        }
        Err(CommandError::Load(CartError::Storage(StorageError::Corrupt { key, .. }))) => {
            tracing::warn!(key = %key, "Stored cart is corrupt, replacing it");
            let notifier = Arc::new(ExitNotifier::default());
            let store = CartStore::reset(
                CatalogClient::new(&config.catalog),
                FileStorage::new(&config.storage.path),
                Arc::clone(&notifier),
                config.storage.key.clone(),
            )
            .map_err(CommandError::Reset)?;
            finish(&store, &notifier)
        }
        Err(err) => Err(err),
    }
}

#[allow(clippy::print_stdout)]
fn print(text: &str) {
    println!("{text}");
}

/// Render the cart as a plain-text table.
fn render(cart: &Cart) -> String {
    if cart.is_empty() {
        return "Cart is empty".to_string();
    }

    let title_width = cart
        .items()
        .iter()
        .map(|item| item.title.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for item in cart {
        let _ = writeln!(
            out,
            "#{:<4} {:<title_width$}  {:>3} x {:>10}  {:>10}",
            item.id.to_string(),
            item.title,
            item.amount,
            item.price.to_string(),
            item.line_total().to_string(),
        );
    }
    let _ = write!(
        out,
        "Items: {}  Subtotal: {}",
        cart.item_count(),
        cart.subtotal()
    );
    out
}
