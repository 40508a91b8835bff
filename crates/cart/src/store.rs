//! The cart store.
//!
//! # Consistency
//!
//! Every accepted mutation builds a new [`Cart`] snapshot, writes it to
//! storage and only then publishes it. Persist and publish happen under one
//! lock, so readers never observe a cart that is not on disk.
//!
//! Async operations read a version-stamped snapshot, await the catalog and
//! then commit only if no other mutation landed in between. On a conflict the
//! operation starts over from the fresh snapshot, re-checking stock, so two
//! concurrent `add_product` calls for the same product cannot lose an update.

use std::sync::{Mutex, MutexGuard, PoisonError};

use rocketshoes_core::{Cart, CartItem, ProductId};
use tokio::sync::watch;
use tracing::{debug, info, instrument};

use crate::catalog::Catalog;
use crate::error::{CartError, CartOperation, Result};
use crate::notify::Notifier;
use crate::storage::{CartStorage, StorageError};

struct Snapshot {
    version: u64,
    cart: Cart,
}

/// Owns the shopper's cart and is the only writer of its storage key.
pub struct CartStore<C, S, N> {
    catalog: C,
    storage: S,
    notifier: N,
    key: String,
    state: Mutex<Snapshot>,
    published: watch::Sender<Cart>,
}

impl<C, S, N> CartStore<C, S, N>
where
    C: Catalog,
    S: CartStorage,
    N: Notifier,
{
    /// Load the cart stored under `key`, or start empty if there is none.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Storage` if storage cannot be read or the stored
    /// value is not a valid cart. The stored value is left untouched; use
    /// [`CartStore::reset`] to discard it.
    pub fn initialize(catalog: C, storage: S, notifier: N, key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        let cart = match storage.get(&key)? {
            Some(blob) => serde_json::from_str::<Cart>(&blob).map_err(|source| {
                StorageError::Corrupt {
                    key: key.clone(),
                    source,
                }
            })?,
            None => Cart::new(),
        };

        info!(key = %key, items = cart.len(), "Cart loaded");
        Ok(Self::with_cart(catalog, storage, notifier, key, cart))
    }

    /// Start with an empty cart, overwriting whatever is stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Storage` if the empty cart cannot be written.
    pub fn reset(catalog: C, storage: S, notifier: N, key: impl Into<String>) -> Result<Self> {
        let store = Self::with_cart(catalog, storage, notifier, key.into(), Cart::new());
        store.persist(&Cart::new())?;
        info!(key = %store.key, "Cart reset");
        Ok(store)
    }

    fn with_cart(catalog: C, storage: S, notifier: N, key: String, cart: Cart) -> Self {
        let (published, _) = watch::channel(cart.clone());
        Self {
            catalog,
            storage,
            notifier,
            key,
            state: Mutex::new(Snapshot { version: 0, cart }),
            published,
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Current cart snapshot.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.published.borrow().clone()
    }

    /// Observe every published cart snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.published.subscribe()
    }

    /// Storage key the cart is persisted under.
    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.key
    }

    // =========================================================================
    // Fire-and-forget API
    // =========================================================================

    /// Add one unit of a product. Failures are reported to the notifier.
    pub async fn add_product(&self, id: ProductId) {
        if let Err(err) = self.try_add_product(id).await {
            self.fail(CartOperation::AddProduct, &err);
        }
    }

    /// Remove a product's line item. Failures are reported to the notifier.
    pub fn remove_product(&self, id: ProductId) {
        if let Err(err) = self.try_remove_product(id) {
            self.fail(CartOperation::RemoveProduct, &err);
        }
    }

    /// Set a product's quantity. Failures are reported to the notifier.
    pub async fn update_product_amount(&self, id: ProductId, amount: i64) {
        if let Err(err) = self.try_update_product_amount(id, amount).await {
            self.fail(CartOperation::UpdateProductAmount, &err);
        }
    }

    /// Empty the cart. Failures are reported to the notifier.
    pub fn clear(&self) {
        if let Err(err) = self.try_clear() {
            self.fail(CartOperation::Clear, &err);
        }
    }

    fn fail(&self, operation: CartOperation, err: &CartError) {
        err.report(operation);
        self.notifier.notify(err.notification(operation));
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Add one unit of a product, fetching its catalog data on first add.
    ///
    /// # Errors
    ///
    /// - `OutOfStock` if one more unit would exceed the stock level
    /// - `Catalog` if the stock or product lookup fails
    /// - `Storage` if the new cart cannot be persisted
    #[instrument(skip(self), fields(key = %self.key))]
    pub async fn try_add_product(&self, id: ProductId) -> Result<Cart> {
        loop {
            let (version, mut cart) = self.snapshot();
            let current = cart.amount_of(id);

            let stock = self.catalog.stock(id).await?;
            let requested = current.saturating_add(1);
            if !stock.covers(requested) {
                return Err(CartError::OutOfStock {
                    product_id: id,
                    requested: u64::from(requested),
                    available: stock.amount,
                });
            }

            if current > 0 {
                cart.set_amount(id, requested);
            } else {
                let product = self.catalog.product(id).await?;
                cart.insert(CartItem::from_product(product, 1));
            }

            if let Some(cart) = self.commit_if_current(version, cart)? {
                info!(amount = requested, "Product added to cart");
                return Ok(cart);
            }
            debug!("Cart changed during catalog lookup, retrying");
        }
    }

    /// Remove a product's line item.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the product is not in the cart
    /// - `Storage` if the new cart cannot be persisted
    pub fn try_remove_product(&self, id: ProductId) -> Result<Cart> {
        let mut state = self.lock_state();
        let mut cart = state.cart.clone();
        if cart.remove(id).is_none() {
            return Err(CartError::NotFound(id));
        }

        let cart = self.apply(&mut state, cart)?;
        info!(product_id = %id, "Product removed from cart");
        Ok(cart)
    }

    /// Set a product's quantity to exactly `amount`.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount` is below 1
    /// - `NotFound` if the product is not in the cart
    /// - `OutOfStock` if `amount` exceeds the stock level
    /// - `Catalog` if the stock lookup fails
    /// - `Storage` if the new cart cannot be persisted
    #[instrument(skip(self), fields(key = %self.key))]
    pub async fn try_update_product_amount(&self, id: ProductId, amount: i64) -> Result<Cart> {
        if amount < 1 {
            return Err(CartError::InvalidAmount(amount));
        }

        loop {
            let (version, mut cart) = self.snapshot();
            if cart.get(id).is_none() {
                return Err(CartError::NotFound(id));
            }

            let stock = self.catalog.stock(id).await?;
            // Amounts beyond u32 exceed every stock level
            let requested = match u32::try_from(amount) {
                Ok(requested) if stock.covers(requested) => requested,
                _ => {
                    return Err(CartError::OutOfStock {
                        product_id: id,
                        requested: amount.unsigned_abs(),
                        available: stock.amount,
                    });
                }
            };

            cart.set_amount(id, requested);

            if let Some(cart) = self.commit_if_current(version, cart)? {
                info!(amount = requested, "Product amount updated");
                return Ok(cart);
            }
            debug!("Cart changed during stock lookup, retrying");
        }
    }

    /// Remove every line item.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the empty cart cannot be persisted.
    pub fn try_clear(&self) -> Result<Cart> {
        let mut state = self.lock_state();
        let cart = self.apply(&mut state, Cart::new())?;
        info!("Cart cleared");
        Ok(cart)
    }

    // =========================================================================
    // State Helpers
    // =========================================================================

    fn lock_state(&self) -> MutexGuard<'_, Snapshot> {
        // The snapshot is only replaced after a successful persist, so it is
        // consistent even if a holder panicked.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot(&self) -> (u64, Cart) {
        let state = self.lock_state();
        (state.version, state.cart.clone())
    }

    /// Persist and publish `cart` unless another mutation committed after
    /// `version` was read. Returns `None` on such a conflict.
    fn commit_if_current(&self, version: u64, cart: Cart) -> Result<Option<Cart>> {
        let mut state = self.lock_state();
        if state.version != version {
            return Ok(None);
        }
        self.apply(&mut state, cart).map(Some)
    }

    fn apply(&self, state: &mut Snapshot, cart: Cart) -> Result<Cart> {
        self.persist(&cart)?;
        state.version = state.version.wrapping_add(1);
        state.cart = cart.clone();
        self.published.send_replace(cart.clone());
        Ok(cart)
    }

    fn persist(&self, cart: &Cart) -> Result<()> {
        let blob = serde_json::to_string(cart).map_err(StorageError::from)?;
        self.storage.set(&self.key, &blob)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use rocketshoes_core::{Price, Product, Stock};

    use super::*;
    use crate::catalog::CatalogError;
    use crate::error::OUT_OF_STOCK_MESSAGE;
    use crate::notify::Notification;
    use crate::storage::MemoryStorage;

    const KEY: &str = "@RocketShoes:cart";

    // =========================================================================
    // Test Doubles
    // =========================================================================

    #[derive(Default)]
    struct FakeCatalog {
        products: Mutex<HashMap<ProductId, Product>>,
        stock: Mutex<HashMap<ProductId, u32>>,
        offline: AtomicBool,
        stock_calls: AtomicUsize,
        product_calls: AtomicUsize,
    }

    impl FakeCatalog {
        fn with_products(entries: &[(i64, u32)]) -> Arc<Self> {
            let catalog = Self::default();
            for &(id, stock) in entries {
                let id = ProductId::new(id);
                catalog.products.lock().unwrap().insert(
                    id,
                    Product {
                        id,
                        title: format!("Shoe {id}"),
                        price: Price::from_cents(10_000),
                        image: format!("https://example.com/{id}.jpg"),
                    },
                );
                catalog.stock.lock().unwrap().insert(id, stock);
            }
            Arc::new(catalog)
        }

        fn set_stock(&self, id: i64, amount: u32) {
            self.stock
                .lock()
                .unwrap()
                .insert(ProductId::new(id), amount);
        }

        fn unavailable(path: String) -> CatalogError {
            CatalogError::Status { status: 503, path }
        }
    }

    impl Catalog for FakeCatalog {
        async fn product(&self, id: ProductId) -> std::result::Result<Product, CatalogError> {
            // Suspend like a real network call so concurrent operations interleave
            tokio::task::yield_now().await;
            self.product_calls.fetch_add(1, Ordering::SeqCst);
            if self.offline.load(Ordering::SeqCst) {
                return Err(Self::unavailable(format!("/products/{id}")));
            }
            let product = self.products.lock().unwrap().get(&id).cloned();
            product.ok_or_else(|| CatalogError::Status {
                status: 404,
                path: format!("/products/{id}"),
            })
        }

        async fn stock(&self, id: ProductId) -> std::result::Result<Stock, CatalogError> {
            tokio::task::yield_now().await;
            self.stock_calls.fetch_add(1, Ordering::SeqCst);
            if self.offline.load(Ordering::SeqCst) {
                return Err(Self::unavailable(format!("/stock/{id}")));
            }
            let amount = self.stock.lock().unwrap().get(&id).copied();
            amount
                .map(|amount| Stock { id, amount })
                .ok_or_else(|| CatalogError::Status {
                    status: 404,
                    path: format!("/stock/{id}"),
                })
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        messages: Mutex<Vec<Notification>>,
    }

    impl RecordingNotifier {
        fn messages(&self) -> Vec<String> {
            self.messages
                .lock()
                .unwrap()
                .iter()
                .map(|n| n.message.clone())
                .collect()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notification: Notification) {
            self.messages.lock().unwrap().push(notification);
        }
    }

    type TestStore = CartStore<Arc<FakeCatalog>, Arc<MemoryStorage>, Arc<RecordingNotifier>>;

    struct Harness {
        store: TestStore,
        catalog: Arc<FakeCatalog>,
        storage: Arc<MemoryStorage>,
        notifier: Arc<RecordingNotifier>,
    }

    impl Harness {
        fn new(products: &[(i64, u32)]) -> Self {
            Self::with_storage(products, MemoryStorage::new())
        }

        fn with_storage(products: &[(i64, u32)], storage: MemoryStorage) -> Self {
            let catalog = FakeCatalog::with_products(products);
            let storage = Arc::new(storage);
            let notifier = Arc::new(RecordingNotifier::default());
            let store = CartStore::initialize(
                Arc::clone(&catalog),
                Arc::clone(&storage),
                Arc::clone(&notifier),
                KEY,
            )
            .unwrap();
            Self {
                store,
                catalog,
                storage,
                notifier,
            }
        }

        fn blob(&self) -> Option<String> {
            self.storage.get(KEY).unwrap()
        }

        fn persisted(&self) -> Cart {
            serde_json::from_str(&self.blob().unwrap()).unwrap()
        }

        fn amounts(&self) -> Vec<(i64, u32)> {
            self.store
                .cart()
                .items()
                .iter()
                .map(|item| (item.id.as_i64(), item.amount))
                .collect()
        }
    }

    fn id(value: i64) -> ProductId {
        ProductId::new(value)
    }

    // =========================================================================
    // Initialize
    // =========================================================================

    #[test]
    fn test_initialize_without_stored_value_is_empty() {
        let h = Harness::new(&[]);
        assert!(h.store.cart().is_empty());
        assert_eq!(h.blob(), None);
        assert_eq!(h.store.storage_key(), KEY);
    }

    #[test]
    fn test_initialize_restores_stored_cart() {
        let stored = r#"[{"id":2,"title":"Shoe 2","price":139.9,"image":"x.jpg","amount":3}]"#;
        let h = Harness::with_storage(&[], MemoryStorage::with_entry(KEY, stored));
        let cart = h.store.cart();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.amount_of(id(2)), 3);
        assert_eq!(cart.items()[0].price, Price::from_cents(13990));
    }

    #[test]
    fn test_initialize_fails_fast_on_corrupt_value() {
        let storage = Arc::new(MemoryStorage::with_entry(KEY, "{not a cart"));
        let result = CartStore::initialize(
            FakeCatalog::with_products(&[]),
            Arc::clone(&storage),
            RecordingNotifier::default(),
            KEY,
        );
        assert!(matches!(
            result,
            Err(CartError::Storage(StorageError::Corrupt { .. }))
        ));
        // Left intact for inspection
        assert_eq!(storage.get(KEY).unwrap().as_deref(), Some("{not a cart"));
    }

    #[test]
    fn test_initialize_rejects_stored_cart_breaking_item_rules() {
        let duplicate = r#"[
            {"id":1,"title":"Shoe 1","price":179.9,"image":"1.jpg","amount":1},
            {"id":1,"title":"Shoe 1","price":179.9,"image":"1.jpg","amount":2}
        ]"#;
        let zero = r#"[{"id":1,"title":"Shoe 1","price":179.9,"image":"1.jpg","amount":0}]"#;

        for stored in [duplicate, zero] {
            let storage = Arc::new(MemoryStorage::with_entry(KEY, stored));
            let result = CartStore::initialize(
                FakeCatalog::with_products(&[(1, 5)]),
                Arc::clone(&storage),
                RecordingNotifier::default(),
                KEY,
            );
            assert!(matches!(
                result,
                Err(CartError::Storage(StorageError::Corrupt { .. }))
            ));
            assert_eq!(storage.get(KEY).unwrap().as_deref(), Some(stored));
        }
    }

    #[test]
    fn test_reset_recovers_from_corrupt_value() {
        let storage = Arc::new(MemoryStorage::with_entry(KEY, "{not a cart"));
        let store = CartStore::reset(
            FakeCatalog::with_products(&[]),
            Arc::clone(&storage),
            RecordingNotifier::default(),
            KEY,
        )
        .unwrap();
        assert!(store.cart().is_empty());
        assert_eq!(storage.get(KEY).unwrap().as_deref(), Some("[]"));
    }

    // =========================================================================
    // Add Product
    // =========================================================================

    #[tokio::test]
    async fn test_add_new_product() {
        let h = Harness::new(&[(1, 5)]);
        h.store.add_product(id(1)).await;

        assert_eq!(h.amounts(), vec![(1, 1)]);
        assert_eq!(h.persisted(), h.store.cart());
        assert_eq!(
            h.blob().unwrap(),
            serde_json::to_string(&h.store.cart()).unwrap()
        );
        assert!(h.notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_add_existing_product_increments_only_that_item() {
        let h = Harness::new(&[(1, 5), (2, 5)]);
        h.store.add_product(id(1)).await;
        h.store.add_product(id(2)).await;
        h.store.add_product(id(1)).await;

        assert_eq!(h.amounts(), vec![(1, 2), (2, 1)]);
        // Catalog data is fetched once per new product only
        assert_eq!(h.catalog.product_calls.load(Ordering::SeqCst), 2);
        assert_eq!(h.persisted(), h.store.cart());
    }

    #[tokio::test]
    async fn test_add_beyond_stock_is_rejected() {
        let h = Harness::new(&[(1, 2)]);
        h.store.add_product(id(1)).await;
        h.store.add_product(id(1)).await;
        let before = h.blob();

        let err = h.store.try_add_product(id(1)).await.unwrap_err();
        assert!(matches!(
            err,
            CartError::OutOfStock {
                requested: 3,
                available: 2,
                ..
            }
        ));

        h.store.add_product(id(1)).await;
        assert_eq!(h.amounts(), vec![(1, 2)]);
        assert_eq!(h.blob(), before);
        assert_eq!(h.notifier.messages(), vec![OUT_OF_STOCK_MESSAGE]);
    }

    #[tokio::test]
    async fn test_add_with_zero_stock_never_persists() {
        let h = Harness::new(&[(1, 0)]);
        h.store.add_product(id(1)).await;

        assert!(h.store.cart().is_empty());
        assert_eq!(h.blob(), None);
        assert_eq!(h.catalog.product_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.notifier.messages(), vec![OUT_OF_STOCK_MESSAGE]);
    }

    #[tokio::test]
    async fn test_add_catalog_failure_leaves_cart_untouched() {
        let h = Harness::new(&[(1, 5)]);
        h.store.add_product(id(1)).await;
        let before = h.blob();

        h.catalog.offline.store(true, Ordering::SeqCst);
        h.store.add_product(id(1)).await;

        assert_eq!(h.amounts(), vec![(1, 1)]);
        assert_eq!(h.blob(), before);
        assert_eq!(h.notifier.messages(), vec!["Failed to add product"]);
    }

    #[tokio::test]
    async fn test_add_unknown_product_fails_generically() {
        let h = Harness::new(&[]);
        h.store.add_product(id(42)).await;

        assert!(h.store.cart().is_empty());
        assert_eq!(h.notifier.messages(), vec!["Failed to add product"]);
    }

    #[tokio::test]
    async fn test_concurrent_adds_do_not_lose_updates() {
        let h = Harness::new(&[(1, 5)]);
        tokio::join!(h.store.add_product(id(1)), h.store.add_product(id(1)));

        assert_eq!(h.amounts(), vec![(1, 2)]);
        assert_eq!(h.persisted(), h.store.cart());
        assert!(h.notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_adds_respect_stock() {
        let h = Harness::new(&[(1, 1)]);
        tokio::join!(h.store.add_product(id(1)), h.store.add_product(id(1)));

        assert_eq!(h.amounts(), vec![(1, 1)]);
        assert_eq!(h.notifier.messages(), vec![OUT_OF_STOCK_MESSAGE]);
    }

    // =========================================================================
    // Remove Product
    // =========================================================================

    #[tokio::test]
    async fn test_remove_present_product() {
        let h = Harness::new(&[(1, 5), (2, 5), (3, 5)]);
        for product in [1, 2, 3] {
            h.store.add_product(id(product)).await;
        }
        h.store.add_product(id(3)).await;

        h.store.remove_product(id(2));

        assert_eq!(h.amounts(), vec![(1, 1), (3, 2)]);
        assert_eq!(h.persisted(), h.store.cart());
        assert!(h.notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_remove_absent_product() {
        let h = Harness::new(&[(1, 5)]);
        h.store.add_product(id(1)).await;
        let before = h.blob();

        assert!(matches!(
            h.store.try_remove_product(id(7)),
            Err(CartError::NotFound(_))
        ));
        h.store.remove_product(id(7));

        assert_eq!(h.blob(), before);
        assert_eq!(h.amounts(), vec![(1, 1)]);
        assert_eq!(h.notifier.messages(), vec!["Failed to remove product"]);
    }

    // =========================================================================
    // Update Product Amount
    // =========================================================================

    #[tokio::test]
    async fn test_update_amount_within_stock() {
        let h = Harness::new(&[(1, 5), (2, 5)]);
        h.store.add_product(id(1)).await;
        h.store.add_product(id(2)).await;

        h.store.update_product_amount(id(1), 5).await;
        assert_eq!(h.amounts(), vec![(1, 5), (2, 1)]);

        h.store.update_product_amount(id(1), 2).await;
        assert_eq!(h.amounts(), vec![(1, 2), (2, 1)]);
        assert_eq!(h.persisted(), h.store.cart());
        assert!(h.notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_update_amount_beyond_stock() {
        let h = Harness::new(&[(1, 3)]);
        h.store.add_product(id(1)).await;
        let before = h.blob();

        h.store.update_product_amount(id(1), 4).await;

        assert_eq!(h.amounts(), vec![(1, 1)]);
        assert_eq!(h.blob(), before);
        assert_eq!(h.notifier.messages(), vec![OUT_OF_STOCK_MESSAGE]);
    }

    #[tokio::test]
    async fn test_update_amount_beyond_u32_is_out_of_stock() {
        let h = Harness::new(&[(1, 3)]);
        h.store.add_product(id(1)).await;
        let before = h.blob();
        let huge = i64::from(u32::MAX) + 1;

        assert!(matches!(
            h.store.try_update_product_amount(id(1), huge).await,
            Err(CartError::OutOfStock { requested, available: 3, .. }) if requested == huge.unsigned_abs()
        ));
        h.store.update_product_amount(id(1), huge).await;

        assert_eq!(h.amounts(), vec![(1, 1)]);
        assert_eq!(h.blob(), before);
        assert_eq!(h.notifier.messages(), vec![OUT_OF_STOCK_MESSAGE]);
    }

    #[tokio::test]
    async fn test_update_non_positive_amount_never_mutates() {
        let h = Harness::new(&[(1, 3)]);
        h.store.add_product(id(1)).await;
        let before = h.blob();
        let stock_calls = h.catalog.stock_calls.load(Ordering::SeqCst);

        for amount in [0, -1] {
            assert!(matches!(
                h.store.try_update_product_amount(id(1), amount).await,
                Err(CartError::InvalidAmount(_))
            ));
            h.store.update_product_amount(id(1), amount).await;
        }
        // Also for products that are not in the cart
        h.store.update_product_amount(id(9), 0).await;

        assert_eq!(h.blob(), before);
        assert_eq!(h.catalog.stock_calls.load(Ordering::SeqCst), stock_calls);
        assert_eq!(
            h.notifier.messages(),
            vec!["Failed to update product quantity"; 3]
        );
    }

    #[tokio::test]
    async fn test_update_absent_product() {
        let h = Harness::new(&[(1, 3)]);
        h.store.update_product_amount(id(1), 1).await;

        assert!(h.store.cart().is_empty());
        assert_eq!(h.blob(), None);
        assert_eq!(h.catalog.stock_calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            h.notifier.messages(),
            vec!["Failed to update product quantity"]
        );
    }

    #[tokio::test]
    async fn test_update_uses_live_stock() {
        let h = Harness::new(&[(1, 5)]);
        h.store.add_product(id(1)).await;
        h.catalog.set_stock(1, 1);

        h.store.update_product_amount(id(1), 2).await;

        assert_eq!(h.amounts(), vec![(1, 1)]);
        assert_eq!(h.notifier.messages(), vec![OUT_OF_STOCK_MESSAGE]);
    }

    #[tokio::test]
    async fn test_update_catalog_failure() {
        let h = Harness::new(&[(1, 5)]);
        h.store.add_product(id(1)).await;
        h.catalog.offline.store(true, Ordering::SeqCst);

        h.store.update_product_amount(id(1), 2).await;

        assert_eq!(h.amounts(), vec![(1, 1)]);
        assert_eq!(
            h.notifier.messages(),
            vec!["Failed to update product quantity"]
        );
    }

    // =========================================================================
    // Publish, Clear, Round Trip
    // =========================================================================

    #[tokio::test]
    async fn test_subscribers_see_published_snapshots() {
        let h = Harness::new(&[(1, 5)]);
        let mut rx = h.store.subscribe();

        h.store.add_product(id(1)).await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().amount_of(id(1)), 1);

        // Rejected operations publish nothing
        h.store.remove_product(id(9));
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_clear() {
        let h = Harness::new(&[(1, 5), (2, 5)]);
        h.store.add_product(id(1)).await;
        h.store.add_product(id(2)).await;

        h.store.clear();

        assert!(h.store.cart().is_empty());
        assert_eq!(h.blob().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_memory_matches_storage_after_every_operation() {
        let h = Harness::new(&[(1, 3), (2, 2), (3, 1)]);

        for product in [1, 2, 1, 3, 2, 3] {
            h.store.add_product(id(product)).await;
            assert_eq!(h.persisted(), h.store.cart());
        }
        h.store.update_product_amount(id(1), 3).await;
        assert_eq!(h.persisted(), h.store.cart());

        h.store.remove_product(id(2));
        assert_eq!(h.persisted(), h.store.cart());
        assert_eq!(h.amounts(), vec![(1, 3), (3, 1)]);

        // A fresh store over the same storage sees the same cart
        let reopened = CartStore::initialize(
            FakeCatalog::with_products(&[]),
            Arc::clone(&h.storage),
            RecordingNotifier::default(),
            KEY,
        )
        .unwrap();
        assert_eq!(reopened.cart(), h.store.cart());
    }
}
