//! Async wrapper around [`DeckBuilder`] for use in async runtimes (Tokio, etc.).
//!
//! Runs all SDK operations on a blocking thread pool via
//! [`tokio::task::spawn_blocking`], keeping the async event loop free.
//! Catalog downloads use their own [`CacheManager`] so a slow fetch never
//! holds the store lock.
//!
//! # Example
//!
//! ```no_run
//! use ptcg_deckbuilder::DeckBuilder;
//!
//! #[tokio::main]
//! async fn main() {
//!     let sdk = DeckBuilder::builder().build_async().await.unwrap();
//!     sdk.refresh_catalog().await.unwrap();
//!
//!     let page = sdk
//!         .run(|s| s.community().list(&Default::default()))
//!         .await
//!         .unwrap();
//!     println!("{} public decks", page.total_count);
//! }
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tracing::{info, warn};

use crate::cache::CacheManager;
use crate::catalog::{CardCatalog, FetchSequence};
use crate::error::{DeckError, Result};
use crate::{DeckBuilder, DeckBuilderBuilder};

fn join_error(e: tokio::task::JoinError) -> DeckError {
    DeckError::Internal(format!("Task join error: {e}"))
}

impl DeckBuilderBuilder {
    /// Build an [`AsyncDeckBuilder`].
    ///
    /// Initialization runs on the blocking thread pool so it won't block
    /// the async event loop.
    pub async fn build_async(self) -> Result<AsyncDeckBuilder> {
        let config = self.config().clone();
        tokio::task::spawn_blocking(move || {
            let fetch_cache = config.cache_manager()?;
            let sdk = DeckBuilder::from_config(config)?;
            let (catalog_tx, _) = watch::channel(None);
            Ok(AsyncDeckBuilder {
                inner: Arc::new(Mutex::new(sdk)),
                cache: Arc::new(Mutex::new(fetch_cache)),
                fetches: Arc::new(FetchSequence::new()),
                catalog_tx: Arc::new(catalog_tx),
            })
        })
        .await
        .map_err(join_error)?
    }
}

// ---------------------------------------------------------------------------
// AsyncDeckBuilder
// ---------------------------------------------------------------------------

/// Async wrapper around [`DeckBuilder`].
///
/// All operations are dispatched to a blocking thread pool. The underlying
/// [`DeckBuilder`] is protected by a [`Mutex`] since it uses `RefCell`
/// internally, so store mutations are serialized. Cloning is cheap and
/// every clone shares the same store and catalog.
#[derive(Clone)]
pub struct AsyncDeckBuilder {
    inner: Arc<Mutex<DeckBuilder>>,
    cache: Arc<Mutex<CacheManager>>,
    fetches: Arc<FetchSequence>,
    catalog_tx: Arc<watch::Sender<Option<Arc<CardCatalog>>>>,
}

impl AsyncDeckBuilder {
    /// Run a sync SDK operation on the blocking thread pool.
    ///
    /// The closure receives an `&DeckBuilder` reference and should return
    /// a `Result<T>`.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&DeckBuilder) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let sdk = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            // A panicking operation must not lock every later caller out.
            let guard = sdk.lock().unwrap_or_else(PoisonError::into_inner);
            f(&guard)
        })
        .await
        .map_err(join_error)?
    }

    /// Load the catalog from cache or the API and install it.
    ///
    /// Returns `Ok(None)` when a newer refresh started while this one was
    /// running; the older result is discarded so it cannot overwrite a
    /// fresher catalog.
    pub async fn refresh_catalog(&self) -> Result<Option<Arc<CardCatalog>>> {
        let ticket = self.fetches.begin();
        let cache = self.cache.clone();
        let loaded = tokio::task::spawn_blocking(move || {
            let mut cache = cache.lock().unwrap_or_else(PoisonError::into_inner);
            cache.load_catalog()
        })
        .await
        .map_err(join_error)??;

        if !self.fetches.is_current(ticket) {
            warn!(?ticket, "discarding superseded catalog fetch");
            return Ok(None);
        }

        let catalog = Arc::new(loaded);
        self.install_catalog(Arc::clone(&catalog)).await?;
        info!(cards = catalog.len(), "installed card catalog");
        Ok(Some(catalog))
    }

    /// Install `catalog` and wake every [`wait_for_catalog`](Self::wait_for_catalog) caller.
    pub async fn install_catalog(&self, catalog: Arc<CardCatalog>) -> Result<()> {
        let for_sdk = Arc::clone(&catalog);
        self.run(move |s| {
            s.install_catalog(for_sdk);
            Ok(())
        })
        .await?;
        self.catalog_tx.send_replace(Some(catalog));
        Ok(())
    }

    /// The installed catalog, if one has been loaded.
    pub fn catalog(&self) -> Option<Arc<CardCatalog>> {
        self.catalog_tx.borrow().clone()
    }

    /// Resolve once a catalog is installed. Returns immediately if one
    /// already is.
    pub async fn wait_for_catalog(&self) -> Result<Arc<CardCatalog>> {
        let mut rx = self.catalog_tx.subscribe();
        let installed = rx
            .wait_for(Option::is_some)
            .await
            .map_err(|e| DeckError::Internal(format!("catalog channel closed: {e}")))?;
        installed
            .clone()
            .ok_or_else(|| DeckError::NotFound("card catalog".into()))
    }

    /// Catalog currently used for pricing, or an empty one.
    pub fn catalog_or_empty(&self) -> Arc<CardCatalog> {
        self.catalog()
            .unwrap_or_else(|| Arc::new(CardCatalog::empty()))
    }
}
