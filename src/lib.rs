//! Pokémon TCG deck building core.
//!
//! Provides a card catalog downloaded from the pokemontcg.io API and cached
//! locally, a legality-checked deck model with live pricing, and DuckDB-backed
//! storage for user accounts, saved decks and community votes.
//!
//! # Quick start
//!
//! ```no_run
//! use ptcg_deckbuilder::{DeckBuilder, DeckEditor};
//!
//! let sdk = DeckBuilder::builder().offline(true).build().unwrap();
//! let catalog = sdk.load_catalog().unwrap();
//!
//! let mut editor = DeckEditor::new(catalog);
//! editor.add("sv3pt5-7").unwrap();
//! println!("{} cards, ${:.2}", editor.summary().total_count, editor.summary().total_price);
//! ```

#[cfg(feature = "async")]
pub mod async_client;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod connection;
pub mod deck;
pub mod error;
pub mod models;
pub mod queries;
pub mod sql_builder;

#[cfg(feature = "async")]
pub use async_client::AsyncDeckBuilder;
pub use cache::CacheManager;
pub use catalog::{CardCatalog, CardFilter, CardSort, FetchSequence, FetchTicket};
pub use connection::Connection;
pub use deck::{Deck, DeckEditor, DeckRules, EntryKey, Rejection};
pub use error::{DeckError, ErrorKind, Result};
pub use sql_builder::{escape_like, SqlBuilder, SqlParam};

use std::cell::RefCell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

// ---------------------------------------------------------------------------
// DeckBuilderConfig
// ---------------------------------------------------------------------------

/// Resolved settings shared by the sync and async builders.
#[derive(Debug, Clone)]
pub struct DeckBuilderConfig {
    /// DuckDB file; `None` keeps everything in memory.
    pub database: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
    pub offline: bool,
    pub timeout: Duration,
    pub api_key: Option<String>,
    /// Set names to fetch; `None` uses the Standard-format list.
    pub catalog_sets: Option<Vec<String>>,
    pub catalog_max_age: Duration,
}

impl Default for DeckBuilderConfig {
    fn default() -> Self {
        Self {
            database: None,
            cache_dir: None,
            offline: false,
            timeout: Duration::from_secs(30),
            api_key: None,
            catalog_sets: None,
            catalog_max_age: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl DeckBuilderConfig {
    pub(crate) fn cache_manager(&self) -> Result<CacheManager> {
        let mut cache = CacheManager::new(self.cache_dir.clone(), self.offline, self.timeout)?
            .with_api_key(self.api_key.clone())
            .with_max_age(self.catalog_max_age);
        if let Some(sets) = &self.catalog_sets {
            cache = cache.with_sets(sets.clone());
        }
        Ok(cache)
    }
}

// ---------------------------------------------------------------------------
// DeckBuilderBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`DeckBuilder`] instance.
///
/// Use [`DeckBuilder::builder()`] to obtain a builder, chain configuration
/// methods, and call [`build()`](DeckBuilderBuilder::build).
#[derive(Default)]
pub struct DeckBuilderBuilder {
    config: DeckBuilderConfig,
}

impl DeckBuilderBuilder {
    /// Persist to a DuckDB file instead of an in-memory database.
    pub fn database<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config.database = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set a custom cache directory for the card catalog.
    ///
    /// If not set, the platform-appropriate default cache directory is used
    /// (e.g. `~/.cache/ptcg-deckbuilder` on Linux).
    pub fn cache_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config.cache_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// When offline, the catalog is never downloaded; only a previously
    /// cached copy is used. Defaults to `false`.
    pub fn offline(mut self, offline: bool) -> Self {
        self.config.offline = offline;
        self
    }

    /// HTTP request timeout for catalog downloads. Defaults to 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// pokemontcg.io API key, sent as `X-Api-Key`.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    /// Set names to include in the catalog.
    pub fn catalog_sets<I, S>(mut self, sets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.catalog_sets = Some(sets.into_iter().map(Into::into).collect());
        self
    }

    /// Re-download the catalog once the cached copy is older than this.
    /// Defaults to 24 hours.
    pub fn catalog_max_age(mut self, max_age: Duration) -> Self {
        self.config.catalog_max_age = max_age;
        self
    }

    pub fn config(&self) -> &DeckBuilderConfig {
        &self.config
    }

    /// Open the database and prepare the cache. Nothing is downloaded until
    /// [`DeckBuilder::load_catalog`] is called.
    pub fn build(self) -> Result<DeckBuilder> {
        DeckBuilder::from_config(self.config)
    }
}

// ---------------------------------------------------------------------------
// DeckBuilder
// ---------------------------------------------------------------------------

/// The main entry point.
///
/// Owns the DuckDB [`Connection`], the [`CacheManager`] and the installed
/// [`CardCatalog`], and exposes query interfaces as lightweight borrowing
/// wrappers. Until a catalog is loaded, an empty one is installed and every
/// price resolves to zero.
pub struct DeckBuilder {
    conn: Connection,
    cache: RefCell<CacheManager>,
    catalog: RefCell<Arc<CardCatalog>>,
}

impl DeckBuilder {
    /// Create a new builder for configuring the SDK.
    pub fn builder() -> DeckBuilderBuilder {
        DeckBuilderBuilder::default()
    }

    pub fn from_config(config: DeckBuilderConfig) -> Result<Self> {
        let cache = config.cache_manager()?;
        let conn = Connection::open(config.database.as_deref())?;
        Ok(Self {
            conn,
            cache: RefCell::new(cache),
            catalog: RefCell::new(Arc::new(CardCatalog::empty())),
        })
    }

    // -- Query accessors ---------------------------------------------------

    /// Owned-deck persistence.
    pub fn decks(&self) -> queries::decks::DeckQuery<'_> {
        queries::decks::DeckQuery::new(&self.conn, self.catalog())
    }

    /// Public deck listing, votes and copies.
    pub fn community(&self) -> queries::community::CommunityQuery<'_> {
        queries::community::CommunityQuery::new(&self.conn, self.catalog())
    }

    /// User accounts.
    pub fn users(&self) -> queries::users::UserQuery<'_> {
        queries::users::UserQuery::new(&self.conn)
    }

    // -- Catalog -----------------------------------------------------------

    /// The installed catalog (empty until one is loaded).
    pub fn catalog(&self) -> Arc<CardCatalog> {
        Arc::clone(&self.catalog.borrow())
    }

    /// Load the catalog from cache or the API and install it.
    pub fn load_catalog(&self) -> Result<Arc<CardCatalog>> {
        let catalog = Arc::new(self.cache.borrow_mut().load_catalog()?);
        self.install_catalog(Arc::clone(&catalog));
        Ok(catalog)
    }

    /// Replace the installed catalog.
    pub fn install_catalog(&self, catalog: Arc<CardCatalog>) {
        *self.catalog.borrow_mut() = catalog;
    }

    /// Drop the cached catalog file so the next load downloads a fresh copy.
    pub fn clear_cache(&self) -> Result<()> {
        self.cache.borrow().clear()
    }

    /// Return a reference to the underlying [`Connection`] for advanced usage.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for DeckBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cache = self.cache.borrow();
        write!(
            f,
            "DeckBuilder(cache_dir={}, cards={}, offline={})",
            cache.cache_dir.display(),
            self.catalog.borrow().len(),
            cache.offline
        )
    }
}
