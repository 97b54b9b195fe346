//! Card catalog download and local file cache.
//!
//! Fetches every configured set from the pokemontcg.io card API and keeps the
//! combined list as a gzip-compressed JSON file in the cache directory. The
//! cached copy is reused until it is older than the configured maximum age.

use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::catalog::CardCatalog;
use crate::config;
use crate::error::{DeckError, Result};
use crate::models::Card;

/// One page of the `/cards` endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CardPage {
    #[serde(default)]
    data: Vec<Card>,
    #[serde(default)]
    total_count: usize,
}

/// Downloads and caches the card catalog.
pub struct CacheManager {
    /// Directory where cached files are stored.
    pub cache_dir: PathBuf,
    /// If true, never download (use cached files only).
    pub offline: bool,
    timeout: Duration,
    api_key: Option<String>,
    sets: Vec<String>,
    max_age: Duration,
    client: Option<Client>,
}

impl CacheManager {
    /// Create a new cache manager.
    ///
    /// If `cache_dir` is `None`, uses the platform-appropriate default cache directory.
    /// Creates the cache directory if it does not exist.
    pub fn new(cache_dir: Option<PathBuf>, offline: bool, timeout: Duration) -> Result<Self> {
        let dir = cache_dir.unwrap_or_else(config::default_cache_dir);
        fs::create_dir_all(&dir)?;
        Ok(Self {
            cache_dir: dir,
            offline,
            timeout,
            api_key: None,
            sets: config::standard_sets().into_iter().map(String::from).collect(),
            max_age: Duration::from_secs(24 * 60 * 60),
            client: None,
        })
    }

    /// Send `X-Api-Key` with every request.
    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key.filter(|k| !k.is_empty());
        self
    }

    /// Replace the list of set names to fetch.
    pub fn with_sets(mut self, sets: Vec<String>) -> Self {
        self.sets = sets;
        self
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn sets(&self) -> &[String] {
        &self.sets
    }

    /// Lazy HTTP client, created on first use.
    fn client(&mut self) -> Result<Client> {
        if let Some(client) = &self.client {
            return Ok(client.clone());
        }
        let client = Client::builder()
            .timeout(self.timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        self.client = Some(client.clone());
        Ok(client)
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.cache_dir.join(config::CATALOG_FILE)
    }

    fn stamp_path(&self) -> PathBuf {
        self.cache_dir.join(config::CATALOG_STAMP_FILE)
    }

    /// When the cached catalog was written, if known.
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        let raw = fs::read_to_string(self.stamp_path()).ok()?;
        DateTime::parse_from_rfc3339(raw.trim())
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    /// True when there is no cached catalog or it is older than the maximum age.
    pub fn is_stale(&self) -> bool {
        if !self.catalog_path().exists() {
            return true;
        }
        match self.fetched_at() {
            None => true,
            Some(at) => {
                let age = Utc::now().signed_duration_since(at);
                age.to_std().map(|a| a > self.max_age).unwrap_or(false)
            }
        }
    }

    /// Download every configured set, in batches of set names per query,
    /// following pagination until each batch's `totalCount` is reached.
    pub fn fetch_cards(&mut self) -> Result<Vec<Card>> {
        if self.offline {
            return Err(DeckError::NotFound(
                "card catalog cannot be fetched in offline mode".into(),
            ));
        }
        let client = self.client()?;
        let mut cards = Vec::new();

        for batch in self.sets.chunks(config::SET_BATCH_SIZE) {
            let q = set_query(batch);
            let mut page = 1usize;
            let mut seen = 0usize;
            loop {
                debug!(query = %q, page, "fetching card page");
                let mut req = client.get(config::CARDS_URL).query(&[
                    ("q", q.clone()),
                    ("page", page.to_string()),
                    ("pageSize", config::API_PAGE_SIZE.to_string()),
                ]);
                if let Some(key) = &self.api_key {
                    req = req.header(config::API_KEY_HEADER, key);
                }
                let body: CardPage = req.send()?.error_for_status()?.json()?;
                let received = body.data.len();
                seen += received;
                cards.extend(body.data);
                if received == 0 || seen >= body.total_count {
                    break;
                }
                page += 1;
            }
        }

        info!(cards = cards.len(), sets = self.sets.len(), "downloaded card catalog");
        Ok(cards)
    }

    /// Write `cards` to the cache, replacing any previous catalog.
    ///
    /// Writes to a temp file first and renames on success, so an interrupted
    /// write never leaves a partial catalog behind.
    pub fn store_catalog(&self, cards: &[Card]) -> Result<()> {
        let dest = self.catalog_path();
        let tmp_dest = dest.with_extension("gz.tmp");

        let result = (|| -> Result<()> {
            let file = fs::File::create(&tmp_dest)?;
            let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
            serde_json::to_writer(&mut encoder, cards)?;
            encoder.finish()?.flush()?;
            fs::rename(&tmp_dest, &dest)?;
            Ok(())
        })();

        if result.is_err() {
            let _ = fs::remove_file(&tmp_dest);
            return result;
        }

        fs::write(self.stamp_path(), Utc::now().to_rfc3339())?;
        Ok(())
    }

    /// Ensure a usable catalog file exists, downloading when missing or stale.
    ///
    /// A failed refresh falls back to a stale cached copy when one exists.
    pub fn ensure_catalog(&mut self) -> Result<PathBuf> {
        let path = self.catalog_path();
        if !self.is_stale() {
            debug!(path = %path.display(), "using cached card catalog");
            return Ok(path);
        }
        if self.offline {
            if path.exists() {
                return Ok(path);
            }
            return Err(DeckError::NotFound(
                "card catalog not cached and offline mode is enabled".into(),
            ));
        }

        match self.fetch_cards() {
            Ok(cards) => {
                self.store_catalog(&cards)?;
                Ok(path)
            }
            Err(e) if path.exists() => {
                warn!(error = %e, "catalog refresh failed; using stale copy");
                Ok(path)
            }
            Err(e) => Err(e),
        }
    }

    /// Load the catalog, downloading it first if needed.
    ///
    /// If the cached file is corrupt (truncated download, disk error),
    /// it is deleted automatically so the next call re-downloads a fresh copy.
    pub fn load_catalog(&mut self) -> Result<CardCatalog> {
        let path = self.ensure_catalog()?;
        match read_gz_cards(&path) {
            Ok(cards) => Ok(CardCatalog::new(cards)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupt catalog cache; removing");
                let _ = fs::remove_file(&path);
                let _ = fs::remove_file(self.stamp_path());
                Err(DeckError::NotFound(format!(
                    "Cache file '{}' was corrupt and has been removed. \
                     Retry to re-download. Original error: {}",
                    config::CATALOG_FILE,
                    e
                )))
            }
        }
    }

    /// Remove all cached files and recreate the cache directory.
    pub fn clear(&self) -> Result<()> {
        if self.cache_dir.exists() {
            fs::remove_dir_all(&self.cache_dir)?;
            fs::create_dir_all(&self.cache_dir)?;
        }
        Ok(())
    }

    /// Close the HTTP client, if open.
    pub fn close(&mut self) {
        self.client = None;
    }
}

/// `(set.name:"A" OR set.name:"B")`
fn set_query(sets: &[String]) -> String {
    let parts: Vec<String> = sets
        .iter()
        .map(|s| format!("set.name:\"{}\"", s))
        .collect();
    format!("({})", parts.join(" OR "))
}

fn read_gz_cards(path: &Path) -> Result<Vec<Card>> {
    let file = fs::File::open(path)?;
    let decoder = GzDecoder::new(BufReader::new(file));
    Ok(serde_json::from_reader(BufReader::new(decoder))?)
}
