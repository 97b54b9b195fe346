use std::path::PathBuf;

pub const API_BASE: &str = "https://api.pokemontcg.io/v2";
pub const CARDS_URL: &str = "https://api.pokemontcg.io/v2/cards";

/// Header carrying the pokemontcg.io API key.
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Page size requested from the card API (the API maximum).
pub const API_PAGE_SIZE: usize = 250;

/// Number of sets combined into one OR-query.
pub const SET_BATCH_SIZE: usize = 3;

/// Cached catalog file name inside the cache directory.
pub const CATALOG_FILE: &str = "cards.json.gz";

/// Timestamp file recording when the catalog was last fetched.
pub const CATALOG_STAMP_FILE: &str = "fetched_at.txt";

pub const MAX_DECK_SIZE: u32 = 60;
pub const MAX_COPIES_PER_NAME: u32 = 4;
pub const MAX_KEY_CARDS: usize = 5;

pub const DEFAULT_DECK_NAME: &str = "Unnamed Deck";
pub const COPY_SUFFIX: &str = "(Copy)";

pub const ACE_SPEC_MARKER: &str = "ACE SPEC";
pub const RADIANT_MARKER: &str = "Radiant";

pub const DEFAULT_PER_PAGE: usize = 10;
pub const MAX_PER_PAGE: usize = 100;
/// Highest page number a community listing accepts.
pub const MAX_PAGE: usize = 1_000_000;

/// Sets fetched when no explicit set list is configured.
pub fn standard_sets() -> Vec<&'static str> {
    vec![
        "Scarlet & Violet",
        "Brilliant Stars",
        "Astral Radiance",
        "Pokemon Go",
        "Lost Origin",
        "Silver Tempest",
        "Crown Zenith",
        "Paldea Evolved",
        "Obsidian Flames",
        "151",
        "Paradox Rift",
        "Paldean Fates",
        "Temporal Forces",
    ]
}

pub fn default_cache_dir() -> PathBuf {
    if let Some(cache) = dirs::cache_dir() {
        cache.join("ptcg-deckbuilder")
    } else {
        PathBuf::from(".ptcg-deckbuilder-cache")
    }
}
