//! In-memory card catalog with id lookup, price resolution and filtered views.
//!
//! A [`CardCatalog`] is built once per session from the cached card list and
//! never mutated afterwards. Lookups that miss degrade to `None` / a zero
//! price so dependents keep working against [`CardCatalog::empty()`] when the
//! catalog could not be populated.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use crate::models::{Card, Supertype};

// ---------------------------------------------------------------------------
// CardCatalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct CardCatalog {
    cards: Vec<Card>,
    by_id: HashMap<String, usize>,
}

impl CardCatalog {
    /// Build a catalog, keeping the first card seen for a duplicated id.
    pub fn new(cards: Vec<Card>) -> Self {
        let mut by_id = HashMap::with_capacity(cards.len());
        let mut unique = Vec::with_capacity(cards.len());
        for card in cards {
            if by_id.contains_key(&card.id) {
                continue;
            }
            by_id.insert(card.id.clone(), unique.len());
            unique.push(card);
        }
        Self { cards: unique, by_id }
    }

    /// A catalog with no cards. Every lookup misses.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn lookup(&self, id: &str) -> Option<&Card> {
        self.by_id.get(id).and_then(|&i| self.cards.get(i))
    }

    /// Cards in the order the API returned them.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Price of one copy of the card with the given id.
    ///
    /// Returns 0 for basic energy, unknown ids, and cards without quotes.
    pub fn resolve_price(&self, id: &str, is_basic_energy: bool) -> f64 {
        if is_basic_energy {
            return 0.0;
        }
        self.lookup(id).map(Card::market_price).unwrap_or(0.0)
    }

    /// Return a filtered, sorted view. The catalog order is left untouched.
    pub fn search(&self, filter: &CardFilter, sort: CardSort) -> Vec<&Card> {
        let mut view: Vec<&Card> = self
            .cards
            .iter()
            .filter(|c| filter.matches(c, self.resolve_price(&c.id, false)))
            .collect();

        match sort {
            CardSort::Catalog => {}
            CardSort::PriceAsc => view.sort_by(|a, b| {
                cmp_f64(self.resolve_price(&a.id, false), self.resolve_price(&b.id, false))
            }),
            CardSort::PriceDesc => view.sort_by(|a, b| {
                cmp_f64(self.resolve_price(&b.id, false), self.resolve_price(&a.id, false))
            }),
            CardSort::Name => view.sort_by_cached_key(|c| c.name.to_lowercase()),
            CardSort::Set => view.sort_by_cached_key(|c| c.set.name.to_lowercase()),
            CardSort::Element => view.sort_by_cached_key(|c| primary_element(c)),
        }
        view
    }
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

fn primary_element(card: &Card) -> String {
    card.types.first().map(|t| t.to_lowercase()).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// CardFilter / CardSort
// ---------------------------------------------------------------------------

/// Catalog filter. Empty selections match everything.
#[derive(Debug, Clone, Default)]
pub struct CardFilter {
    pub supertypes: Vec<Supertype>,
    /// Element types, compared case-insensitively.
    pub elements: Vec<String>,
    /// Subtypes, compared case-insensitively. Selecting "item" matches items
    /// that are not Pokémon Tools.
    pub subtypes: Vec<String>,
    /// Set-name substring.
    pub set_name: Option<String>,
    /// Card-name substring.
    pub name: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl CardFilter {
    pub fn matches(&self, card: &Card, price: f64) -> bool {
        if !self.supertypes.is_empty() && !self.supertypes.contains(&card.supertype) {
            return false;
        }
        if !self.elements.is_empty() {
            let element = primary_element(card);
            if !self.elements.iter().any(|e| e.to_lowercase() == element) {
                return false;
            }
        }
        if !self.subtypes.is_empty() && !self.matches_subtypes(card) {
            return false;
        }
        if let Some(set) = &self.set_name {
            if !contains_ignore_case(&card.set.name, set) {
                return false;
            }
        }
        if let Some(name) = &self.name {
            if !contains_ignore_case(&card.name, name) {
                return false;
            }
        }
        if self.min_price.is_some_and(|min| price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| price > max) {
            return false;
        }
        true
    }

    fn matches_subtypes(&self, card: &Card) -> bool {
        if self.subtypes.iter().any(|s| s.eq_ignore_ascii_case("item")) {
            return card.has_subtype("item") && !card.has_subtype("pokémon tool");
        }
        self.subtypes.iter().any(|s| card.has_subtype(s))
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CardSort {
    /// Order the API returned.
    #[default]
    Catalog,
    PriceAsc,
    PriceDesc,
    Name,
    Set,
    Element,
}

impl CardSort {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "" | "catalog" => Some(CardSort::Catalog),
            "price-asc" => Some(CardSort::PriceAsc),
            "price-desc" => Some(CardSort::PriceDesc),
            "name" => Some(CardSort::Name),
            "set" => Some(CardSort::Set),
            "type" => Some(CardSort::Element),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// FetchSequence: stale-response detection for catalog fetches
// ---------------------------------------------------------------------------

/// Issues monotonically increasing tickets for catalog fetches.
///
/// A fetch result may be installed only while its ticket is still the most
/// recently issued one; anything older was superseded.
#[derive(Debug, Default)]
pub struct FetchSequence {
    latest: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

impl FetchSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new fetch, superseding every earlier ticket.
    pub fn begin(&self) -> FetchTicket {
        FetchTicket(self.latest.fetch_add(1, AtomicOrdering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        self.latest.load(AtomicOrdering::SeqCst) == ticket.0
    }
}
