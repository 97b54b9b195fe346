//! The deck under construction.
//!
//! A [`Deck`] owns its entries and derived flags; every add goes through
//! [`legality::can_add`](super::legality::can_add). [`DeckEditor`] pairs a
//! deck with the catalog and keeps the displayed count and price in step
//! with each mutation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::catalog::CardCatalog;
use crate::models::{Card, DeckSummary, PriceLine, SavedCard, Supertype};

use super::legality::{self, DeckRules, Rejection};
use super::pricing;

// ---------------------------------------------------------------------------
// EntryKey / DeckEntry
// ---------------------------------------------------------------------------

/// Two prints of the same name in different sets are distinct entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryKey {
    pub name: String,
    pub set: String,
}

impl EntryKey {
    pub fn new(name: impl Into<String>, set: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            set: set.into(),
        }
    }

    pub fn of(card: &Card) -> Self {
        Self::new(card.name.clone(), card.set.name.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckEntry {
    pub card_id: String,
    pub name: String,
    pub set_name: String,
    pub set_code: String,
    pub number: String,
    pub supertype: Supertype,
    pub rarity: Option<String>,
    pub basic_energy: bool,
    pub ace_spec: bool,
    pub radiant: bool,
    pub count: u32,
}

impl DeckEntry {
    fn from_card(card: &Card) -> Self {
        Self {
            card_id: card.id.clone(),
            name: card.name.clone(),
            set_name: card.set.name.clone(),
            set_code: card.set_code().to_string(),
            number: card.number.clone(),
            supertype: card.supertype,
            rarity: card.rarity.clone(),
            basic_energy: card.is_basic_energy(),
            ace_spec: card.is_ace_spec(),
            radiant: card.is_radiant(),
            count: 0,
        }
    }

    pub fn key(&self) -> EntryKey {
        EntryKey::new(self.name.clone(), self.set_name.clone())
    }

    fn matches(&self, key: &EntryKey) -> bool {
        self.name == key.name && self.set_name == key.set
    }

    pub fn to_saved(&self) -> SavedCard {
        SavedCard {
            id: self.card_id.clone(),
            name: self.name.clone(),
            set: self.set_name.clone(),
            count: self.count,
            set_code: Some(self.set_code.clone()),
            number: Some(self.number.clone()),
            supertype: Some(self.supertype),
        }
    }
}

// ---------------------------------------------------------------------------
// Deck
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Deck {
    entries: Vec<DeckEntry>,
    total_count: u32,
    has_ace_spec: bool,
    has_radiant: bool,
    rules: DeckRules,
}

impl Default for Deck {
    fn default() -> Self {
        Self::with_rules(DeckRules::default())
    }
}

impl Deck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: DeckRules) -> Self {
        Self {
            entries: Vec::new(),
            total_count: 0,
            has_ace_spec: false,
            has_radiant: false,
            rules,
        }
    }

    pub fn rules(&self) -> DeckRules {
        self.rules
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[DeckEntry] {
        &self.entries
    }

    pub fn entry(&self, key: &EntryKey) -> Option<&DeckEntry> {
        self.entries.iter().find(|e| e.matches(key))
    }

    pub fn total_count(&self) -> u32 {
        self.total_count
    }

    pub fn has_ace_spec(&self) -> bool {
        self.has_ace_spec
    }

    pub fn has_radiant(&self) -> bool {
        self.has_radiant
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.total_count == self.rules.max_deck_size
    }

    /// Summed count of every entry sharing `name`, across all sets.
    pub fn copies_named(&self, name: &str) -> u32 {
        self.entries
            .iter()
            .filter(|e| e.name == name)
            .map(|e| e.count)
            .sum()
    }

    /// Add one copy of `card`.
    ///
    /// On rejection nothing changes. On success the (name, set) entry is
    /// incremented, or appended at the end with a count of one.
    pub fn add_card(&mut self, card: &Card) -> Result<EntryKey, Rejection> {
        legality::can_add(self, card)?;

        let key = EntryKey::of(card);
        let idx = match self.entries.iter().position(|e| e.matches(&key)) {
            Some(i) => i,
            None => {
                self.entries.push(DeckEntry::from_card(card));
                self.entries.len() - 1
            }
        };
        if let Some(entry) = self.entries.get_mut(idx) {
            entry.count += 1;
        }

        if card.is_ace_spec() {
            self.has_ace_spec = true;
        }
        if card.is_radiant() {
            self.has_radiant = true;
        }
        self.total_count += 1;
        Ok(key)
    }

    /// Remove one copy. Returns the entry's remaining count, or `None` when
    /// the key is not in the deck.
    pub fn remove_card(&mut self, key: &EntryKey) -> Option<u32> {
        let idx = self.entries.iter().position(|e| e.matches(key))?;
        let entry = self.entries.get_mut(idx)?;
        entry.count -= 1;
        let remaining = entry.count;
        if remaining == 0 {
            self.entries.remove(idx);
            self.rederive_flags();
        }
        self.total_count -= 1;
        Some(remaining)
    }

    /// Remove every copy of one entry. Returns how many copies were removed.
    pub fn remove_entry(&mut self, key: &EntryKey) -> Option<u32> {
        let idx = self.entries.iter().position(|e| e.matches(key))?;
        let removed = self.entries.remove(idx);
        self.total_count -= removed.count;
        self.rederive_flags();
        Some(removed.count)
    }

    fn rederive_flags(&mut self) {
        self.has_ace_spec = self.entries.iter().any(|e| e.ace_spec);
        self.has_radiant = self.entries.iter().any(|e| e.radiant);
    }

    /// Persisted card list, in entry order.
    pub fn to_saved_cards(&self) -> Vec<SavedCard> {
        self.entries.iter().map(DeckEntry::to_saved).collect()
    }

    /// Rebuild a deck from a persisted card list.
    ///
    /// Every unit is replayed through [`add_card`](Self::add_card) so the
    /// current rules are enforced. Cards missing from the catalog and units
    /// the rules refuse become warnings.
    pub fn hydrate(saved: &[SavedCard], catalog: &CardCatalog, rules: DeckRules) -> Hydrated {
        let mut deck = Deck::with_rules(rules);
        let mut warnings = Vec::new();

        for line in saved {
            let Some(card) = catalog.lookup(&line.id) else {
                warnings.push(HydrateWarning::MissingCard {
                    id: line.id.clone(),
                    name: line.name.clone(),
                    count: line.count,
                });
                continue;
            };

            // Units past a full deck can never be added.
            let attempts = line.count.min(rules.max_deck_size);
            let mut dropped = line.count - attempts;
            let mut reason = (dropped > 0).then_some(Rejection::DeckFull);
            for _ in 0..attempts {
                if let Err(r) = deck.add_card(card) {
                    dropped += 1;
                    reason.get_or_insert(r);
                }
            }
            if let Some(reason) = reason {
                warnings.push(HydrateWarning::Rejected {
                    name: card.name.clone(),
                    set: card.set.name.clone(),
                    dropped,
                    reason,
                });
            }
        }

        if !warnings.is_empty() {
            warn!(count = warnings.len(), "deck hydrated with warnings");
        }
        Hydrated { deck, warnings }
    }

    /// Entries reordered for display. The deck itself keeps insertion order.
    pub fn sorted_view(&self, sort: EntrySort) -> Vec<&DeckEntry> {
        let mut view: Vec<&DeckEntry> = self.entries.iter().collect();
        match sort {
            EntrySort::Insertion => {}
            EntrySort::Name => view.sort_by_cached_key(|e| e.name.to_lowercase()),
            EntrySort::Supertype => view.sort_by_key(|e| supertype_rank(e.supertype)),
            EntrySort::CountDesc => view.sort_by(|a, b| b.count.cmp(&a.count)),
        }
        view
    }
}

fn supertype_rank(s: Supertype) -> u8 {
    match s {
        Supertype::Pokemon => 0,
        Supertype::Trainer => 1,
        Supertype::Energy => 2,
        Supertype::Other => 3,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EntrySort {
    #[default]
    Insertion,
    Name,
    /// Pokémon, then Trainer, then Energy; stable within a group.
    Supertype,
    CountDesc,
}

// ---------------------------------------------------------------------------
// Hydration results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Hydrated {
    pub deck: Deck,
    pub warnings: Vec<HydrateWarning>,
}

/// A recoverable problem found while rebuilding a saved deck.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HydrateWarning {
    #[error("{count}x {name} ({id}) is not in the card catalog")]
    MissingCard { id: String, name: String, count: u32 },
    #[error("dropped {dropped}x {name} ({set}): {reason}")]
    Rejected {
        name: String,
        set: String,
        dropped: u32,
        reason: Rejection,
    },
}

// ---------------------------------------------------------------------------
// DeckEditor
// ---------------------------------------------------------------------------

/// A deck-editing session.
///
/// Every mutating call recomputes the [`DeckSummary`] before returning, so
/// the count and price shown are never stale relative to the deck.
#[derive(Debug, Clone)]
pub struct DeckEditor {
    deck: Deck,
    catalog: Arc<CardCatalog>,
    summary: DeckSummary,
}

impl DeckEditor {
    pub fn new(catalog: Arc<CardCatalog>) -> Self {
        Self::from_deck(Deck::new(), catalog)
    }

    pub fn from_deck(deck: Deck, catalog: Arc<CardCatalog>) -> Self {
        let mut editor = Self {
            deck,
            catalog,
            summary: DeckSummary::default(),
        };
        editor.recompute();
        editor
    }

    /// Open a saved deck for editing.
    pub fn hydrate(
        saved: &[SavedCard],
        catalog: Arc<CardCatalog>,
        rules: DeckRules,
    ) -> (Self, Vec<HydrateWarning>) {
        let Hydrated { deck, warnings } = Deck::hydrate(saved, &catalog, rules);
        (Self::from_deck(deck, catalog), warnings)
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn catalog(&self) -> &CardCatalog {
        &self.catalog
    }

    pub fn summary(&self) -> DeckSummary {
        self.summary
    }

    /// Add the catalog card with `card_id`.
    pub fn add(&mut self, card_id: &str) -> Result<EntryKey, AddError> {
        let catalog = Arc::clone(&self.catalog);
        let card = catalog
            .lookup(card_id)
            .ok_or_else(|| AddError::UnknownCard(card_id.to_string()))?;
        self.add_card(card).map_err(AddError::Rejected)
    }

    pub fn add_card(&mut self, card: &Card) -> Result<EntryKey, Rejection> {
        let key = self.deck.add_card(card)?;
        self.recompute();
        Ok(key)
    }

    pub fn remove(&mut self, key: &EntryKey) -> Option<u32> {
        let remaining = self.deck.remove_card(key)?;
        self.recompute();
        Some(remaining)
    }

    pub fn remove_entry(&mut self, key: &EntryKey) -> Option<u32> {
        let removed = self.deck.remove_entry(key)?;
        self.recompute();
        Some(removed)
    }

    pub fn price_breakdown(&self) -> Vec<PriceLine> {
        pricing::price_breakdown(&self.deck, &self.catalog)
    }

    pub fn into_deck(self) -> Deck {
        self.deck
    }

    fn recompute(&mut self) {
        self.summary = DeckSummary {
            total_count: self.deck.total_count(),
            total_price: pricing::total_price(&self.deck, &self.catalog),
        };
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddError {
    #[error("card {0} is not in the catalog")]
    UnknownCard(String),
    #[error(transparent)]
    Rejected(Rejection),
}
