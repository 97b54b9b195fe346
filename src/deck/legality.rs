//! Deck-construction rules consulted before every mutation.
//!
//! Checks are pure and run in a fixed order; the first failing check wins.

use crate::config;
use crate::models::Card;

use super::state::{Deck, EntryKey};

/// Why an add was refused. The deck is left unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("deck is full")]
    DeckFull,
    #[error("only one ACE SPEC card is allowed per deck")]
    AceSpecLimit,
    #[error("only one Radiant Pokémon is allowed per deck")]
    RadiantLimit,
    #[error("too many copies of this card across all sets")]
    CopyLimit,
}

impl Rejection {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::DeckFull => "DECK_FULL",
            Rejection::AceSpecLimit => "ACE_SPEC_LIMIT",
            Rejection::RadiantLimit => "RADIANT_LIMIT",
            Rejection::CopyLimit => "COPY_LIMIT",
        }
    }
}

/// Size limits for a format. ACE SPEC and Radiant stay singletons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeckRules {
    pub max_deck_size: u32,
    pub max_copies_per_name: u32,
}

impl Default for DeckRules {
    fn default() -> Self {
        Self {
            max_deck_size: config::MAX_DECK_SIZE,
            max_copies_per_name: config::MAX_COPIES_PER_NAME,
        }
    }
}

/// Decide whether one more copy of `card` may enter `deck`.
pub fn can_add(deck: &Deck, card: &Card) -> Result<(), Rejection> {
    let rules = deck.rules();
    if deck.total_count() >= rules.max_deck_size {
        return Err(Rejection::DeckFull);
    }
    if card.is_ace_spec() && deck.has_ace_spec() {
        return Err(Rejection::AceSpecLimit);
    }
    if card.is_radiant() && deck.has_radiant() {
        return Err(Rejection::RadiantLimit);
    }
    if !card.is_basic_energy() && deck.copies_named(&card.name) >= rules.max_copies_per_name {
        return Err(Rejection::CopyLimit);
    }
    Ok(())
}

/// Removal carries no constraint beyond the entry being present.
pub fn can_remove(deck: &Deck, key: &EntryKey) -> bool {
    deck.entry(key).is_some_and(|e| e.count > 0)
}
