//! Deck construction: state, legality rules, pricing and text export.

pub mod export;
pub mod legality;
pub mod pricing;
pub mod state;

pub use legality::{can_add, can_remove, DeckRules, Rejection};
pub use state::{
    AddError, Deck, DeckEditor, DeckEntry, EntryKey, EntrySort, HydrateWarning, Hydrated,
};
