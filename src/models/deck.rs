use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::card::Supertype;

// ---------------------------------------------------------------------------
// SavedCard: One persisted deck line
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedCard {
    pub id: String,
    pub name: String,
    pub set: String,
    #[serde(default = "default_count")]
    pub count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supertype: Option<Supertype>,
}

fn default_count() -> u32 {
    1
}

/// Total number of cards in a persisted card list.
pub fn saved_card_total(cards: &[SavedCard]) -> u32 {
    cards.iter().map(|c| c.count).sum()
}

// ---------------------------------------------------------------------------
// FeaturedCard: Main card / key card shown on a published deck
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturedCard {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub set_code: Option<String>,
    #[serde(default)]
    pub card_number: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

// ---------------------------------------------------------------------------
// PublishMetadata: Extended metadata attached when a deck goes public
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublishMetadata {
    pub main_card: Option<FeaturedCard>,
    #[serde(default)]
    pub key_cards: Vec<FeaturedCard>,
    pub description: Option<String>,
    #[serde(default)]
    pub video_links: Vec<String>,
}

// ---------------------------------------------------------------------------
// DeckSaveRequest / SaveOutcome
// ---------------------------------------------------------------------------

/// Everything the persistence gateway needs to create or update a deck.
#[derive(Debug, Clone, Default)]
pub struct DeckSaveRequest {
    /// Defaults to "Unnamed Deck" when blank.
    pub name: String,
    pub cards: Vec<SavedCard>,
    pub is_public: bool,
    pub publish: Option<PublishMetadata>,
}

#[derive(Debug, Clone)]
pub enum SaveOutcome {
    Created(DeckRecord),
    Updated(DeckRecord),
}

impl SaveOutcome {
    pub fn record(&self) -> &DeckRecord {
        match self {
            SaveOutcome::Created(r) | SaveOutcome::Updated(r) => r,
        }
    }

    pub fn into_record(self) -> DeckRecord {
        match self {
            SaveOutcome::Created(r) | SaveOutcome::Updated(r) => r,
        }
    }
}

// ---------------------------------------------------------------------------
// DeckRecord: Persisted deck row
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckRecord {
    pub id: i64,
    pub user_id: i64,
    pub deck_name: String,
    pub cards: Vec<SavedCard>,
    pub is_public: bool,
    pub main_card: Option<FeaturedCard>,
    pub key_cards: Option<Vec<FeaturedCard>>,
    pub description: Option<String>,
    pub video_links: Option<Vec<String>>,
    pub cards_price: f64,
    pub upvotes: i64,
    pub downvotes: i64,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

impl DeckRecord {
    pub fn card_total(&self) -> u32 {
        saved_card_total(&self.cards)
    }
}

// ---------------------------------------------------------------------------
// PublishedDeck: Community listing projection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishedDeck {
    pub id: i64,
    pub deck_name: String,
    /// Owner's username.
    pub username: String,
    pub cards: Vec<SavedCard>,
    pub upvotes: i64,
    pub downvotes: i64,
    pub cards_price: f64,
    pub main_card: Option<FeaturedCard>,
    pub key_cards: Option<Vec<FeaturedCard>>,
    pub description: Option<String>,
    pub video_links: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

impl PublishedDeck {
    pub fn score(&self) -> i64 {
        self.upvotes - self.downvotes
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicDeckPage {
    pub decks: Vec<PublishedDeck>,
    pub total_count: usize,
}

// ---------------------------------------------------------------------------
// Votes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub upvotes: i64,
    pub downvotes: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    pub fn from_upvote(upvote: bool) -> Self {
        if upvote {
            VoteDirection::Up
        } else {
            VoteDirection::Down
        }
    }

    /// Value stored in `deck_votes.vote_type`.
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteDirection::Up => "upvote",
            VoteDirection::Down => "downvote",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "upvote" => Some(VoteDirection::Up),
            "downvote" => Some(VoteDirection::Down),
            _ => None,
        }
    }

    /// Tally column on `decks` counting this direction.
    pub fn column(&self) -> &'static str {
        match self {
            VoteDirection::Up => "upvotes",
            VoteDirection::Down => "downvotes",
        }
    }
}
