//! Persistence of owned decks: create, update, load, list and delete.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use crate::catalog::CardCatalog;
use crate::config;
use crate::connection::Connection;
use crate::deck::pricing;
use crate::error::{DeckError, Result};
use crate::models::{
    DeckRecord, DeckSaveRequest, FeaturedCard, PublishMetadata, SaveOutcome, SavedCard,
};
use crate::sql_builder::{SqlBuilder, SqlParam};

use super::{decode_json, encode_json, timestamp};

pub(crate) const DECK_COLUMNS: &[&str] = &[
    "id",
    "user_id",
    "deck_name",
    "cards",
    "is_public",
    "main_card",
    "key_cards",
    "description",
    "video_links",
    "cards_price",
    "upvotes",
    "downvotes",
    "created_at",
    "published_at",
];

// ---------------------------------------------------------------------------
// DeckRow: raw `decks` row with JSON text columns
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct DeckRow {
    id: i64,
    user_id: i64,
    deck_name: String,
    cards: String,
    is_public: bool,
    main_card: Option<String>,
    key_cards: Option<String>,
    description: Option<String>,
    video_links: Option<String>,
    cards_price: f64,
    upvotes: i64,
    downvotes: i64,
    created_at: DateTime<Utc>,
    published_at: Option<DateTime<Utc>>,
}

impl TryFrom<DeckRow> for DeckRecord {
    type Error = DeckError;

    fn try_from(row: DeckRow) -> Result<Self> {
        Ok(DeckRecord {
            id: row.id,
            user_id: row.user_id,
            deck_name: row.deck_name,
            cards: serde_json::from_str(&row.cards)?,
            is_public: row.is_public,
            main_card: decode_json(row.main_card.as_deref())?,
            key_cards: decode_json(row.key_cards.as_deref())?,
            description: row.description,
            video_links: decode_json(row.video_links.as_deref())?,
            cards_price: row.cards_price,
            upvotes: row.upvotes,
            downvotes: row.downvotes,
            created_at: row.created_at,
            published_at: row.published_at,
        })
    }
}

// ---------------------------------------------------------------------------
// DeckQuery
// ---------------------------------------------------------------------------

/// Deck persistence gateway. Every save recomputes `cards_price` from the
/// catalog it was created with.
pub struct DeckQuery<'a> {
    conn: &'a Connection,
    catalog: Arc<CardCatalog>,
}

impl<'a> DeckQuery<'a> {
    pub fn new(conn: &'a Connection, catalog: Arc<CardCatalog>) -> Self {
        Self { conn, catalog }
    }

    /// Create a new deck (`deck_id == None`) or update an existing one.
    ///
    /// The request is validated before anything is written; a rejected save
    /// leaves the store untouched.
    pub fn save(
        &self,
        owner: i64,
        deck_id: Option<i64>,
        request: DeckSaveRequest,
    ) -> Result<SaveOutcome> {
        match deck_id {
            None => self.create(owner, request).map(SaveOutcome::Created),
            Some(id) => self.update(owner, id, request).map(SaveOutcome::Updated),
        }
    }

    /// Insert a new deck for `owner`, suffixing the name until it is unique
    /// among the owner's decks.
    pub fn create(&self, owner: i64, request: DeckSaveRequest) -> Result<DeckRecord> {
        if request.cards.is_empty() {
            return Err(DeckError::InvalidArgument(
                "a deck needs at least one card".into(),
            ));
        }
        validate_lines(&request.cards)?;
        if let Some(meta) = &request.publish {
            validate_publish(meta)?;
        }

        let base = normalized_name(&request.name);
        let name = self.unique_name(owner, base)?;
        let id = self.conn.next_id("deck_id_seq")?;
        let now = Utc::now();
        let price = pricing::saved_cards_price(&request.cards, &self.catalog);
        let meta = request.publish.unwrap_or_default();
        let published_at = request.is_public.then(|| timestamp(now));

        self.conn.execute_update(
            "INSERT INTO decks (id, user_id, deck_name, cards, is_public, main_card, key_cards, \
             description, video_links, cards_price, upvotes, downvotes, created_at, published_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, 0, ?, ?)",
            &[
                id.into(),
                owner.into(),
                name.as_str().into(),
                encode_json(&request.cards)?.into(),
                request.is_public.into(),
                encode_featured(meta.main_card.as_ref())?,
                encode_key_cards(&meta.key_cards)?,
                meta.description.clone().into(),
                encode_links(&meta.video_links)?,
                price.into(),
                timestamp(now).into(),
                published_at.into(),
            ],
        )?;

        if request.is_public {
            info!(deck_id = id, owner, price, "published deck");
        }
        self.fetch(id)?
            .ok_or_else(|| DeckError::NotFound(format!("deck {}", id)))
    }

    /// Overwrite an owned deck. A blank name keeps the existing one and the
    /// name is never suffixed. Metadata is replaced only when supplied.
    pub fn update(&self, owner: i64, id: i64, request: DeckSaveRequest) -> Result<DeckRecord> {
        validate_lines(&request.cards)?;
        if let Some(meta) = &request.publish {
            validate_publish(meta)?;
        }
        let existing = self.load(owner, id)?;

        let name = if request.name.trim().is_empty() {
            existing.deck_name.clone()
        } else {
            request.name.trim().to_string()
        };
        let price = pricing::saved_cards_price(&request.cards, &self.catalog);
        let published_at = match (request.is_public, existing.published_at) {
            (false, _) => None,
            (true, Some(at)) if existing.is_public => Some(at),
            (true, _) => Some(Utc::now()),
        };

        let meta = match request.publish {
            Some(meta) => meta,
            None => PublishMetadata {
                main_card: existing.main_card,
                key_cards: existing.key_cards.unwrap_or_default(),
                description: existing.description,
                video_links: existing.video_links.unwrap_or_default(),
            },
        };

        self.conn.execute_update(
            "UPDATE decks SET deck_name = ?, cards = ?, is_public = ?, main_card = ?, \
             key_cards = ?, description = ?, video_links = ?, cards_price = ?, published_at = ? \
             WHERE id = ? AND user_id = ?",
            &[
                name.into(),
                encode_json(&request.cards)?.into(),
                request.is_public.into(),
                encode_featured(meta.main_card.as_ref())?,
                encode_key_cards(&meta.key_cards)?,
                meta.description.into(),
                encode_links(&meta.video_links)?,
                price.into(),
                published_at.map(timestamp).into(),
                id.into(),
                owner.into(),
            ],
        )?;

        if request.is_public && !existing.is_public {
            info!(deck_id = id, owner, price, "published deck");
        }
        self.fetch(id)?
            .ok_or_else(|| DeckError::NotFound(format!("deck {}", id)))
    }

    /// Load a deck owned by `owner`.
    pub fn load(&self, owner: i64, id: i64) -> Result<DeckRecord> {
        let deck = self
            .fetch(id)?
            .ok_or_else(|| DeckError::NotFound(format!("deck {}", id)))?;
        if deck.user_id != owner {
            return Err(DeckError::Unauthorized(format!(
                "deck {} belongs to another user",
                id
            )));
        }
        Ok(deck)
    }

    /// Every deck owned by `owner`, newest first.
    pub fn list_for_owner(&self, owner: i64) -> Result<Vec<DeckRecord>> {
        let (sql, params) = SqlBuilder::new("decks")
            .select(DECK_COLUMNS)
            .where_eq("user_id", owner)
            .order_by(&["created_at DESC", "id DESC"])
            .build();
        let rows: Vec<DeckRow> = self.conn.execute_into(&sql, &params)?;
        rows.into_iter().map(DeckRecord::try_from).collect()
    }

    /// Delete an owned deck together with every vote cast on it.
    pub fn delete(&self, owner: i64, id: i64) -> Result<()> {
        self.load(owner, id)?;
        self.conn.in_transaction(|conn| {
            conn.execute_update("DELETE FROM deck_votes WHERE deck_id = ?", &[id.into()])?;
            conn.execute_update(
                "DELETE FROM decks WHERE id = ? AND user_id = ?",
                &[id.into(), owner.into()],
            )?;
            Ok(())
        })?;
        info!(deck_id = id, owner, "deleted deck");
        Ok(())
    }

    /// Fetch a deck by id regardless of owner.
    pub(crate) fn fetch(&self, id: i64) -> Result<Option<DeckRecord>> {
        let (sql, params) = SqlBuilder::new("decks")
            .select(DECK_COLUMNS)
            .where_eq("id", id)
            .limit(1)
            .build();
        let rows: Vec<DeckRow> = self.conn.execute_into(&sql, &params)?;
        rows.into_iter().next().map(DeckRecord::try_from).transpose()
    }

    /// `base`, or `base (n)` for the smallest n that no other deck of the
    /// owner uses (case-insensitive).
    fn unique_name(&self, owner: i64, base: &str) -> Result<String> {
        let rows = self.conn.execute(
            "SELECT deck_name FROM decks WHERE user_id = ?",
            &[owner.into()],
        )?;
        let taken: HashSet<String> = rows
            .iter()
            .filter_map(|r| r.get("deck_name").and_then(|v| v.as_str()))
            .map(str::to_lowercase)
            .collect();

        let mut candidate = base.to_string();
        let mut suffix = 1;
        while taken.contains(&candidate.to_lowercase()) {
            candidate = format!("{} ({})", base, suffix);
            suffix += 1;
        }
        Ok(candidate)
    }
}

fn normalized_name(name: &str) -> &str {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        config::DEFAULT_DECK_NAME
    } else {
        trimmed
    }
}

/// Every line holds between one and a full deck's worth of copies.
fn validate_lines(cards: &[SavedCard]) -> Result<()> {
    match cards
        .iter()
        .find(|c| c.count == 0 || c.count > config::MAX_DECK_SIZE)
    {
        Some(line) => Err(DeckError::InvalidArgument(format!(
            "card {} has count {}, expected 1 to {}",
            line.id,
            line.count,
            config::MAX_DECK_SIZE
        ))),
        None => Ok(()),
    }
}

fn validate_publish(meta: &PublishMetadata) -> Result<()> {
    if meta.key_cards.len() > config::MAX_KEY_CARDS {
        return Err(DeckError::InvalidArgument(format!(
            "at most {} key cards may be featured, got {}",
            config::MAX_KEY_CARDS,
            meta.key_cards.len()
        )));
    }
    Ok(())
}

fn encode_featured(card: Option<&FeaturedCard>) -> Result<SqlParam> {
    Ok(card.map(encode_json).transpose()?.into())
}

fn encode_key_cards(cards: &[FeaturedCard]) -> Result<SqlParam> {
    if cards.is_empty() {
        return Ok(SqlParam::Null);
    }
    Ok(encode_json(&cards)?.into())
}

fn encode_links(links: &[String]) -> Result<SqlParam> {
    if links.is_empty() {
        return Ok(SqlParam::Null);
    }
    Ok(encode_json(&links)?.into())
}

/// Cards-only request used when duplicating a deck.
pub(crate) fn copy_request(name: &str, cards: Vec<SavedCard>) -> DeckSaveRequest {
    DeckSaveRequest {
        name: format!("{} {}", name, config::COPY_SUFFIX),
        cards,
        is_public: false,
        publish: None,
    }
}
