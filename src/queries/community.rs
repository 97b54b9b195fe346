//! Community listing of published decks: browse, vote and copy.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info};

use crate::catalog::CardCatalog;
use crate::config;
use crate::connection::Connection;
use crate::error::{DeckError, Result};
use crate::models::{DeckRecord, PublicDeckPage, PublishedDeck, VoteDirection, VoteTally};
use crate::sql_builder::{escape_like, SqlBuilder};

use super::decks::{copy_request, DeckQuery};
use super::{decode_json, timestamp};

const PUBLISHED_COLUMNS: &[&str] = &[
    "d.id",
    "d.deck_name",
    "u.username",
    "d.cards",
    "d.upvotes",
    "d.downvotes",
    "d.cards_price",
    "d.main_card",
    "d.key_cards",
    "d.description",
    "d.video_links",
    "d.created_at",
    "d.published_at",
];

// ---------------------------------------------------------------------------
// ListParams / CommunitySort
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommunitySort {
    #[default]
    Recent,
    Oldest,
    Votes,
    LeastVotes,
    /// Cheapest first.
    Price,
    Expensive,
}

impl CommunitySort {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "recent" => Some(CommunitySort::Recent),
            "oldest" => Some(CommunitySort::Oldest),
            "votes" => Some(CommunitySort::Votes),
            "least_votes" => Some(CommunitySort::LeastVotes),
            "price" => Some(CommunitySort::Price),
            "expensive" => Some(CommunitySort::Expensive),
            _ => None,
        }
    }

    fn order_clause(&self) -> &'static str {
        match self {
            CommunitySort::Recent => "d.created_at DESC",
            CommunitySort::Oldest => "d.created_at ASC",
            CommunitySort::Votes => "(d.upvotes - d.downvotes) DESC",
            CommunitySort::LeastVotes => "(d.upvotes - d.downvotes) ASC",
            CommunitySort::Price => "d.cards_price ASC NULLS LAST",
            CommunitySort::Expensive => "d.cards_price DESC NULLS LAST",
        }
    }
}

/// Parameters for [`CommunityQuery::list`]. `page` is 1-based.
#[derive(Debug, Clone)]
pub struct ListParams {
    pub sort: CommunitySort,
    pub page: usize,
    pub per_page: usize,
    /// Case-insensitive deck-name substring.
    pub search: Option<String>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            sort: CommunitySort::Recent,
            page: 1,
            per_page: config::DEFAULT_PER_PAGE,
            search: None,
        }
    }
}

impl ListParams {
    fn clamped(&self) -> (usize, usize) {
        let per_page = self.per_page.clamp(1, config::MAX_PER_PAGE);
        let page = self.page.clamp(1, config::MAX_PAGE);
        (per_page, (page - 1).saturating_mul(per_page))
    }
}

// ---------------------------------------------------------------------------
// PublishedRow
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PublishedRow {
    id: i64,
    deck_name: String,
    username: String,
    cards: String,
    upvotes: i64,
    downvotes: i64,
    cards_price: f64,
    main_card: Option<String>,
    key_cards: Option<String>,
    description: Option<String>,
    video_links: Option<String>,
    created_at: DateTime<Utc>,
    published_at: Option<DateTime<Utc>>,
}

impl TryFrom<PublishedRow> for PublishedDeck {
    type Error = DeckError;

    fn try_from(row: PublishedRow) -> Result<Self> {
        Ok(PublishedDeck {
            id: row.id,
            deck_name: row.deck_name,
            username: row.username,
            cards: serde_json::from_str(&row.cards)?,
            upvotes: row.upvotes,
            downvotes: row.downvotes,
            cards_price: row.cards_price,
            main_card: decode_json(row.main_card.as_deref())?,
            key_cards: decode_json(row.key_cards.as_deref())?,
            description: row.description,
            video_links: decode_json(row.video_links.as_deref())?,
            created_at: row.created_at,
            published_at: row.published_at,
        })
    }
}

// ---------------------------------------------------------------------------
// CommunityQuery
// ---------------------------------------------------------------------------

/// Read and vote path over public decks.
pub struct CommunityQuery<'a> {
    conn: &'a Connection,
    catalog: Arc<CardCatalog>,
}

impl<'a> CommunityQuery<'a> {
    pub fn new(conn: &'a Connection, catalog: Arc<CardCatalog>) -> Self {
        Self { conn, catalog }
    }

    fn published(&self) -> SqlBuilder {
        let mut qb = SqlBuilder::new("decks d");
        qb.select(PUBLISHED_COLUMNS)
            .join("JOIN users u ON d.user_id = u.id")
            .where_eq("d.is_public", true);
        qb
    }

    /// One page of public decks plus the total number of matches.
    ///
    /// Equal sort keys are ordered by ascending id so pages never overlap.
    pub fn list(&self, params: &ListParams) -> Result<PublicDeckPage> {
        let (per_page, offset) = params.clamped();

        let mut qb = self.published();
        if let Some(search) = params.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            qb.where_like("d.deck_name", &format!("%{}%", escape_like(search)));
        }

        let (count_sql, count_params) = qb.build_count();
        let total_count = self
            .conn
            .execute_scalar(&count_sql, &count_params)?
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as usize;

        qb.order_by(&[params.sort.order_clause(), "d.id ASC"])
            .limit(per_page)
            .offset(offset);
        let (sql, sql_params) = qb.build();
        let rows: Vec<PublishedRow> = self.conn.execute_into(&sql, &sql_params)?;
        let decks = rows
            .into_iter()
            .map(PublishedDeck::try_from)
            .collect::<Result<Vec<_>>>()?;

        debug!(total_count, returned = decks.len(), "listed public decks");
        Ok(PublicDeckPage { decks, total_count })
    }

    /// A single public deck.
    pub fn get(&self, deck_id: i64) -> Result<Option<PublishedDeck>> {
        let mut qb = self.published();
        qb.where_eq("d.id", deck_id).limit(1);
        let (sql, params) = qb.build();
        let rows: Vec<PublishedRow> = self.conn.execute_into(&sql, &params)?;
        rows.into_iter().next().map(PublishedDeck::try_from).transpose()
    }

    /// Cast or switch `user`'s vote on a public deck.
    ///
    /// Repeating the active direction is a [`DeckError::Conflict`] and leaves
    /// the tally unchanged. Switching moves one vote from the old column to
    /// the new one in a single statement. The whole read-modify-write runs in
    /// one transaction.
    pub fn vote(&self, user: i64, deck_id: i64, direction: VoteDirection) -> Result<VoteTally> {
        self.conn.in_transaction(|conn| {
            let visible = conn
                .execute_scalar("SELECT is_public FROM decks WHERE id = ?", &[deck_id.into()])?
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            if !visible {
                return Err(DeckError::NotFound(format!("public deck {}", deck_id)));
            }

            let previous = conn
                .execute_scalar(
                    "SELECT vote_type FROM deck_votes WHERE user_id = ? AND deck_id = ?",
                    &[user.into(), deck_id.into()],
                )?
                .and_then(|v| v.as_str().and_then(VoteDirection::parse));

            let now = timestamp(Utc::now());
            match previous {
                Some(prev) if prev == direction => {
                    return Err(DeckError::Conflict(format!(
                        "already cast a {} on deck {}",
                        direction.as_str(),
                        deck_id
                    )));
                }
                Some(prev) => {
                    let (old, new) = (prev.column(), direction.column());
                    conn.execute_update(
                        &format!(
                            "UPDATE decks SET {old} = {old} - 1, {new} = {new} + 1 WHERE id = ?"
                        ),
                        &[deck_id.into()],
                    )?;
                    conn.execute_update(
                        "UPDATE deck_votes SET vote_type = ?, created_at = ? \
                         WHERE user_id = ? AND deck_id = ?",
                        &[direction.as_str().into(), now.into(), user.into(), deck_id.into()],
                    )?;
                }
                None => {
                    let col = direction.column();
                    conn.execute_update(
                        &format!("UPDATE decks SET {col} = {col} + 1 WHERE id = ?"),
                        &[deck_id.into()],
                    )?;
                    conn.execute_update(
                        "INSERT INTO deck_votes (user_id, deck_id, vote_type, created_at) \
                         VALUES (?, ?, ?, ?)",
                        &[user.into(), deck_id.into(), direction.as_str().into(), now.into()],
                    )?;
                }
            }

            let tally: Vec<VoteTally> = conn.execute_into(
                "SELECT upvotes, downvotes FROM decks WHERE id = ?",
                &[deck_id.into()],
            )?;
            tally
                .into_iter()
                .next()
                .ok_or_else(|| DeckError::NotFound(format!("deck {}", deck_id)))
        })
    }

    /// Duplicate a public deck's cards into a new private deck owned by `user`.
    pub fn copy(&self, user: i64, deck_id: i64) -> Result<DeckRecord> {
        let source = self
            .get(deck_id)?
            .ok_or_else(|| DeckError::NotFound(format!("public deck {}", deck_id)))?;
        let decks = DeckQuery::new(self.conn, Arc::clone(&self.catalog));
        let copy = decks.create(user, copy_request(&source.deck_name, source.cards))?;
        info!(source = deck_id, copy = copy.id, user, "copied public deck");
        Ok(copy)
    }
}
