use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use ptcg_deckbuilder::models::{
    DeckRecord, DeckSaveRequest, FeaturedCard, PublishMetadata, SavedCard,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::AuthenticatedUser;
use crate::error::{ApiError, Result};
use crate::state::AppState;

/// Video links arrive either as one newline/comma separated string or a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum VideoLinks {
    One(String),
    Many(Vec<String>),
}

impl VideoLinks {
    fn into_vec(self) -> Vec<String> {
        let links = match self {
            VideoLinks::One(s) => s.split(['\n', ',']).map(str::to_string).collect(),
            VideoLinks::Many(v) => v,
        };
        links
            .into_iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDeckBody {
    /// Must match the caller on update when supplied.
    pub user_id: Option<i64>,
    #[serde(default)]
    pub deck_name: String,
    #[serde(default)]
    pub cards: Vec<SavedCard>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(rename = "main_card", alias = "mainCard")]
    pub main_card: Option<FeaturedCard>,
    #[serde(rename = "key_cards", alias = "keyCards")]
    pub key_cards: Option<Vec<FeaturedCard>>,
    pub description: Option<String>,
    #[serde(rename = "video_links", alias = "videoLinks")]
    pub video_links: Option<VideoLinks>,
}

impl SaveDeckBody {
    fn into_request(self) -> DeckSaveRequest {
        let has_metadata = self.main_card.is_some()
            || self.key_cards.is_some()
            || self.description.is_some()
            || self.video_links.is_some();
        let publish = has_metadata.then(|| PublishMetadata {
            main_card: self.main_card,
            key_cards: self.key_cards.unwrap_or_default(),
            description: self.description.filter(|d| !d.trim().is_empty()),
            video_links: self.video_links.map(VideoLinks::into_vec).unwrap_or_default(),
        });
        DeckSaveRequest {
            name: self.deck_name,
            cards: self.cards,
            is_public: self.is_public,
            publish,
        }
    }
}

/// POST /save-deck
pub async fn save_deck(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Json(body): Json<SaveDeckBody>,
) -> Result<(StatusCode, Json<DeckRecord>)> {
    let request = body.into_request();
    let deck = state
        .sdk
        .run(move |s| s.decks().create(user.id, request))
        .await?;
    Ok((StatusCode::CREATED, Json(deck)))
}

/// PUT /save-deck/{id}
///
/// Overwrite an owned deck; `cards_price` is recomputed server-side.
pub async fn update_deck(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<SaveDeckBody>,
) -> Result<Json<DeckRecord>> {
    if body.user_id.is_some_and(|owner| owner != user.id) {
        return Err(ApiError::Forbidden("Unauthorized".to_string()));
    }
    let request = body.into_request();
    let deck = state
        .sdk
        .run(move |s| s.decks().update(user.id, id, request))
        .await?;
    Ok(Json(deck))
}

/// GET /load-decks
pub async fn load_decks(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> Result<Json<Value>> {
    let decks = state
        .sdk
        .run(move |s| s.decks().list_for_owner(user.id))
        .await?;
    Ok(Json(json!({ "decks": decks })))
}

/// GET /load-deck/{id}
pub async fn load_deck(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<DeckRecord>> {
    let deck = state.sdk.run(move |s| s.decks().load(user.id, id)).await?;
    Ok(Json(deck))
}

/// DELETE /delete-deck/{id}
pub async fn delete_deck(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>> {
    state.sdk.run(move |s| s.decks().delete(user.id, id)).await?;
    Ok(Json(json!({ "message": "Deck deleted successfully." })))
}

/// POST /copy-deck/{id}
///
/// Duplicate a public deck into a private one owned by the caller.
pub async fn copy_deck(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<DeckRecord>)> {
    let deck = state
        .sdk
        .run(move |s| s.community().copy(user.id, id))
        .await?;
    Ok((StatusCode::CREATED, Json(deck)))
}
