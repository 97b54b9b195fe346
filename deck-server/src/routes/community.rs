use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::Json;
use ptcg_deckbuilder::models::{PublicDeckPage, VoteDirection, VoteTally};
use ptcg_deckbuilder::queries::{CommunitySort, ListParams};
use ptcg_deckbuilder::DeckError;
use serde::Deserialize;

use crate::auth::AuthenticatedUser;
use crate::error::{ApiError, Result};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicDecksParams {
    pub sort: Option<String>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
    pub search: Option<String>,
}

impl PublicDecksParams {
    fn into_list_params(self) -> ListParams {
        let defaults = ListParams::default();
        ListParams {
            // Unknown sort keys fall back to most recent.
            sort: self
                .sort
                .as_deref()
                .and_then(CommunitySort::parse)
                .unwrap_or_default(),
            page: self.page.unwrap_or(defaults.page),
            per_page: self.per_page.unwrap_or(defaults.per_page),
            search: self.search,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct VoteBody {
    pub upvote: Option<bool>,
}

/// GET /public-decks?sort=votes&page=2&perPage=10&search=lugia
pub async fn public_decks(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Query(params): Query<PublicDecksParams>,
) -> Result<Json<PublicDeckPage>> {
    let params = params.into_list_params();
    let page = state.sdk.run(move |s| s.community().list(&params)).await?;
    Ok(Json(page))
}

/// POST /vote-deck/{id}
///
/// Repeating the current vote is a 400 and leaves the tally unchanged.
pub async fn vote_deck(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<VoteBody>,
) -> Result<Json<VoteTally>> {
    let upvote = body
        .upvote
        .ok_or_else(|| ApiError::BadRequest("upvote must be true or false.".to_string()))?;
    let direction = VoteDirection::from_upvote(upvote);
    let tally = state
        .sdk
        .run(move |s| s.community().vote(user.id, id, direction))
        .await
        .map_err(|e| match e {
            DeckError::Conflict(_) => ApiError::BadRequest(format!(
                "You have already {}d this deck.",
                direction.as_str()
            )),
            other => other.into(),
        })?;
    Ok(Json(tally))
}
