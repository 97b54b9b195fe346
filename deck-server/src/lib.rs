//! REST backend for the Pokémon TCG deck builder.
//!
//! Exposes account, deck and community endpoints over the
//! [`ptcg_deckbuilder`] store. Everything except registration, e-mail
//! verification, login and the health check requires a bearer token.

pub mod auth;
pub mod config;
pub mod error;
pub mod mailer;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::{middleware, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Build the application router.
pub fn app(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/user-info", get(routes::users::user_info))
        .route("/update-user", put(routes::users::update_user))
        .route("/save-deck", post(routes::decks::save_deck))
        .route("/save-deck/{id}", put(routes::decks::update_deck))
        .route("/load-decks", get(routes::decks::load_decks))
        .route("/load-deck/{id}", get(routes::decks::load_deck))
        .route("/delete-deck/{id}", delete(routes::decks::delete_deck))
        .route("/copy-deck/{id}", post(routes::decks::copy_deck))
        .route("/public-decks", get(routes::community::public_decks))
        .route("/vote-deck/{id}", post(routes::community::vote_deck))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state.auth),
            auth::auth_middleware,
        ));

    Router::new()
        .route("/register", post(routes::users::register))
        .route("/verify-email", get(routes::users::verify_email))
        .route("/login", post(routes::users::login))
        .route("/health", get(routes::health::health))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
