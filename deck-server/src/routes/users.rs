use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use ptcg_deckbuilder::models::UserUpdate;
use ptcg_deckbuilder::queries::validate_password;
use ptcg_deckbuilder::DeckError;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::auth::AuthenticatedUser;
use crate::config::ServerConfig;
use crate::error::{ApiError, Result};
use crate::state::AppState;

use super::{blocking, present};

#[derive(Deserialize)]
pub struct RegisterBody {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct VerifyParams {
    pub token: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginBody {
    /// Username or e-mail.
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateUserBody {
    pub field: Option<String>,
    pub value: Option<String>,
}

async fn hash(state: &AppState, password: String) -> Result<String> {
    let auth = Arc::clone(&state.auth);
    blocking(move || auth.hash_password(&password)).await
}

/// POST /register
///
/// Create an unverified account and e-mail its verification link.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterBody>,
) -> Result<(StatusCode, Json<Value>)> {
    let (Some(username), Some(email), Some(password)) = (
        present(body.username),
        present(body.email),
        body.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::BadRequest("All fields are required.".to_string()));
    };
    validate_password(&password)?;

    let password_hash = hash(&state, password).await?;
    let (name, mail) = (username.clone(), email.clone());
    let registration = state
        .sdk
        .run(move |s| s.users().register(&name, &mail, &password_hash))
        .await
        .map_err(|e| match e {
            // Registration reports every rejected submission as a 400.
            DeckError::Conflict(msg) => ApiError::BadRequest(msg),
            other => ApiError::from(other),
        })?;

    let link = ServerConfig::verification_link(&state.base_url, &registration.verification_token);
    state.mailer.send_verification(&email, &username, &link)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully. Please check your email to verify your account."
        })),
    ))
}

/// GET /verify-email?token=...
pub async fn verify_email(
    State(state): State<Arc<AppState>>,
    Query(params): Query<VerifyParams>,
) -> Result<&'static str> {
    let token = params.token.unwrap_or_default();
    state
        .sdk
        .run(move |s| s.users().verify_email(&token))
        .await
        .map_err(|e| match e {
            DeckError::NotFound(_) => ApiError::BadRequest("Invalid or expired token.".to_string()),
            other => other.into(),
        })?;
    Ok("Email verified! You may now log in.")
}

/// POST /login
///
/// Accepts a username or e-mail. Unverified accounts are refused.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginBody>,
) -> Result<Json<Value>> {
    let invalid = || ApiError::Authentication("Invalid username or password.".to_string());
    let (Some(login), Some(password)) = (present(body.username), body.password) else {
        return Err(invalid());
    };

    let user = state
        .sdk
        .run(move |s| s.users().find_by_login(&login))
        .await?
        .ok_or_else(invalid)?;

    let auth = Arc::clone(&state.auth);
    let stored = user.password.clone();
    if !blocking(move || auth.verify_password(&password, &stored)).await? {
        return Err(invalid());
    }
    if !user.is_verified {
        return Err(ApiError::Authentication(
            "Please verify your email before logging in.".to_string(),
        ));
    }

    let token = state.auth.create_token(user.id, &user.username)?;
    info!(user_id = user.id, "user logged in");
    Ok(Json(json!({
        "token": token,
        "username": user.username,
        "userId": user.id,
    })))
}

/// GET /user-info
pub async fn user_info(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> Result<Json<Value>> {
    let info = state.sdk.run(move |s| s.users().info(user.id)).await?;
    Ok(Json(json!(info)))
}

/// PUT /update-user
///
/// Change one of `username`, `email` or `password`.
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Json(body): Json<UpdateUserBody>,
) -> Result<Json<Value>> {
    let (Some(field), Some(value)) = (body.field, body.value.filter(|v| !v.trim().is_empty()))
    else {
        return Err(ApiError::BadRequest("Field and value are required.".to_string()));
    };

    let update = match field.as_str() {
        "username" => UserUpdate::Username(value),
        "email" => UserUpdate::Email(value),
        "password" => {
            validate_password(&value)?;
            UserUpdate::PasswordHash(hash(&state, value).await?)
        }
        _ => return Err(ApiError::BadRequest("Invalid field.".to_string())),
    };

    let info = state
        .sdk
        .run(move |s| s.users().update(user.id, update))
        .await?;
    Ok(Json(json!({
        "message": "User updated successfully.",
        "user": info,
    })))
}
