/// Authentication: JWT issuance, bcrypt hashing and the bearer-token middleware
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub username: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Clone)]
pub struct AuthService {
    secret: String,
    token_expiration: Duration,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(secret: String, expiration_hours: u64) -> Self {
        Self {
            secret,
            token_expiration: Duration::hours(expiration_hours as i64),
            bcrypt_cost: 10,
        }
    }

    /// Override the bcrypt work factor.
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    /// Hash a password using bcrypt
    pub fn hash_password(&self, password: &str) -> Result<String> {
        bcrypt::hash(password, self.bcrypt_cost).map_err(ApiError::from)
    }

    /// Verify a password against a hash
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        bcrypt::verify(password, hash).map_err(ApiError::from)
    }

    /// Issue a login token
    pub fn create_token(&self, user_id: i64, username: &str) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            exp: (now + self.token_expiration).timestamp(),
            iat: now.timestamp(),
        };
        let encoding_key = EncodingKey::from_secret(self.secret.as_bytes());
        encode(&Header::default(), &claims, &encoding_key).map_err(ApiError::from)
    }

    /// Verify and decode a token
    pub fn verify_token(&self, token: &str) -> Result<AuthenticatedUser> {
        let decoding_key = DecodingKey::from_secret(self.secret.as_bytes());
        let claims = decode::<Claims>(token, &decoding_key, &Validation::default())?.claims;
        let id = claims
            .sub
            .parse()
            .map_err(|_| ApiError::Authentication("Malformed token subject".to_string()))?;
        Ok(AuthenticatedUser {
            id,
            username: claims.username,
        })
    }
}

/// The user a request was authenticated as.
/// Can be used as an extractor in handlers behind [`auth_middleware`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub username: String,
}

/// Middleware that extracts and validates the JWT from the Authorization header
pub async fn auth_middleware(
    State(auth_service): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Authentication("Access denied. No token provided.".to_string()))?;

    let user = auth_service.verify_token(token).map_err(|e| {
        tracing::warn!("Token verification failed: {}", e);
        ApiError::Authentication("Invalid or expired token.".to_string())
    })?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::Authentication("Not authenticated".to_string()))
    }
}
