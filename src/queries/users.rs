//! User accounts: registration, e-mail verification, login lookup and
//! profile updates.
//!
//! Passwords are hashed by the caller; this module only stores hashes.

use chrono::Utc;
use rand::RngCore;
use tracing::info;

use crate::connection::Connection;
use crate::error::{DeckError, Result};
use crate::models::{Registration, UserCredentials, UserInfo, UserUpdate};
use crate::sql_builder::SqlBuilder;

use super::timestamp;

const PASSWORD_SPECIALS: &str = "@$!%*?#&^()-_=+";
const MIN_PASSWORD_LEN: usize = 8;

/// Check the password-strength policy.
///
/// At least eight characters with one lowercase letter, one uppercase
/// letter, one digit and one special character from `@$!%*?#&^()-_=+`, and
/// nothing outside letters, digits and that set.
pub fn validate_password(password: &str) -> Result<()> {
    let allowed = password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SPECIALS.contains(c));
    let strong = password.chars().count() >= MIN_PASSWORD_LEN
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SPECIALS.contains(c));

    if allowed && strong {
        Ok(())
    } else {
        Err(DeckError::InvalidArgument(
            "Password must be at least 8 characters long, include uppercase, lowercase, \
             number, and special character."
                .into(),
        ))
    }
}

fn verification_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn required(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DeckError::InvalidArgument(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

// ---------------------------------------------------------------------------
// UserQuery
// ---------------------------------------------------------------------------

pub struct UserQuery<'a> {
    conn: &'a Connection,
}

impl<'a> UserQuery<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create an unverified account and return its verification token.
    pub fn register(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Registration> {
        let username = required("username", username)?;
        let email = required("email", email)?;
        if password_hash.is_empty() {
            return Err(DeckError::InvalidArgument("password is required".into()));
        }
        self.ensure_free("username", &username, None)?;
        self.ensure_free("email", &email, None)?;

        let user_id = self.conn.next_id("user_id_seq")?;
        let token = verification_token();
        self.conn.execute_update(
            "INSERT INTO users (id, username, email, password, is_verified, verification_token, created_at) \
             VALUES (?, ?, ?, ?, FALSE, ?, ?)",
            &[
                user_id.into(),
                username.as_str().into(),
                email.into(),
                password_hash.into(),
                token.as_str().into(),
                timestamp(Utc::now()).into(),
            ],
        )?;
        info!(user_id, username = %username, "registered user");

        Ok(Registration {
            user_id,
            verification_token: token,
        })
    }

    /// Mark the account holding `token` as verified and consume the token.
    pub fn verify_email(&self, token: &str) -> Result<()> {
        if token.is_empty() {
            return Err(DeckError::NotFound("verification token".into()));
        }
        let updated = self.conn.execute_update(
            "UPDATE users SET is_verified = TRUE, verification_token = NULL \
             WHERE verification_token = ?",
            &[token.into()],
        )?;
        if updated == 0 {
            return Err(DeckError::NotFound("Invalid or expired token.".into()));
        }
        Ok(())
    }

    /// Look up an account by username or e-mail.
    pub fn find_by_login(&self, login: &str) -> Result<Option<UserCredentials>> {
        let (sql, params) = SqlBuilder::new("users")
            .select(&["id", "username", "password", "is_verified"])
            .where_clause("(username = ? OR email = ?)", vec![login.into(), login.into()])
            .order_by(&["id ASC"])
            .limit(1)
            .build();
        let rows: Vec<UserCredentials> = self.conn.execute_into(&sql, &params)?;
        Ok(rows.into_iter().next())
    }

    pub fn info(&self, user_id: i64) -> Result<UserInfo> {
        let (sql, params) = SqlBuilder::new("users")
            .select(&["username", "email"])
            .where_eq("id", user_id)
            .build();
        let rows: Vec<UserInfo> = self.conn.execute_into(&sql, &params)?;
        rows.into_iter()
            .next()
            .ok_or_else(|| DeckError::NotFound("User not found.".into()))
    }

    /// Change one profile field and return the updated profile.
    pub fn update(&self, user_id: i64, update: UserUpdate) -> Result<UserInfo> {
        let value = required(update.column(), update.value())?;
        match &update {
            UserUpdate::Username(_) => self.ensure_free("username", &value, Some(user_id))?,
            UserUpdate::Email(_) => self.ensure_free("email", &value, Some(user_id))?,
            UserUpdate::PasswordHash(_) => {}
        }

        let updated = self.conn.execute_update(
            &format!("UPDATE users SET {} = ? WHERE id = ?", update.column()),
            &[value.into(), user_id.into()],
        )?;
        if updated == 0 {
            return Err(DeckError::NotFound("User not found.".into()));
        }
        info!(user_id, field = update.column(), "updated user");
        self.info(user_id)
    }

    fn ensure_free(&self, column: &str, value: &str, except: Option<i64>) -> Result<()> {
        let mut qb = SqlBuilder::new("users");
        qb.where_eq(column, value);
        if let Some(id) = except {
            qb.where_clause("id <> ?", vec![id.into()]);
        }
        let (sql, params) = qb.build_count();
        let taken = self
            .conn
            .execute_scalar(&sql, &params)?
            .and_then(|v| v.as_i64())
            .unwrap_or(0);
        if taken > 0 {
            return Err(DeckError::Conflict(format!("{} is already taken", column)));
        }
        Ok(())
    }
}
