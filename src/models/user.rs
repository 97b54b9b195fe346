use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub username: String,
    pub email: String,
}

/// Row used to check a login attempt.
#[derive(Debug, Clone, Deserialize)]
pub struct UserCredentials {
    pub id: i64,
    pub username: String,
    /// bcrypt hash.
    pub password: String,
    pub is_verified: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub user_id: i64,
    pub verification_token: String,
}

/// A single-field profile update. Passwords arrive already hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserUpdate {
    Username(String),
    Email(String),
    PasswordHash(String),
}

impl UserUpdate {
    pub fn column(&self) -> &'static str {
        match self {
            UserUpdate::Username(_) => "username",
            UserUpdate::Email(_) => "email",
            UserUpdate::PasswordHash(_) => "password",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            UserUpdate::Username(v) | UserUpdate::Email(v) | UserUpdate::PasswordHash(v) => v,
        }
    }
}
