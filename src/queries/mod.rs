//! Query modules for the deck store.
//!
//! Each module provides a query struct that borrows a
//! [`Connection`](crate::connection::Connection) and exposes methods
//! returning `Result<T>` with typed model payloads.

pub mod community;
pub mod decks;
pub mod users;

pub use community::{CommunityQuery, CommunitySort, ListParams};
pub use decks::DeckQuery;
pub use users::{validate_password, UserQuery};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// Stored timestamp format: RFC 3339, UTC, microsecond precision.
pub(crate) fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn encode_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Decode a nullable JSON text column.
pub(crate) fn decode_json<T: DeserializeOwned>(text: Option<&str>) -> Result<Option<T>> {
    match text {
        None => Ok(None),
        Some(t) if t.trim().is_empty() => Ok(None),
        Some(t) => Ok(Some(serde_json::from_str(t)?)),
    }
}
