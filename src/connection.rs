//! DuckDB connection wrapper with schema migration and query execution.
//!
//! Rows come back as `HashMap<String, serde_json::Value>` and can be
//! deserialized straight into row structs with [`Connection::execute_into`].

use std::collections::HashMap;
use std::path::Path;

use duckdb::{types::ValueRef, Connection as DuckDbConnection};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{DeckError, Result};
use crate::sql_builder::SqlParam;

/// Idempotent schema. Timestamps are RFC 3339 strings in UTC; card lists,
/// featured cards and video links are JSON text.
const SCHEMA: &str = "
CREATE SEQUENCE IF NOT EXISTS user_id_seq START 1;
CREATE SEQUENCE IF NOT EXISTS deck_id_seq START 1;

CREATE TABLE IF NOT EXISTS users (
    id BIGINT PRIMARY KEY,
    username VARCHAR NOT NULL,
    email VARCHAR NOT NULL,
    password VARCHAR NOT NULL,
    is_verified BOOLEAN NOT NULL DEFAULT FALSE,
    verification_token VARCHAR,
    created_at VARCHAR NOT NULL
);

CREATE TABLE IF NOT EXISTS decks (
    id BIGINT PRIMARY KEY,
    user_id BIGINT NOT NULL,
    deck_name VARCHAR NOT NULL,
    cards VARCHAR NOT NULL,
    is_public BOOLEAN NOT NULL DEFAULT FALSE,
    main_card VARCHAR,
    key_cards VARCHAR,
    description VARCHAR,
    video_links VARCHAR,
    cards_price DOUBLE NOT NULL DEFAULT 0,
    upvotes BIGINT NOT NULL DEFAULT 0,
    downvotes BIGINT NOT NULL DEFAULT 0,
    created_at VARCHAR NOT NULL,
    published_at VARCHAR
);

CREATE TABLE IF NOT EXISTS deck_votes (
    user_id BIGINT NOT NULL,
    deck_id BIGINT NOT NULL,
    vote_type VARCHAR NOT NULL,
    created_at VARCHAR NOT NULL
);
";

/// Wraps a DuckDB connection holding the users, decks and votes tables.
pub struct Connection {
    conn: DuckDbConnection,
}

impl Connection {
    /// Open (or create) the database at `path`, or an in-memory database
    /// when `path` is `None`, and apply the schema.
    pub fn open(path: Option<&Path>) -> Result<Self> {
        let conn = match path {
            Some(p) => {
                if let Some(parent) = p.parent().filter(|d| !d.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                debug!(path = %p.display(), "opening deck database");
                DuckDbConnection::open(p)?
            }
            None => DuckDbConnection::open_in_memory()?,
        };
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::open(None)
    }

    /// Execute SQL and return results as a `Vec` of `HashMap`s.
    ///
    /// Automatically converts DuckDB types to `serde_json::Value`.
    pub fn execute(
        &self,
        sql: &str,
        params: &[SqlParam],
    ) -> Result<Vec<HashMap<String, serde_json::Value>>> {
        let mut stmt = self.conn.prepare(sql)?;
        let param_values = as_dyn(params);
        let mut rows_result = stmt.query(param_values.as_slice())?;

        // Column metadata is only available once the statement has run.
        let column_names: Vec<String> = rows_result
            .as_ref()
            .map(|s| s.column_names())
            .unwrap_or_default();

        let mut out: Vec<HashMap<String, serde_json::Value>> = Vec::new();
        while let Some(row) = rows_result.next()? {
            let mut map = HashMap::with_capacity(column_names.len());
            for (i, col_name) in column_names.iter().enumerate() {
                let value = convert_value_ref(row.get_ref(i)?);
                map.insert(col_name.clone(), value);
            }
            out.push(map);
        }

        Ok(out)
    }

    /// Execute SQL and deserialize each row into type `T`.
    pub fn execute_into<T: DeserializeOwned>(
        &self,
        sql: &str,
        params: &[SqlParam],
    ) -> Result<Vec<T>> {
        let rows = self.execute(sql, params)?;
        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let value = serde_json::Value::Object(
                row.into_iter().collect::<serde_json::Map<String, serde_json::Value>>(),
            );
            let item: T = serde_json::from_value(value)?;
            results.push(item);
        }
        Ok(results)
    }

    /// Execute SQL and return the first column of the first row.
    ///
    /// Returns `None` if the result set is empty.
    pub fn execute_scalar(
        &self,
        sql: &str,
        params: &[SqlParam],
    ) -> Result<Option<serde_json::Value>> {
        let mut stmt = self.conn.prepare(sql)?;
        let param_values = as_dyn(params);
        let mut rows = stmt.query(param_values.as_slice())?;

        if let Some(row) = rows.next()? {
            Ok(Some(convert_value_ref(row.get_ref(0)?)))
        } else {
            Ok(None)
        }
    }

    /// Execute an INSERT/UPDATE/DELETE and return the number of affected rows.
    pub fn execute_update(&self, sql: &str, params: &[SqlParam]) -> Result<usize> {
        let mut stmt = self.conn.prepare(sql)?;
        let param_values = as_dyn(params);
        Ok(stmt.execute(param_values.as_slice())?)
    }

    /// Next value of a sequence created by the schema.
    pub fn next_id(&self, sequence: &str) -> Result<i64> {
        let value = self.execute_scalar(&format!("SELECT nextval('{}')", sequence), &[])?;
        value
            .and_then(|v| v.as_i64())
            .ok_or_else(|| DeckError::NotFound(format!("sequence {}", sequence)))
    }

    /// Run `f` inside a transaction, committing on `Ok` and rolling back on `Err`.
    pub fn in_transaction<T>(&self, f: impl FnOnce(&Self) -> Result<T>) -> Result<T> {
        self.conn.execute_batch("BEGIN TRANSACTION")?;
        match f(self) {
            Ok(value) => {
                self.conn.execute_batch("COMMIT")?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = self.conn.execute_batch("ROLLBACK") {
                    warn!(error = %rollback, "rollback failed");
                }
                Err(e)
            }
        }
    }

    /// Access the underlying DuckDB connection for advanced usage.
    pub fn raw(&self) -> &DuckDbConnection {
        &self.conn
    }
}

fn as_dyn(params: &[SqlParam]) -> Vec<&dyn duckdb::ToSql> {
    params.iter().map(|p| p as &dyn duckdb::ToSql).collect()
}

/// Convert a DuckDB `ValueRef` to a `serde_json::Value`.
fn convert_value_ref(val: ValueRef<'_>) -> serde_json::Value {
    match val {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Boolean(b) => serde_json::Value::Bool(b),
        ValueRef::TinyInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::SmallInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::Int(n) => serde_json::Value::Number(n.into()),
        ValueRef::BigInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::HugeInt(n) => {
            // HugeInt may not fit in i64; fall back to a string
            if let Ok(i) = i64::try_from(n) {
                serde_json::Value::Number(i.into())
            } else {
                serde_json::Value::String(n.to_string())
            }
        }
        ValueRef::Float(f) => serde_json::Number::from_f64(f as f64)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Double(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Text(bytes) => serde_json::Value::String(String::from_utf8_lossy(bytes).to_string()),
        _ => serde_json::Value::Null,
    }
}
