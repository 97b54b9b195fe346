//! SQL builder with parameterized query construction.
//!
//! All user-supplied values go through DuckDB's parameter binding (`?` placeholders),
//! never through string interpolation. Builder methods return `&mut Self` for chaining.
//!
//! # Example
//!
//! ```rust
//! use ptcg_deckbuilder::SqlBuilder;
//! let (sql, params) = SqlBuilder::new("decks d")
//!     .join("JOIN users u ON d.user_id = u.id")
//!     .where_eq("d.is_public", true)
//!     .where_like("d.deck_name", "%lugia%")
//!     .order_by(&["d.created_at DESC", "d.id ASC"])
//!     .limit(10)
//!     .build();
//! ```

use duckdb::types::{ToSqlOutput, Value};
use duckdb::ToSql;

/// A bound query parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Null,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl ToSql for SqlParam {
    fn to_sql(&self) -> duckdb::Result<ToSqlOutput<'_>> {
        let value = match self {
            SqlParam::Null => Value::Null,
            SqlParam::Text(s) => Value::Text(s.clone()),
            SqlParam::Int(n) => Value::BigInt(*n),
            SqlParam::Float(f) => Value::Double(*f),
            SqlParam::Bool(b) => Value::Boolean(*b),
        };
        Ok(ToSqlOutput::Owned(value))
    }
}

impl From<&str> for SqlParam {
    fn from(s: &str) -> Self {
        SqlParam::Text(s.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(s: String) -> Self {
        SqlParam::Text(s)
    }
}

impl From<&String> for SqlParam {
    fn from(s: &String) -> Self {
        SqlParam::Text(s.clone())
    }
}

impl From<i64> for SqlParam {
    fn from(n: i64) -> Self {
        SqlParam::Int(n)
    }
}

impl From<f64> for SqlParam {
    fn from(f: f64) -> Self {
        SqlParam::Float(f)
    }
}

impl From<bool> for SqlParam {
    fn from(b: bool) -> Self {
        SqlParam::Bool(b)
    }
}

impl<T: Into<SqlParam>> From<Option<T>> for SqlParam {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlParam::Null, Into::into)
    }
}

/// Builds parameterized SELECT queries safely.
pub struct SqlBuilder {
    select_cols: Vec<String>,
    from_table: String,
    joins: Vec<String>,
    where_clauses: Vec<String>,
    params: Vec<SqlParam>,
    order_by_cols: Vec<String>,
    limit_val: Option<usize>,
    offset_val: Option<usize>,
}

impl SqlBuilder {
    /// Create a builder targeting the given table (an alias may follow the name).
    pub fn new(table: &str) -> Self {
        Self {
            select_cols: vec!["*".to_string()],
            from_table: table.to_string(),
            joins: Vec::new(),
            where_clauses: Vec::new(),
            params: Vec::new(),
            order_by_cols: Vec::new(),
            limit_val: None,
            offset_val: None,
        }
    }

    /// Set the columns to select (replaces the default `*`).
    pub fn select(&mut self, cols: &[&str]) -> &mut Self {
        self.select_cols = cols.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Add a JOIN clause, e.g. `"JOIN users u ON d.user_id = u.id"`.
    pub fn join(&mut self, clause: &str) -> &mut Self {
        self.joins.push(clause.to_string());
        self
    }

    /// Add a WHERE condition with one `?` placeholder per param, in order.
    pub fn where_clause(&mut self, condition: &str, params: Vec<SqlParam>) -> &mut Self {
        self.where_clauses.push(condition.to_string());
        self.params.extend(params);
        self
    }

    /// Add an equality condition: `{column} = ?`.
    pub fn where_eq(&mut self, column: &str, value: impl Into<SqlParam>) -> &mut Self {
        self.where_clauses.push(format!("{} = ?", column));
        self.params.push(value.into());
        self
    }

    /// Add a case-insensitive LIKE condition. A backslash escapes a wildcard
    /// in `value`; see [`escape_like`].
    ///
    /// Generates: `LOWER({column}) LIKE LOWER(?) ESCAPE '\'`
    pub fn where_like(&mut self, column: &str, value: &str) -> &mut Self {
        self.where_clauses
            .push(format!("LOWER({}) LIKE LOWER(?) ESCAPE '\\'", column));
        self.params.push(value.into());
        self
    }

    /// Add ORDER BY clauses (e.g. `"created_at DESC"`).
    pub fn order_by(&mut self, clauses: &[&str]) -> &mut Self {
        self.order_by_cols
            .extend(clauses.iter().map(|c| c.to_string()));
        self
    }

    pub fn limit(&mut self, n: usize) -> &mut Self {
        self.limit_val = Some(n);
        self
    }

    pub fn offset(&mut self, n: usize) -> &mut Self {
        self.offset_val = Some(n);
        self
    }

    /// Build the final SQL string and parameter list.
    pub fn build(&self) -> (String, Vec<SqlParam>) {
        let mut parts = vec![format!("SELECT {}", self.select_cols.join(", "))];
        parts.extend(self.from_and_where());

        if !self.order_by_cols.is_empty() {
            parts.push(format!("ORDER BY {}", self.order_by_cols.join(", ")));
        }

        if let Some(n) = self.limit_val {
            parts.push(format!("LIMIT {}", n));
        }

        if let Some(n) = self.offset_val {
            parts.push(format!("OFFSET {}", n));
        }

        (parts.join("\n"), self.params.clone())
    }

    /// Build `SELECT COUNT(*)` over the same FROM/JOIN/WHERE, ignoring
    /// ordering and paging.
    pub fn build_count(&self) -> (String, Vec<SqlParam>) {
        let mut parts = vec!["SELECT COUNT(*)".to_string()];
        parts.extend(self.from_and_where());
        (parts.join("\n"), self.params.clone())
    }

    fn from_and_where(&self) -> Vec<String> {
        let mut parts = vec![format!("FROM {}", self.from_table)];
        parts.extend(self.joins.iter().cloned());
        if !self.where_clauses.is_empty() {
            parts.push(format!("WHERE {}", self.where_clauses.join(" AND ")));
        }
        parts
    }
}

/// Escape LIKE wildcards so `text` matches literally inside a pattern
/// built for [`SqlBuilder::where_like`].
pub fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
