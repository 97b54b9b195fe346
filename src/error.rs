/// Broad failure classes callers branch on.
///
/// `Validation` and `Conflict` are user-correctable, `NotFound` degrades to a
/// zero value or a re-fetch, `Unauthorized` is a hard stop, and `Network` is
/// transient and safe to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Unauthorized,
    Network,
    Conflict,
    Internal,
}

#[derive(Debug, thiserror::Error)]
pub enum DeckError {
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DeckError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DeckError::Http(_) => ErrorKind::Network,
            DeckError::NotFound(_) => ErrorKind::NotFound,
            DeckError::InvalidArgument(_) => ErrorKind::Validation,
            DeckError::Unauthorized(_) => ErrorKind::Unauthorized,
            DeckError::Conflict(_) => ErrorKind::Conflict,
            DeckError::DuckDb(_)
            | DeckError::Io(_)
            | DeckError::Json(_)
            | DeckError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether repeating the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Network
    }
}

pub type Result<T> = std::result::Result<T, DeckError>;
