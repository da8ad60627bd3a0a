//! Error types for the campaign store.

use rusqlite::ErrorCode;
use thiserror::Error;

/// Errors surfaced by [`CampaignStore`](super::CampaignStore) operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A convergence step failed; the store cannot be used.
    #[error("schema migration failed at step '{step}': {source}")]
    Migration {
        step: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// A uniqueness, foreign key or not-null constraint rejected the write.
    #[error("constraint violation: {0}")]
    Conflict(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// The request itself is unacceptable (empty name, unsupported bundle).
    #[error("invalid input: {0}")]
    Invalid(String),

    #[error("database error: {0}")]
    Database(rusqlite::Error),

    #[error("json encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, msg)
                if e.code == ErrorCode::ConstraintViolation =>
            {
                StoreError::Conflict(msg.clone().unwrap_or_else(|| e.to_string()))
            }
            _ => StoreError::Database(err),
        }
    }
}

impl StoreError {
    /// Wraps a rusqlite error raised while running the named convergence step.
    pub(crate) fn migration(step: &'static str) -> impl FnOnce(rusqlite::Error) -> StoreError {
        move |source| StoreError::Migration { step, source }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
