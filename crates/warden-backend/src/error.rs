//! Store errors.

use thiserror::Error;

/// Errors surfaced by an [`AdminBackend`](crate::AdminBackend).
///
/// None of these are retryable from Warden's point of view; callers treat
/// every variant as terminal for the current call.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("conflict: {0}")]
    Conflict(String),

    /// A stored procedure rejected the transition (e.g. suspending an
    /// already-suspended organization).
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("corrupt row: {0}")]
    CorruptRow(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl BackendError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Whether the store reported the row missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Database(sqlx::Error::RowNotFound))
    }
}

/// Result alias for store calls.
pub type BackendResult<T> = Result<T, BackendError>;
