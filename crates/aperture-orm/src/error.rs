//! Error types for the CRUD engine.

use thiserror::Error;

/// Errors surfaced by repository operations.
#[derive(Debug, Error)]
pub enum OrmError {
    /// Storage engine, connection or constraint failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// No row matched the given key.
    #[error("not found")]
    NotFound,

    /// Malformed or missing input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Filesystem error while preparing the database location.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The database location could not be resolved.
    #[error("configuration error: {0}")]
    Config(String),
}

impl OrmError {
    /// Shorthand for a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Returns true for errors that leave stored state untouched and are
    /// the caller's to fix.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::NotFound | Self::Validation(_))
    }
}

/// Result type alias for repository operations.
pub type Result<T> = std::result::Result<T, OrmError>;
