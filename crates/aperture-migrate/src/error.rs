//! Error types for the migration runner.

use std::path::PathBuf;

use aperture_orm::OrmError;

/// Errors that can occur during migration operations.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// Database error outside of a script's transaction.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// IO error reading scripts.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error opening the database.
    #[error(transparent)]
    Orm(#[from] OrmError),

    /// A script failed; its transaction was rolled back and no later script
    /// was attempted.
    #[error("Migration '{name}' failed: {source}")]
    Failed {
        /// Script name.
        name: String,
        /// Underlying failure.
        source: sqlx::Error,
    },

    /// A listed script could not be read back.
    #[error("Migration script not found: {0}")]
    ScriptNotFound(String),

    /// The migrations directory does not exist.
    #[error("Migrations directory not found: {0}")]
    MigrationsDirNotFound(PathBuf),

    /// The ledger holds data the runner cannot interpret.
    #[error("Invalid migration state: {0}")]
    InvalidState(String),
}

impl MigrateError {
    pub(crate) fn failed(name: &str, source: sqlx::Error) -> Self {
        Self::Failed {
            name: name.to_string(),
            source,
        }
    }
}

/// Result type for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
