//! Database handle and location config.
//!
//! The handle is built once by the composition root and passed by reference
//! to repositories and the migration runner. Journal mode and foreign-key
//! enforcement are set here, per connection.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::error::{OrmError, Result};

/// Environment variable overriding the database file location.
pub const DB_PATH_ENV: &str = "APERTURE_DB_PATH";

/// Where and how to open the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Database file path.
    pub path: PathBuf,
    /// Pool size.
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// Config for an explicit file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_connections: 5,
        }
    }

    /// Reads `APERTURE_DB_PATH`, defaulting to `~/.aperture/aperture.db`.
    pub fn from_env() -> Result<Self> {
        match std::env::var(DB_PATH_ENV) {
            Ok(path) if !path.is_empty() => Ok(Self::new(path)),
            _ => Self::default_location().map(Self::new),
        }
    }

    /// `~/.aperture/aperture.db`.
    pub fn default_location() -> Result<PathBuf> {
        let home = std::env::var_os("HOME")
            .filter(|h| !h.is_empty())
            .ok_or_else(|| OrmError::Config("cannot determine home directory".to_string()))?;
        Ok(PathBuf::from(home).join(".aperture").join("aperture.db"))
    }

    /// Sets the pool size.
    #[must_use]
    pub fn max_connections(mut self, n: u32) -> Self {
        self.max_connections = n.max(1);
        self
    }
}

/// An open SQLite database.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    path: Option<PathBuf>,
}

impl Database {
    /// Opens (creating if needed) the database file with WAL journaling and
    /// foreign keys on, then verifies the connection.
    pub async fn open(config: &DatabaseConfig) -> Result<Self> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        let db = Self {
            pool,
            path: Some(config.path.clone()),
        };
        db.ping().await?;
        info!(path = %config.path.display(), "Database opened");
        Ok(db)
    }

    /// Opens a private in-memory database on a single connection.
    ///
    /// The connection is never reaped: the database lives exactly as long as
    /// that connection does.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        debug!("In-memory database opened");
        Ok(Self { pool, path: None })
    }

    /// Wraps an existing pool.
    #[must_use]
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool, path: None }
    }

    /// Returns the connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns the database file path; `None` for in-memory databases.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Round-trips a trivial statement.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Closes every pooled connection.
    pub async fn close(self) {
        self.pool.close().await;
    }
}
