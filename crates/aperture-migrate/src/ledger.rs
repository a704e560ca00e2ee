//! Migration ledger.
//!
//! The `migrations` table records which scripts have been applied. Rows are
//! only ever inserted, inside the same transaction as the script they
//! describe.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::{SqliteConnection, SqlitePool};

use crate::error::{MigrateError, Result};

/// SQL to create the ledger table.
pub const CREATE_LEDGER_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS migrations (
    name TEXT PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
)
"#;

/// A record of an applied script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationRecord {
    /// Script name.
    pub name: String,
    /// When the script was applied.
    pub applied_at: DateTime<Utc>,
}

/// Reads the ledger.
#[derive(Debug, Clone)]
pub struct MigrationLedger {
    pool: SqlitePool,
}

impl MigrationLedger {
    /// Creates a ledger over `pool`.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Ensures the ledger table exists.
    pub async fn ensure_table(&self) -> Result<()> {
        sqlx::query(CREATE_LEDGER_TABLE_SQL)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Checks whether the ledger table exists, without creating it.
    pub async fn exists(&self) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'migrations'",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    /// Names of all applied scripts.
    pub async fn applied_names(&self) -> Result<HashSet<String>> {
        let names: Vec<String> = sqlx::query_scalar("SELECT name FROM migrations")
            .fetch_all(&self.pool)
            .await?;
        Ok(names.into_iter().collect())
    }

    /// Checks whether `name` has been applied.
    pub async fn is_applied(&self, name: &str) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM migrations WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// All records, ordered by name.
    pub async fn records(&self) -> Result<Vec<MigrationRecord>> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT name, applied_at FROM migrations ORDER BY name")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter()
            .map(|(name, applied_at)| -> Result<MigrationRecord> {
                Ok(MigrationRecord {
                    applied_at: parse_applied_at(&applied_at)?,
                    name,
                })
            })
            .collect()
    }

    /// Records `name` as applied on `conn`, which must be inside the
    /// script's transaction.
    pub(crate) async fn record(conn: &mut SqliteConnection, name: &str) -> sqlx::Result<()> {
        sqlx::query("INSERT INTO migrations (name) VALUES (?)")
            .bind(name)
            .execute(conn)
            .await?;
        Ok(())
    }
}

/// Parses an `applied_at` value, accepting RFC 3339 and SQLite's
/// `datetime('now')` format.
pub fn parse_applied_at(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc())
        .map_err(|_| MigrateError::InvalidState(format!("unreadable applied_at '{s}'")))
}
