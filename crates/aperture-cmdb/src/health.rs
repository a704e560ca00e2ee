//! Liveness and schema introspection.

use serde::Serialize;
use sqlx::sqlite::SqlitePool;

use aperture_orm::{Database, Result};

/// Result of a successful [`health`] check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Health {
    /// Always `"ok"`.
    pub status: &'static str,
    /// Database file, absent for in-memory databases.
    pub db_path: Option<String>,
}

/// Pings the database.
pub async fn health(db: &Database) -> Result<Health> {
    db.ping().await?;
    Ok(Health {
        status: "ok",
        db_path: db.path().map(|p| p.display().to_string()),
    })
}

/// A user table and the DDL that created it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableInfo {
    pub name: String,
    pub sql: String,
}

/// User tables ordered by name, SQLite internals excluded.
pub async fn schema_tables(pool: &SqlitePool) -> Result<Vec<TableInfo>> {
    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT name, sql FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
         ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(|(name, sql)| TableInfo { name, sql })
        .collect())
}
