//! Migration runner.
//!
//! Applies pending scripts in lexical name order, each in its own
//! transaction together with its ledger row. Two runners pointed at the same
//! database at the same time are not coordinated.

use sqlx::sqlite::SqlitePool;
use tracing::{debug, info, warn};

use aperture_orm::Database;

use crate::error::{MigrateError, Result};
use crate::ledger::{MigrationLedger, MigrationRecord};
use crate::source::{is_script, ScriptSource};

/// What a successful [`MigrationRunner::run`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Nothing to apply; the database was not touched beyond the ledger
    /// table.
    NoPending,
    /// These scripts were applied, in order.
    AllApplied(Vec<String>),
}

impl RunOutcome {
    /// Names applied by this run.
    #[must_use]
    pub fn applied(&self) -> &[String] {
        match self {
            Self::NoPending => &[],
            Self::AllApplied(names) => names,
        }
    }
}

/// Applies scripts from a [`ScriptSource`].
pub struct MigrationRunner<S: ScriptSource> {
    pool: SqlitePool,
    source: S,
    ledger: MigrationLedger,
}

impl<S: ScriptSource> MigrationRunner<S> {
    /// Creates a runner over `pool`.
    pub fn new(pool: SqlitePool, source: S) -> Self {
        let ledger = MigrationLedger::new(pool.clone());
        Self {
            pool,
            source,
            ledger,
        }
    }

    /// Creates a runner for an open database.
    pub fn for_database(db: &Database, source: S) -> Self {
        Self::new(db.pool().clone(), source)
    }

    /// Returns the ledger.
    #[must_use]
    pub fn ledger(&self) -> &MigrationLedger {
        &self.ledger
    }

    /// Returns the script source.
    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Names not yet in the ledger, in application order.
    pub async fn pending(&self) -> Result<Vec<String>> {
        self.ledger.ensure_table().await?;
        let applied = self.ledger.applied_names().await?;

        let mut pending: Vec<String> = self
            .source
            .list()
            .await?
            .into_iter()
            .filter(|name| is_script(name) && !applied.contains(name))
            .collect();
        pending.sort();
        pending.dedup();
        Ok(pending)
    }

    /// Applies every pending script.
    ///
    /// Stops at the first failure. Scripts committed before it stay applied;
    /// the failed one and those after it are retried by the next run.
    pub async fn run(&self) -> Result<RunOutcome> {
        let pending = self.pending().await?;
        if pending.is_empty() {
            info!("No pending migrations");
            return Ok(RunOutcome::NoPending);
        }

        for name in &pending {
            let body = self.source.read(name).await?;
            self.apply(name, &body).await?;
        }

        Ok(RunOutcome::AllApplied(pending))
    }

    /// Applied scripts, ordered by name. Read-only: a database without a
    /// ledger reports no records and is left untouched.
    pub async fn status(&self) -> Result<Vec<MigrationRecord>> {
        if !self.ledger.exists().await? {
            return Ok(Vec::new());
        }
        self.ledger.records().await
    }

    async fn apply(&self, name: &str, body: &str) -> Result<()> {
        info!(name = %name, "Applying migration");
        debug!(name = %name, sql = %body, "Executing script");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| MigrateError::failed(name, e))?;

        let executed = match sqlx::raw_sql(body).execute(&mut *tx).await {
            Ok(_) => MigrationLedger::record(&mut tx, name).await,
            Err(e) => Err(e),
        };

        if let Err(e) = executed {
            warn!(name = %name, error = %e, "Migration failed, rolling back");
            if let Err(rollback) = tx.rollback().await {
                warn!(name = %name, error = %rollback, "Rollback failed");
            }
            return Err(MigrateError::failed(name, e));
        }

        tx.commit()
            .await
            .map_err(|e| MigrateError::failed(name, e))?;

        info!(name = %name, "Migration applied successfully");
        Ok(())
    }
}
