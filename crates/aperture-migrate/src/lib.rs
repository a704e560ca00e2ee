//! Ordered, transactional SQL script migrations.
//!
//! `aperture-migrate` brings a SQLite database up to date by applying plain
//! `.sql` scripts:
//! - Scripts are applied in lexical name order, so names carry a numeric prefix
//! - Each script runs in its own transaction together with its ledger row
//! - The first failing script stops the run; earlier scripts stay applied
//! - Already-applied names are skipped, so running twice is a no-op
//!
//! # Example
//!
//! ```rust,ignore
//! use aperture_migrate::{EmbeddedSource, MigrationRunner, RunOutcome};
//! use aperture_orm::{Database, DatabaseConfig};
//!
//! let db = Database::open(&DatabaseConfig::from_env()?).await?;
//! let runner = MigrationRunner::for_database(&db, EmbeddedSource::bundled());
//! match runner.run().await? {
//!     RunOutcome::NoPending => println!("up to date"),
//!     RunOutcome::AllApplied(names) => println!("applied {names:?}"),
//! }
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Apply pending migrations (the default command)
//! aperture-migrate up
//!
//! # Use scripts from a directory instead of the bundled schema
//! aperture-migrate --migrations-dir ./sql up
//!
//! # Show applied migrations
//! aperture-migrate status
//! ```

pub mod error;
pub mod ledger;
pub mod runner;
pub mod source;

pub use error::{MigrateError, Result};
pub use ledger::{MigrationLedger, MigrationRecord};
pub use runner::{MigrationRunner, RunOutcome};
pub use source::{DirSource, EmbeddedSource, ScriptSource};
