//! aperture-migrate CLI
//!
//! Applies the inventory schema to the Aperture database, or shows which
//! scripts have been applied.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

use aperture_migrate::{DirSource, EmbeddedSource, MigrationRunner, RunOutcome, ScriptSource};
use aperture_orm::{Database, DatabaseConfig, DB_PATH_ENV};

/// Ordered SQL migrations for the Aperture inventory database.
#[derive(Parser)]
#[command(name = "aperture-migrate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database file (defaults to ~/.aperture/aperture.db).
    #[arg(short, long, env = DB_PATH_ENV)]
    database: Option<PathBuf>,

    /// Read scripts from this directory instead of the bundled schema.
    #[arg(short, long)]
    migrations_dir: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Apply pending migrations (default).
    #[command(alias = "migrate")]
    Up,

    /// Show applied migrations.
    Status {
        /// Print records as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match cli.database {
        Some(path) => DatabaseConfig::new(path),
        None => DatabaseConfig::new(DatabaseConfig::default_location()?),
    };
    let db = Database::open(&config).await?;
    let command = cli.command.unwrap_or(Commands::Up);

    let result = match cli.migrations_dir {
        Some(dir) => {
            debug!(dir = %dir.display(), "Using migrations directory");
            execute(&db, &config, DirSource::new(dir), command).await
        }
        None => execute(&db, &config, EmbeddedSource::bundled(), command).await,
    };

    db.close().await;
    result
}

async fn execute<S: ScriptSource>(
    db: &Database,
    config: &DatabaseConfig,
    source: S,
    command: Commands,
) -> anyhow::Result<()> {
    let runner = MigrationRunner::for_database(db, source);

    match command {
        Commands::Up => {
            println!("Database: {}", config.path.display());
            println!("Running migrations...");

            match runner.run().await? {
                RunOutcome::NoPending => println!("No pending migrations."),
                RunOutcome::AllApplied(names) => {
                    for name in &names {
                        println!("  Applied: {name}");
                    }
                }
            }
            println!("Done.");
        }

        Commands::Status { json } => {
            let records = runner.status().await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else if records.is_empty() {
                println!("No migrations applied.");
            } else {
                println!("{:<40} APPLIED AT", "MIGRATION");
                println!("{:-<60}", "");
                for record in &records {
                    println!(
                        "{:<40} {}",
                        record.name,
                        record.applied_at.format("%Y-%m-%d %H:%M:%S")
                    );
                }
            }
        }
    }

    Ok(())
}
