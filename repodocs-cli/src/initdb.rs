//! repodocs-init - one-shot database schema initialization
//!
//! Creates the repodocs database and its tables (repos, documentation,
//! documentation_chunks) if they do not exist, reports the result, and
//! exits. Safe to run any number of times: existing tables and data are
//! left untouched.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Database: $XDG_DATA_HOME/repodocs/repodocs.db (or REPODOCS_DB)
//! - Logs: $XDG_STATE_HOME/repodocs/repodocs.log

use anyhow::{Context, Result};
use clap::Parser;
use repodocs_core::{Config, Database};

#[derive(Parser)]
#[command(name = "repodocs-init")]
#[command(about = "Create the repodocs database schema")]
#[command(version)]
struct Args {}

fn main() -> Result<()> {
    let _args = Args::parse();

    Config::ensure_xdg_env();

    let config = Config::load().context("failed to load configuration")?;
    let _log_guard =
        repodocs_core::logging::init(&config.logging).context("failed to initialize logging")?;

    let db_path = config.database_path();
    tracing::info!(path = %db_path.display(), "Initializing database schema");

    let outcome = Database::open(&db_path).and_then(|db| {
        db.migrate()?;
        db.schema_version()
    });

    match outcome {
        Ok(version) => {
            println!("Database ready at {} (schema v{})", db_path.display(), version);
            tracing::info!(version, "Schema initialization complete");
            Ok(())
        }
        Err(e) => {
            eprintln!("Failed to initialize database: {e}");
            tracing::error!(error = %e, "Schema initialization failed");
            Err(e.into())
        }
    }
}
