//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: repository registry and documentation storage
    r#"
    -- ============================================
    -- Repository registry
    -- ============================================

    -- One row per connected GitHub repository. github_repo_id is unique
    -- across ALL rows, not per user: a repository can be connected once,
    -- system-wide. created_at defaults to insertion time in UTC.
    CREATE TABLE IF NOT EXISTS repos (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_user_id    TEXT NOT NULL,
        github_repo_id   INTEGER NOT NULL UNIQUE,
        name             TEXT NOT NULL,
        html_url         TEXT,
        github_token     TEXT,
        created_at       TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
    );

    CREATE INDEX IF NOT EXISTS idx_repos_owner ON repos(owner_user_id);
    CREATE INDEX IF NOT EXISTS idx_repos_created ON repos(created_at DESC);

    -- ============================================
    -- Documentation runs and their ordered chunks
    -- ============================================

    CREATE TABLE IF NOT EXISTS documentation (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        repo_id          INTEGER NOT NULL REFERENCES repos(id) ON DELETE CASCADE,
        generated_at     TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_documentation_repo ON documentation(repo_id);

    CREATE TABLE IF NOT EXISTS documentation_chunks (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        documentation_id INTEGER NOT NULL REFERENCES documentation(id) ON DELETE CASCADE,
        chunk_index      INTEGER NOT NULL,
        content          TEXT NOT NULL,

        UNIQUE(documentation_id, chunk_index)
    );

    CREATE INDEX IF NOT EXISTS idx_chunks_doc ON documentation_chunks(documentation_id, chunk_index);
    "#,
];

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version: i32 = conn
        .query_row("PRAGMA user_version", [], |r| r.get(0))
        .unwrap_or(0);

    tracing::info!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking database migrations"
    );

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration)?;
            conn.execute(&format!("PRAGMA user_version = {}", version), [])?;
        }
    }

    if current_version < SCHEMA_VERSION {
        tracing::info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Migrations complete"
        );
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> crate::error::Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}
