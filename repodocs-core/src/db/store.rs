//! Database store layer
//!
//! Query and insert operations for connected repositories, documentation
//! runs, and chunks. Every repository operation takes the owning-user id
//! and scopes its SQL to it; reads for another user's rows come back as
//! "not found" rather than "forbidden" so callers cannot probe for ids.

use crate::error::{Error, Result};
use crate::types::*;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::PathBuf;
use std::sync::Mutex;

/// Database handle with connection pooling (single connection for now)
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &PathBuf) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable foreign keys and WAL mode for better concurrency
        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        super::schema::run_migrations(&conn)
    }

    /// Get the current schema version
    pub fn schema_version(&self) -> Result<i32> {
        let conn = self.conn.lock().unwrap();
        super::schema::get_schema_version(&conn)
    }

    /// Get the underlying connection (for advanced use)
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }

    // ============================================
    // Repository operations
    // ============================================

    /// Connect a repository for a user, returning the persisted row.
    ///
    /// The database assigns id and created_at. Fails with
    /// [`Error::DuplicateRepo`] if any user has already connected the same
    /// GitHub repository.
    pub fn save_repo(&self, owner_user_id: &str, new_repo: &NewRepo) -> Result<RepoRecord> {
        let conn = self.conn.lock().unwrap();

        let result = conn.execute(
            r#"
            INSERT INTO repos (owner_user_id, github_repo_id, name, html_url, github_token)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                owner_user_id,
                new_repo.github_repo_id,
                new_repo.name,
                new_repo.html_url,
                new_repo.github_token,
            ],
        );

        match result {
            Ok(_) => {
                let id = conn.last_insert_rowid();
                conn.query_row("SELECT * FROM repos WHERE id = ?", [id], Self::row_to_repo)
                    .map_err(Error::from)
            }
            Err(e) if is_github_id_conflict(&e) => {
                Err(Error::DuplicateRepo(new_repo.github_repo_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// List a user's repositories, most recently connected first.
    pub fn list_repos(&self, owner_user_id: &str) -> Result<Vec<RepoRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM repos
            WHERE owner_user_id = ?1
            ORDER BY created_at DESC, id DESC
            "#,
        )?;

        let repos = stmt
            .query_map([owner_user_id], Self::row_to_repo)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(repos)
    }

    /// List a user's repositories with documentation stats attached.
    ///
    /// One aggregate query; list views should never look up docs per row.
    /// The latest run's id and timestamp both come from the same
    /// `documentation` row, the one with the newest `generated_at`
    /// (id breaks ties).
    pub fn list_repos_with_docs(&self, owner_user_id: &str) -> Result<Vec<RepoSummary>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT
                r.id, r.owner_user_id, r.github_repo_id, r.name,
                r.html_url, r.github_token, r.created_at,
                (SELECT COUNT(*) FROM documentation d WHERE d.repo_id = r.id) AS doc_count,
                latest.id AS latest_doc_id,
                latest.generated_at AS latest_generated_at
            FROM repos r
            LEFT JOIN documentation latest ON latest.id = (
                SELECT d.id FROM documentation d
                WHERE d.repo_id = r.id
                ORDER BY d.generated_at DESC, d.id DESC
                LIMIT 1
            )
            WHERE r.owner_user_id = ?1
            ORDER BY r.created_at DESC, r.id DESC
            "#,
        )?;

        let summaries = stmt
            .query_map([owner_user_id], |row| {
                let latest_generated_at: Option<String> = row.get("latest_generated_at")?;
                Ok(RepoSummary {
                    repo: Self::row_to_repo(row)?,
                    doc_count: row.get("doc_count")?,
                    latest_doc_id: row.get("latest_doc_id")?,
                    latest_generated_at: latest_generated_at.and_then(|ts| {
                        DateTime::parse_from_rfc3339(&ts)
                            .ok()
                            .map(|dt| dt.with_timezone(&Utc))
                    }),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(summaries)
    }

    /// Get one of the user's repositories by id.
    pub fn get_repo(&self, owner_user_id: &str, id: i64) -> Result<Option<RepoRecord>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT * FROM repos WHERE id = ?1 AND owner_user_id = ?2",
            params![id, owner_user_id],
            Self::row_to_repo,
        )
        .optional()
        .map_err(Error::from)
    }

    /// Delete one of the user's repositories.
    ///
    /// Fails with [`Error::RepoNotFound`] when the row does not exist or
    /// belongs to another user; the two cases are indistinguishable.
    /// Documentation rows and chunks go with it via ON DELETE CASCADE.
    pub fn delete_repo(&self, owner_user_id: &str, id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let affected = conn.execute(
            "DELETE FROM repos WHERE id = ?1 AND owner_user_id = ?2",
            params![id, owner_user_id],
        )?;

        if affected == 0 {
            return Err(Error::RepoNotFound(id));
        }
        tracing::info!(repo_id = id, "Deleted repository");
        Ok(())
    }

    fn row_to_repo(row: &Row) -> rusqlite::Result<RepoRecord> {
        let created_at_str: String = row.get("created_at")?;

        Ok(RepoRecord {
            id: row.get("id")?,
            owner_user_id: row.get("owner_user_id")?,
            github_repo_id: row.get("github_repo_id")?,
            name: row.get("name")?,
            html_url: row.get("html_url")?,
            github_token: row.get("github_token")?,
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }

    // ============================================
    // Documentation operations
    // ============================================

    /// Store a new documentation run for a repository.
    pub fn insert_documentation(&self, repo_id: i64, generated_at: DateTime<Utc>) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO documentation (repo_id, generated_at) VALUES (?1, ?2)",
            params![repo_id, generated_at.to_rfc3339()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Store one chunk of a documentation run.
    pub fn insert_chunk(
        &self,
        documentation_id: i64,
        chunk_index: i64,
        content: &str,
    ) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO documentation_chunks (documentation_id, chunk_index, content)
            VALUES (?1, ?2, ?3)
            "#,
            params![documentation_id, chunk_index, content],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Store a documentation run and all of its chunks in one transaction.
    ///
    /// Chunks get ascending `chunk_index` values from their position in the
    /// slice. Either the run row and every chunk are written, or a failure
    /// part way through rolls the whole insert back.
    pub fn insert_documentation_with_chunks(
        &self,
        repo_id: i64,
        generated_at: DateTime<Utc>,
        chunks: &[String],
    ) -> Result<i64> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO documentation (repo_id, generated_at) VALUES (?1, ?2)",
            params![repo_id, generated_at.to_rfc3339()],
        )?;
        let documentation_id = tx.last_insert_rowid();

        for (chunk_index, content) in chunks.iter().enumerate() {
            tx.execute(
                r#"
                INSERT INTO documentation_chunks (documentation_id, chunk_index, content)
                VALUES (?1, ?2, ?3)
                "#,
                params![documentation_id, chunk_index as i64, content],
            )?;
        }

        tx.commit()?;
        Ok(documentation_id)
    }

    /// Load a documentation run with its owning repository, scoped to the
    /// requesting user.
    ///
    /// Returns `None` both when the run does not exist and when it belongs
    /// to a repository the user did not connect. Callers must treat the two
    /// identically.
    pub fn get_documentation(
        &self,
        owner_user_id: &str,
        documentation_id: i64,
    ) -> Result<Option<DocumentationView>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            r#"
            SELECT
                d.id, d.repo_id, d.generated_at,
                r.name AS repo_name,
                r.html_url AS repo_url
            FROM documentation d
            JOIN repos r ON d.repo_id = r.id
            WHERE d.id = ?1 AND r.owner_user_id = ?2
            "#,
            params![documentation_id, owner_user_id],
            |row| {
                let generated_at_str: String = row.get("generated_at")?;
                Ok(DocumentationView {
                    id: row.get("id")?,
                    repo_id: row.get("repo_id")?,
                    generated_at: DateTime::parse_from_rfc3339(&generated_at_str)
                        .map(|dt| dt.with_timezone(&Utc))
                        .unwrap_or_else(|_| Utc::now()),
                    repo_name: row.get("repo_name")?,
                    repo_url: row.get("repo_url")?,
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    /// Load the chunks of a documentation run in strictly ascending
    /// chunk_index order.
    pub fn list_chunks(&self, documentation_id: i64) -> Result<Vec<DocChunk>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT id, documentation_id, chunk_index, content
            FROM documentation_chunks
            WHERE documentation_id = ?1
            ORDER BY chunk_index ASC
            "#,
        )?;

        let chunks = stmt
            .query_map([documentation_id], |row| {
                Ok(DocChunk {
                    id: row.get("id")?,
                    documentation_id: row.get("documentation_id")?,
                    chunk_index: row.get("chunk_index")?,
                    content: row.get("content")?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(chunks)
    }
}

/// True when an insert failed because repos.github_repo_id is already taken.
fn is_github_id_conflict(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, Some(msg)) => {
            e.code == rusqlite::ErrorCode::ConstraintViolation && msg.contains("github_repo_id")
        }
        _ => false,
    }
}
