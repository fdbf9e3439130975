//! Import pre-rendered documentation fragments
//!
//! A documentation run is built from HTML fragment files: one file per
//! chunk, chunk_index assigned from the lexicographic order of file names.
//! Generators that care about chunk order number their files
//! (`000-intro.html`, `010-usage.html`, ...).

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::db::Database;
use crate::error::{Error, Result};

/// What an import produced.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    /// Id of the new documentation run
    pub documentation_id: i64,
    /// Number of chunks stored
    pub chunks_imported: usize,
}

/// Discover the fragment files for an import.
///
/// A single file is taken as-is; a directory contributes its `*.html`
/// entries in lexicographic order.
pub fn collect_fragment_files(source: &Path) -> Result<Vec<PathBuf>> {
    if source.is_file() {
        return Ok(vec![source.to_path_buf()]);
    }

    if !source.is_dir() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no such file or directory: {}", source.display()),
        )));
    }

    let pattern = source.join("*.html");
    let entries = glob::glob(&pattern.to_string_lossy())
        .map_err(|e| Error::Config(format!("invalid fragment pattern: {}", e)))?;

    let mut files: Vec<PathBuf> = entries.flatten().filter(|p| p.is_file()).collect();
    files.sort();
    Ok(files)
}

/// Import a documentation run for one of the user's repositories.
///
/// The repository must exist and belong to `owner_user_id`; otherwise the
/// import fails with [`Error::RepoNotFound`], exactly as if the id did not
/// exist. Every fragment is read before anything is written, and the run
/// plus its chunks land in a single transaction, so a failed import leaves
/// no rows behind. An empty fragment set is allowed and produces a run
/// that renders as the explicit empty state.
pub fn import_documentation(
    db: &Database,
    owner_user_id: &str,
    repo_id: i64,
    source: &Path,
    generated_at: Option<DateTime<Utc>>,
) -> Result<ImportOutcome> {
    let repo = db
        .get_repo(owner_user_id, repo_id)?
        .ok_or(Error::RepoNotFound(repo_id))?;

    let files = collect_fragment_files(source)?;
    if files.is_empty() {
        tracing::warn!(
            repo_id,
            source = %source.display(),
            "No fragment files found, importing an empty documentation run"
        );
    }

    let mut contents = Vec::with_capacity(files.len());
    for path in &files {
        contents.push(std::fs::read_to_string(path)?);
    }

    let documentation_id = db.insert_documentation_with_chunks(
        repo.id,
        generated_at.unwrap_or_else(Utc::now),
        &contents,
    )?;

    tracing::info!(
        repo_id,
        documentation_id,
        chunks = contents.len(),
        "Imported documentation run"
    );

    Ok(ImportOutcome {
        documentation_id,
        chunks_imported: contents.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NewRepo;

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    fn connect_repo(db: &Database, owner: &str) -> i64 {
        db.save_repo(
            owner,
            &NewRepo {
                github_repo_id: 500,
                name: "demo".to_string(),
                html_url: None,
                github_token: None,
            },
        )
        .unwrap()
        .id
    }

    #[test]
    fn test_import_orders_chunks_by_file_name() {
        let db = test_db();
        let repo_id = connect_repo(&db, "user_a");

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("020-usage.html"), "<p>usage</p>").unwrap();
        std::fs::write(dir.path().join("010-intro.html"), "<p>intro</p>").unwrap();
        std::fs::write(dir.path().join("030-faq.html"), "<p>faq</p>").unwrap();
        // Non-html files are ignored
        std::fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();

        let outcome =
            import_documentation(&db, "user_a", repo_id, dir.path(), None).unwrap();
        assert_eq!(outcome.chunks_imported, 3);

        let chunks = db.list_chunks(outcome.documentation_id).unwrap();
        let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["<p>intro</p>", "<p>usage</p>", "<p>faq</p>"]);
        assert_eq!(chunks[0].chunk_index, 0);
        assert_eq!(chunks[2].chunk_index, 2);
    }

    #[test]
    fn test_import_single_file() {
        let db = test_db();
        let repo_id = connect_repo(&db, "user_a");

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("all.html");
        std::fs::write(&file, "<h1>Everything</h1>").unwrap();

        let outcome = import_documentation(&db, "user_a", repo_id, &file, None).unwrap();
        assert_eq!(outcome.chunks_imported, 1);
    }

    #[test]
    fn test_import_requires_owning_user() {
        let db = test_db();
        let repo_id = connect_repo(&db, "user_a");

        let dir = tempfile::tempdir().unwrap();
        let err =
            import_documentation(&db, "user_b", repo_id, dir.path(), None).unwrap_err();
        assert!(matches!(err, Error::RepoNotFound(_)));

        // Nothing was stored
        assert!(db
            .list_repos_with_docs("user_a")
            .unwrap()
            .iter()
            .all(|s| s.doc_count == 0));
    }

    #[test]
    fn test_import_empty_dir_creates_empty_run() {
        let db = test_db();
        let repo_id = connect_repo(&db, "user_a");

        let dir = tempfile::tempdir().unwrap();
        let outcome =
            import_documentation(&db, "user_a", repo_id, dir.path(), None).unwrap();
        assert_eq!(outcome.chunks_imported, 0);

        let view = db
            .get_documentation("user_a", outcome.documentation_id)
            .unwrap()
            .unwrap();
        assert!(db.list_chunks(view.id).unwrap().is_empty());
    }

    #[test]
    fn test_import_missing_source_fails() {
        let db = test_db();
        let repo_id = connect_repo(&db, "user_a");

        let err = import_documentation(
            &db,
            "user_a",
            repo_id,
            Path::new("/nonexistent/fragments"),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_failed_import_leaves_no_rows() {
        let db = test_db();
        let repo_id = connect_repo(&db, "user_a");

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("01-good.html"), "<p>fine</p>").unwrap();
        // Not valid UTF-8, so reading this fragment fails
        std::fs::write(dir.path().join("02-bad.html"), b"\xff\xfe\xfd").unwrap();

        let err =
            import_documentation(&db, "user_a", repo_id, dir.path(), None).unwrap_err();
        assert!(matches!(err, Error::Io(_)));

        // No run was recorded, partial or otherwise
        let summary = &db.list_repos_with_docs("user_a").unwrap()[0];
        assert_eq!(summary.doc_count, 0);
        assert!(summary.latest_doc_id.is_none());
    }
}
