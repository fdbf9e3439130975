//! Error types for repodocs-core

use thiserror::Error;

/// Main error type for the repodocs-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// GitHub API error
    #[error("GitHub error: {0}")]
    Github(String),

    /// Another row already holds this GitHub repository id
    #[error("repository already connected (GitHub id {0})")]
    DuplicateRepo(i64),

    /// Repository not found for the requesting user
    #[error("repository not found: {0}")]
    RepoNotFound(i64),

    /// Documentation not found for the requesting user.
    ///
    /// Carries the id as the caller supplied it, so a malformed id reads
    /// exactly like one that is not there.
    #[error("documentation not found: {0}")]
    DocumentationNotFound(String),
}

/// Result type alias for repodocs-core
pub type Result<T> = std::result::Result<T, Error>;
