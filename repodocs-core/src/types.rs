//! Core domain types for repodocs
//!
//! These types represent the canonical data model shared by the CLI tools
//! and the dashboard: connected repositories, documentation runs, and the
//! ordered chunks a run is rendered from.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Owning user** | The identity that connected a repository; scopes every read and delete |
//! | **GitHub repo id** | Immutable id assigned by GitHub; unique across all rows, all users |
//! | **Documentation run** | One stored generation of docs for a repository |
//! | **Chunk** | An ordered fragment of pre-rendered HTML belonging to a run |
//!
//! A repository row is created when connected, read when listed, and deleted
//! on explicit request. It is never updated in place; reconnecting the same
//! GitHub repository is rejected instead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================
// Repositories
// ============================================

/// A GitHub repository connected by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoRecord {
    /// Surrogate key assigned by the database
    pub id: i64,
    /// Identity that connected the repository
    pub owner_user_id: String,
    /// GitHub's id for the repository, unique across all rows
    pub github_repo_id: i64,
    /// Repository name
    pub name: String,
    /// Web URL of the repository, when known
    pub html_url: Option<String>,
    /// Access token captured at connect time (never serialized back out)
    #[serde(skip_serializing, default)]
    pub github_token: Option<String>,
    /// When the repository was connected
    pub created_at: DateTime<Utc>,
}

/// Descriptor for a repository about to be connected.
///
/// `github_repo_id` comes from the source platform and never changes.
#[derive(Debug, Clone)]
pub struct NewRepo {
    pub github_repo_id: i64,
    pub name: String,
    pub html_url: Option<String>,
    pub github_token: Option<String>,
}

/// Repository list row with documentation stats pre-computed.
///
/// Aggregated in a single query so list views never issue per-row lookups.
#[derive(Debug, Clone)]
pub struct RepoSummary {
    pub repo: RepoRecord,
    /// Number of documentation runs stored for this repository
    pub doc_count: i64,
    /// Most recently stored documentation id, if any
    pub latest_doc_id: Option<i64>,
    /// When the most recent run was generated, if any
    pub latest_generated_at: Option<DateTime<Utc>>,
}

impl RepoSummary {
    /// Whether at least one documentation run exists.
    pub fn has_docs(&self) -> bool {
        self.doc_count > 0
    }
}

// ============================================
// Documentation
// ============================================

/// A documentation run stored for a connected repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Documentation {
    pub id: i64,
    pub repo_id: i64,
    pub generated_at: DateTime<Utc>,
}

/// Documentation joined with its owning repository.
///
/// Produced by the reader's authorization query; absence means the run
/// either does not exist or belongs to another user, and callers must not
/// distinguish the two.
#[derive(Debug, Clone)]
pub struct DocumentationView {
    pub id: i64,
    pub repo_id: i64,
    pub generated_at: DateTime<Utc>,
    /// Name of the owning repository
    pub repo_name: String,
    /// Web URL of the owning repository
    pub repo_url: Option<String>,
}

/// One ordered fragment of rendered documentation.
///
/// `chunk_index` defines render order; readers always receive chunks in
/// strictly ascending index order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocChunk {
    pub id: i64,
    pub documentation_id: i64,
    pub chunk_index: i64,
    /// Pre-rendered HTML, stored and emitted verbatim
    pub content: String,
}

// ============================================
// Upstream (GitHub) descriptors
// ============================================

/// A repository as described by the GitHub API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubRepo {
    pub id: i64,
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub html_url: String,
    #[serde(default)]
    pub private: bool,
}

impl GithubRepo {
    /// Build the connect descriptor for this repository.
    pub fn to_new_repo(&self, token: Option<String>) -> NewRepo {
        NewRepo {
            github_repo_id: self.id,
            name: self.name.clone(),
            html_url: Some(self.html_url.clone()),
            github_token: token,
        }
    }

    /// Short visibility label for list views.
    pub fn visibility(&self) -> &'static str {
        if self.private {
            "private"
        } else {
            "public"
        }
    }
}
