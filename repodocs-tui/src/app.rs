//! Application state for the dashboard.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::widgets::TableState;
use repodocs_core::docs::documentation_page;
use repodocs_core::github::SyncGithubClient;
use repodocs_core::{Database, Error, GithubRepo, RepoSummary};

/// How long a status banner stays on screen.
pub const BANNER_TTL: Duration = Duration::from_secs(5);

/// Current view mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewMode {
    /// Connected repositories table
    #[default]
    Saved,
    /// GitHub repository browser for connecting new ones
    Browse,
}

/// Severity of a status banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Success,
    Error,
}

/// Transient status message shown above the table.
#[derive(Debug, Clone)]
pub struct Banner {
    pub kind: BannerKind,
    pub text: String,
    shown_at: Instant,
}

/// A removal waiting for explicit y/n confirmation.
#[derive(Debug, Clone)]
pub struct PendingDelete {
    pub repo_id: i64,
    pub repo_name: String,
}

/// Main application state.
pub struct App {
    /// Database connection
    db: Database,
    /// GitHub client, present only when a token is configured
    github: Option<SyncGithubClient>,
    /// User whose repositories are shown
    user: String,
    /// Token stored alongside newly connected repositories
    github_token: Option<String>,
    /// Directory rendered documentation pages are written to
    preview_dir: PathBuf,
    /// Current view mode
    pub view_mode: ViewMode,
    /// Connected repositories with documentation stats
    pub saved: Vec<RepoSummary>,
    /// Table selection state for the connected view
    pub table_state: TableState,
    /// Repositories fetched from GitHub for the browse view
    pub github_repos: Vec<GithubRepo>,
    /// Table selection state for the browse view
    pub github_table_state: TableState,
    /// Active search filter, applied to the current view's rows
    pub search_query: String,
    /// True while the search input has focus
    pub searching: bool,
    /// Status banner, cleared by tick() after BANNER_TTL
    pub banner: Option<Banner>,
    /// Removal awaiting confirmation, rendered as a modal
    pub pending_delete: Option<PendingDelete>,
    /// Wall-clock time of the last successful reload
    pub last_refreshed: Option<DateTime<Local>>,
    /// Whether the app should exit
    pub should_quit: bool,
}

impl App {
    /// Create a new App over the given database connection.
    pub fn new(
        db: Database,
        github: Option<SyncGithubClient>,
        user: String,
        github_token: Option<String>,
        preview_dir: PathBuf,
    ) -> Self {
        Self {
            db,
            github,
            user,
            github_token,
            preview_dir,
            view_mode: ViewMode::default(),
            saved: Vec::new(),
            table_state: TableState::default(),
            github_repos: Vec::new(),
            github_table_state: TableState::default(),
            search_query: String::new(),
            searching: false,
            banner: None,
            pending_delete: None,
            last_refreshed: None,
            should_quit: false,
        }
    }

    /// Reload connected repositories from the database.
    pub fn refresh_saved(&mut self) -> Result<()> {
        self.saved = self.db.list_repos_with_docs(&self.user)?;
        self.last_refreshed = Some(Local::now());
        self.clamp_selection();
        Ok(())
    }

    /// Case-insensitive substring match used by the search filter.
    pub fn row_matches(query: &str, haystack: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        haystack.to_lowercase().contains(&query.to_lowercase())
    }

    /// Indices into `saved` that pass the current search filter.
    pub fn visible_saved(&self) -> Vec<usize> {
        self.saved
            .iter()
            .enumerate()
            .filter(|(_, row)| Self::row_matches(&self.search_query, &row.repo.name))
            .map(|(i, _)| i)
            .collect()
    }

    /// Indices into `github_repos` that pass the current search filter.
    ///
    /// Matches on full name or description so typing an org name narrows
    /// the browse list the way it does on github.com.
    pub fn visible_github(&self) -> Vec<usize> {
        self.github_repos
            .iter()
            .enumerate()
            .filter(|(_, repo)| {
                Self::row_matches(&self.search_query, &repo.full_name)
                    || repo
                        .description
                        .as_deref()
                        .map(|d| Self::row_matches(&self.search_query, d))
                        .unwrap_or(false)
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// The connected row currently under the cursor, if any.
    fn selected_saved(&self) -> Option<RepoSummary> {
        let sel = self.table_state.selected()?;
        let idx = *self.visible_saved().get(sel)?;
        self.saved.get(idx).cloned()
    }

    /// The browse row currently under the cursor, if any.
    fn selected_github(&self) -> Option<GithubRepo> {
        let sel = self.github_table_state.selected()?;
        let idx = *self.visible_github().get(sel)?;
        self.github_repos.get(idx).cloned()
    }

    // ========== Connect Flow ==========

    /// Switch to the browse view, fetching the user's GitHub repositories.
    fn open_browse(&mut self) {
        let Some(client) = &self.github else {
            self.set_banner(BannerKind::Error, "GitHub token not configured".to_string());
            return;
        };
        match client.list_repos() {
            Ok(repos) => {
                self.github_repos = repos;
                self.github_table_state.select(if self.github_repos.is_empty() {
                    None
                } else {
                    Some(0)
                });
                self.search_query.clear();
                self.searching = false;
                self.view_mode = ViewMode::Browse;
            }
            Err(e) => {
                self.set_banner(BannerKind::Error, e.to_string());
            }
        }
    }

    /// Leave the browse view without connecting anything.
    fn close_browse(&mut self) {
        self.view_mode = ViewMode::Saved;
        self.search_query.clear();
        self.searching = false;
        self.clamp_selection();
    }

    /// Connect the selected GitHub repository for the current user.
    ///
    /// The saved list gets the new row immediately, then reloads from the
    /// database so counts and ordering are authoritative. A second connect
    /// of the same repository surfaces the duplicate error as a banner.
    fn connect_selected(&mut self) {
        let Some(repo) = self.selected_github() else {
            return;
        };
        let new_repo = repo.to_new_repo(self.github_token.clone());
        match self.db.save_repo(&self.user, &new_repo) {
            Ok(record) => {
                if !self.saved.iter().any(|row| row.repo.id == record.id) {
                    self.saved.insert(
                        0,
                        RepoSummary {
                            repo: record,
                            doc_count: 0,
                            latest_doc_id: None,
                            latest_generated_at: None,
                        },
                    );
                }
                self.view_mode = ViewMode::Saved;
                self.search_query.clear();
                self.searching = false;
                if let Err(e) = self.refresh_saved() {
                    tracing::warn!(error = %e, "reload after connect failed");
                }
                self.set_banner(BannerKind::Success, format!("Connected {}", repo.full_name));
            }
            Err(e) => {
                self.set_banner(BannerKind::Error, e.to_string());
            }
        }
    }

    // ========== Delete Flow ==========

    /// Ask for confirmation before removing the selected repository.
    fn request_delete(&mut self) {
        if let Some(row) = self.selected_saved() {
            self.pending_delete = Some(PendingDelete {
                repo_id: row.repo.id,
                repo_name: row.repo.name.clone(),
            });
        }
    }

    /// Resolve a pending removal. `confirmed` false dismisses the prompt
    /// and leaves the repository untouched.
    fn resolve_delete(&mut self, confirmed: bool) {
        let Some(pending) = self.pending_delete.take() else {
            return;
        };
        if !confirmed {
            return;
        }
        match self.db.delete_repo(&self.user, pending.repo_id) {
            Ok(()) => {
                if let Err(e) = self.refresh_saved() {
                    tracing::warn!(error = %e, "reload after delete failed");
                }
                self.set_banner(BannerKind::Success, format!("Removed {}", pending.repo_name));
            }
            Err(e) => {
                self.set_banner(BannerKind::Error, e.to_string());
            }
        }
    }

    // ========== Documentation ==========

    /// Render the latest documentation run for the selected repository to
    /// an HTML file under the preview directory.
    fn open_docs_selected(&mut self) {
        let Some(row) = self.selected_saved() else {
            return;
        };
        let Some(doc_id) = row.latest_doc_id else {
            self.set_banner(
                BannerKind::Error,
                "No documentation for this repository".to_string(),
            );
            return;
        };
        match self.write_preview(doc_id) {
            Ok(path) => {
                self.set_banner(
                    BannerKind::Success,
                    format!("Documentation written to {}", path.display()),
                );
            }
            Err(e) => {
                self.set_banner(BannerKind::Error, e.to_string());
            }
        }
    }

    fn write_preview(&self, doc_id: i64) -> Result<PathBuf> {
        let Some(view) = self.db.get_documentation(&self.user, doc_id)? else {
            return Err(Error::DocumentationNotFound(doc_id.to_string()).into());
        };
        let chunks = self.db.list_chunks(doc_id)?;
        let html = documentation_page(&view, &chunks);
        fs::create_dir_all(&self.preview_dir)?;
        let path = self.preview_dir.join(format!("doc-{doc_id}.html"));
        fs::write(&path, html)?;
        tracing::info!(doc_id, path = %path.display(), "Wrote documentation preview");
        Ok(path)
    }

    // ========== Banner ==========

    /// Replace the current banner.
    fn set_banner(&mut self, kind: BannerKind, text: String) {
        self.banner = Some(Banner {
            kind,
            text,
            shown_at: Instant::now(),
        });
    }

    /// Advance time-based state. Called once per event loop iteration.
    pub fn tick(&mut self) {
        if let Some(banner) = &self.banner {
            if banner.shown_at.elapsed() >= BANNER_TTL {
                self.banner = None;
            }
        }
    }

    #[cfg(test)]
    fn backdate_banner(&mut self, by: Duration) {
        if let Some(banner) = &mut self.banner {
            if let Some(earlier) = banner.shown_at.checked_sub(by) {
                banner.shown_at = earlier;
            }
        }
    }

    // ========== Keyboard ==========

    /// Handle keyboard input.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.pending_delete.is_some() {
            self.handle_confirm_key(key);
            return;
        }
        if self.searching {
            self.handle_search_key(key);
            return;
        }
        match self.view_mode {
            ViewMode::Saved => self.handle_saved_key(key),
            ViewMode::Browse => self.handle_browse_key(key),
        }
    }

    /// Keyboard input while the removal prompt is up.
    fn handle_confirm_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => self.resolve_delete(true),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => self.resolve_delete(false),
            _ => {}
        }
    }

    /// Keyboard input while the search field has focus.
    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.search_query.clear();
                self.searching = false;
                self.clamp_selection();
            }
            KeyCode::Enter => {
                self.searching = false;
            }
            KeyCode::Backspace => {
                self.search_query.pop();
                self.clamp_selection();
            }
            KeyCode::Char(c) => {
                self.search_query.push(c);
                self.clamp_selection();
            }
            _ => {}
        }
    }

    /// Keyboard input in the connected repositories view.
    fn handle_saved_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
            }
            KeyCode::Char('r') => {
                if let Err(e) = self.refresh_saved() {
                    self.set_banner(BannerKind::Error, e.to_string());
                }
            }
            KeyCode::Char('/') => {
                self.searching = true;
                self.search_query.clear();
            }
            KeyCode::Char('c') => {
                self.open_browse();
            }
            KeyCode::Enter => {
                self.open_docs_selected();
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                self.request_delete();
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.select_next();
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.select_previous();
            }
            KeyCode::Home | KeyCode::Char('g') => {
                self.select_first();
            }
            KeyCode::End | KeyCode::Char('G') => {
                self.select_last();
            }
            _ => {}
        }
    }

    /// Keyboard input in the browse view.
    fn handle_browse_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.close_browse();
            }
            KeyCode::Char('/') => {
                self.searching = true;
                self.search_query.clear();
            }
            KeyCode::Enter => {
                self.connect_selected();
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.select_next();
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.select_previous();
            }
            KeyCode::Home | KeyCode::Char('g') => {
                self.select_first();
            }
            KeyCode::End | KeyCode::Char('G') => {
                self.select_last();
            }
            _ => {}
        }
    }

    // ========== Selection ==========

    /// Row count of the active view after filtering.
    fn active_len(&self) -> usize {
        match self.view_mode {
            ViewMode::Saved => self.visible_saved().len(),
            ViewMode::Browse => self.visible_github().len(),
        }
    }

    /// Table state of the active view.
    fn active_state(&mut self) -> &mut TableState {
        match self.view_mode {
            ViewMode::Saved => &mut self.table_state,
            ViewMode::Browse => &mut self.github_table_state,
        }
    }

    /// Select the next row, wrapping at the bottom.
    fn select_next(&mut self) {
        let len = self.active_len();
        if len == 0 {
            return;
        }
        let state = self.active_state();
        let i = match state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        state.select(Some(i));
    }

    /// Select the previous row, wrapping at the top.
    fn select_previous(&mut self) {
        let len = self.active_len();
        if len == 0 {
            return;
        }
        let state = self.active_state();
        let i = match state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        state.select(Some(i));
    }

    /// Select the first row.
    fn select_first(&mut self) {
        if self.active_len() > 0 {
            self.active_state().select(Some(0));
        }
    }

    /// Select the last row.
    fn select_last(&mut self) {
        let len = self.active_len();
        if len > 0 {
            self.active_state().select(Some(len - 1));
        }
    }

    /// Keep the selection within the visible rows after a filter or data
    /// change.
    fn clamp_selection(&mut self) {
        let len = self.active_len();
        let state = self.active_state();
        match state.selected() {
            Some(_) if len == 0 => state.select(None),
            Some(i) if i >= len => state.select(Some(len - 1)),
            None if len > 0 => state.select(Some(0)),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repodocs_core::NewRepo;

    const TEST_USER: &str = "user_test";

    fn test_app() -> App {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        App::new(
            db,
            None,
            TEST_USER.to_string(),
            None,
            std::env::temp_dir(),
        )
    }

    fn seed_repo(app: &App, github_id: i64, name: &str) -> i64 {
        let record = app
            .db
            .save_repo(
                TEST_USER,
                &NewRepo {
                    github_repo_id: github_id,
                    name: name.to_string(),
                    html_url: None,
                    github_token: None,
                },
            )
            .unwrap();
        record.id
    }

    fn github_repo(id: i64, full_name: &str) -> GithubRepo {
        let name = full_name.split('/').next_back().unwrap().to_string();
        GithubRepo {
            id,
            name,
            full_name: full_name.to_string(),
            description: None,
            html_url: format!("https://github.com/{full_name}"),
            private: false,
        }
    }

    #[test]
    fn search_narrows_saved_rows() {
        let mut app = test_app();
        seed_repo(&app, 1, "alpha-docs");
        seed_repo(&app, 2, "beta-service");
        seed_repo(&app, 3, "gamma");
        app.refresh_saved().unwrap();
        assert_eq!(app.visible_saved().len(), 3);

        app.handle_key(KeyEvent::from(KeyCode::Char('/')));
        assert!(app.searching);
        for c in "BETA".chars() {
            app.handle_key(KeyEvent::from(KeyCode::Char(c)));
        }

        let visible = app.visible_saved();
        assert_eq!(visible.len(), 1);
        assert_eq!(app.saved[visible[0]].repo.name, "beta-service");
        assert_eq!(app.table_state.selected(), Some(0));

        app.handle_key(KeyEvent::from(KeyCode::Esc));
        assert!(!app.searching);
        assert_eq!(app.visible_saved().len(), 3);
    }

    #[test]
    fn connect_adds_row_once_and_reports_duplicate() {
        let mut app = test_app();
        app.refresh_saved().unwrap();
        app.view_mode = ViewMode::Browse;
        app.github_repos = vec![github_repo(9001, "acme/widget")];
        app.github_table_state.select(Some(0));

        app.connect_selected();
        assert_eq!(app.view_mode, ViewMode::Saved);
        assert_eq!(app.saved.len(), 1);
        assert_eq!(app.saved[0].repo.github_repo_id, 9001);
        let banner = app.banner.as_ref().unwrap();
        assert_eq!(banner.kind, BannerKind::Success);
        assert!(banner.text.contains("acme/widget"));

        // Connecting the same repository again must not grow the list
        app.view_mode = ViewMode::Browse;
        app.github_table_state.select(Some(0));
        app.connect_selected();
        assert_eq!(app.saved.len(), 1);
        let banner = app.banner.as_ref().unwrap();
        assert_eq!(banner.kind, BannerKind::Error);
        assert!(banner.text.contains("already connected"));
    }

    #[test]
    fn banner_clears_after_ttl() {
        let mut app = test_app();
        app.set_banner(BannerKind::Success, "Connected acme/widget".to_string());

        app.tick();
        assert!(app.banner.is_some());

        app.backdate_banner(BANNER_TTL + Duration::from_millis(10));
        app.tick();
        assert!(app.banner.is_none());
    }

    #[test]
    fn delete_waits_for_confirmation() {
        let mut app = test_app();
        seed_repo(&app, 1, "alpha-docs");
        app.refresh_saved().unwrap();
        assert_eq!(app.table_state.selected(), Some(0));

        app.handle_key(KeyEvent::from(KeyCode::Char('d')));
        assert!(app.pending_delete.is_some());

        // Declining keeps the repository
        app.handle_key(KeyEvent::from(KeyCode::Char('n')));
        assert!(app.pending_delete.is_none());
        assert_eq!(app.db.list_repos(TEST_USER).unwrap().len(), 1);

        // Confirming removes it
        app.handle_key(KeyEvent::from(KeyCode::Char('d')));
        app.handle_key(KeyEvent::from(KeyCode::Char('y')));
        assert!(app.db.list_repos(TEST_USER).unwrap().is_empty());
        assert!(app.saved.is_empty());
        assert_eq!(app.table_state.selected(), None);
        let banner = app.banner.as_ref().unwrap();
        assert_eq!(banner.kind, BannerKind::Success);
        assert!(banner.text.contains("alpha-docs"));
    }

    #[test]
    fn docs_banner_when_repository_has_none() {
        let mut app = test_app();
        seed_repo(&app, 1, "alpha-docs");
        app.refresh_saved().unwrap();

        app.handle_key(KeyEvent::from(KeyCode::Enter));
        let banner = app.banner.as_ref().unwrap();
        assert_eq!(banner.kind, BannerKind::Error);
        assert!(banner.text.contains("No documentation"));
    }

    #[test]
    fn docs_preview_written_for_latest_run() {
        let preview = tempfile::TempDir::new().unwrap();
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        let mut app = App::new(
            db,
            None,
            TEST_USER.to_string(),
            None,
            preview.path().to_path_buf(),
        );

        let repo_id = seed_repo(&app, 1, "alpha-docs");
        let doc_id = app
            .db
            .insert_documentation(repo_id, chrono::Utc::now())
            .unwrap();
        app.db.insert_chunk(doc_id, 0, "<p>intro</p>").unwrap();
        app.db.insert_chunk(doc_id, 1, "<p>usage</p>").unwrap();
        app.refresh_saved().unwrap();

        app.handle_key(KeyEvent::from(KeyCode::Enter));
        let banner = app.banner.as_ref().unwrap();
        assert_eq!(banner.kind, BannerKind::Success);

        let path = preview.path().join(format!("doc-{doc_id}.html"));
        let html = std::fs::read_to_string(path).unwrap();
        assert!(html.contains("<p>intro</p>"));
        assert!(html.contains("<p>usage</p>"));
    }

    #[test]
    fn docs_banner_when_latest_run_was_deleted() {
        let mut app = test_app();
        let repo_id = seed_repo(&app, 1, "alpha-docs");
        let doc_id = app
            .db
            .insert_documentation(repo_id, chrono::Utc::now())
            .unwrap();
        app.refresh_saved().unwrap();

        // The run goes away after the list was loaded
        app.db
            .connection()
            .execute("DELETE FROM documentation WHERE id = ?1", [doc_id])
            .unwrap();

        app.handle_key(KeyEvent::from(KeyCode::Enter));
        let banner = app.banner.as_ref().unwrap();
        assert_eq!(banner.kind, BannerKind::Error);
        assert!(banner.text.contains("documentation not found"));
    }

    #[test]
    fn browse_without_token_shows_error() {
        let mut app = test_app();
        app.handle_key(KeyEvent::from(KeyCode::Char('c')));
        assert_eq!(app.view_mode, ViewMode::Saved);
        let banner = app.banner.as_ref().unwrap();
        assert_eq!(banner.kind, BannerKind::Error);
        assert!(banner.text.contains("token"));
    }

    #[test]
    fn selection_wraps_in_both_directions() {
        let mut app = test_app();
        seed_repo(&app, 1, "alpha-docs");
        seed_repo(&app, 2, "beta-service");
        app.refresh_saved().unwrap();
        assert_eq!(app.table_state.selected(), Some(0));

        app.handle_key(KeyEvent::from(KeyCode::Char('j')));
        assert_eq!(app.table_state.selected(), Some(1));
        app.handle_key(KeyEvent::from(KeyCode::Char('j')));
        assert_eq!(app.table_state.selected(), Some(0));
        app.handle_key(KeyEvent::from(KeyCode::Char('k')));
        assert_eq!(app.table_state.selected(), Some(1));
    }
}
