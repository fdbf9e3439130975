//! repodocs-dash - connected repository dashboard
//!
//! Terminal UI for browsing connected repositories, connecting new ones,
//! and opening their stored documentation.

mod app;
mod ui;

use std::io;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use repodocs_core::github::SyncGithubClient;
use repodocs_core::{Config, Database};

use crate::app::App;

fn main() -> Result<()> {
    Config::ensure_xdg_env();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging (to file, not stdout since we have a TUI)
    let _log_guard =
        repodocs_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!("repodocs-dash starting up");

    // Open database
    let db_path = config.database_path();
    tracing::info!(path = %db_path.display(), "Opening database");

    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run database migrations")?;

    let user = config.current_user().context("failed to resolve user")?;

    // The browse view stays disabled without a token
    let github = if config.github.is_ready() {
        Some(
            SyncGithubClient::new(config.github.clone())
                .context("failed to build GitHub client")?,
        )
    } else {
        None
    };
    let token = config.github.resolved_token();

    // Create app and load data
    let mut app = App::new(db, github, user, token, Config::preview_dir());
    app.refresh_saved()
        .context("failed to load repositories")?;

    // Setup terminal
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal")?;

    // Run the main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;

    tracing::info!("repodocs-dash shutting down");

    result
}

/// Run the main application loop.
fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        // Expire time-based state such as banners
        app.tick();

        // Render
        terminal.draw(|frame| ui::render(frame, app))?;

        // Handle events
        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key);
            }
        }

        // Check if we should quit
        if app.should_quit {
            break;
        }
    }

    Ok(())
}
