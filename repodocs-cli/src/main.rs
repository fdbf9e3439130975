//! repodocs - repository and documentation registry CLI
//!
//! Scriptable access to the connected-repository registry and the
//! documentation reader. The interactive dashboard lives in the
//! repodocs-dash binary.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Database: $XDG_DATA_HOME/repodocs/repodocs.db (~/.local/share/repodocs/repodocs.db)
//! - Logs: $XDG_STATE_HOME/repodocs/repodocs.log (~/.local/state/repodocs/repodocs.log)
//! - Config: $XDG_CONFIG_HOME/repodocs/config.toml (~/.config/repodocs/config.toml)

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::ProgressBar;
use repodocs_core::docs;
use repodocs_core::format::{format_relative_time, format_relative_time_opt};
use repodocs_core::github::SyncGithubClient;
use repodocs_core::{Config, Database, Error};

#[derive(Parser)]
#[command(name = "repodocs")]
#[command(about = "Manage connected GitHub repositories and their documentation")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the current user's connected repositories
    List {
        /// Emit the {"repos": [...]} JSON payload instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Connect a GitHub repository
    Connect {
        /// Repository reference, e.g. rust-lang/cargo
        repo: String,
    },

    /// Remove a connected repository
    Remove {
        /// Repository id (first column of `repodocs list`)
        id: i64,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Render a documentation run as a standalone HTML page
    Docs {
        /// Documentation id
        id: String,

        /// Write the page to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import pre-rendered documentation fragments for a repository
    ImportDocs {
        /// Repository id (first column of `repodocs list`)
        repo_id: i64,

        /// One HTML file, or a directory of *.html fragments
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Ensure XDG environment variables are set before using core library
    Config::ensure_xdg_env();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging (to file; stdout stays clean for command output)
    let _log_guard =
        repodocs_core::logging::init(&config.logging).context("failed to initialize logging")?;

    let db_path = config.database_path();
    tracing::info!(path = %db_path.display(), "Opening database");

    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run database migrations")?;

    let user = config.current_user()?;

    match args.command {
        Command::List { json } => cmd_list(&db, &user, json),
        Command::Connect { repo } => cmd_connect(&config, &db, &user, &repo),
        Command::Remove { id, yes } => cmd_remove(&db, &user, id, yes),
        Command::Docs { id, output } => cmd_docs(&db, &user, &id, output.as_deref()),
        Command::ImportDocs { repo_id, path } => cmd_import_docs(&db, &user, repo_id, &path),
    }
}

fn cmd_list(db: &Database, user: &str, json: bool) -> Result<()> {
    let summaries = db.list_repos_with_docs(user)?;

    if json {
        let repos: Vec<_> = summaries.iter().map(|s| &s.repo).collect();
        let payload = serde_json::json!({ "repos": repos });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if summaries.is_empty() {
        println!("No repositories connected.");
        println!("Connect one with: repodocs connect <owner>/<name>");
        return Ok(());
    }

    println!(
        "{:<6} {:<32} {:>5}  {:<12} {}",
        "ID", "NAME", "DOCS", "LAST RUN", "CONNECTED"
    );
    for summary in &summaries {
        println!(
            "{:<6} {:<32} {:>5}  {:<12} {}",
            summary.repo.id,
            summary.repo.name,
            summary.doc_count,
            format_relative_time_opt(summary.latest_generated_at),
            format_relative_time(summary.repo.created_at)
        );
    }
    Ok(())
}

fn cmd_connect(config: &Config, db: &Database, user: &str, repo_ref: &str) -> Result<()> {
    let client = SyncGithubClient::new(config.github.clone())
        .context("GitHub access is not configured")?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_message(format!("Fetching {repo_ref} from GitHub..."));
    spinner.enable_steady_tick(Duration::from_millis(80));
    let fetched = client.get_repo(repo_ref);
    spinner.finish_and_clear();

    let Some(gh_repo) = fetched? else {
        bail!("GitHub repository not found: {repo_ref}");
    };

    let record = db.save_repo(user, &gh_repo.to_new_repo(config.github.resolved_token()))?;

    println!("Connected {} (id {})", record.name, record.id);
    if let Some(url) = &record.html_url {
        println!("  {url}");
    }
    tracing::info!(
        repo_id = record.id,
        github_repo_id = record.github_repo_id,
        "Connected repository"
    );
    Ok(())
}

fn cmd_remove(db: &Database, user: &str, id: i64, yes: bool) -> Result<()> {
    let Some(repo) = db.get_repo(user, id)? else {
        return Err(Error::RepoNotFound(id).into());
    };

    if !yes && !confirm(&format!("Remove repository '{}' (id {})?", repo.name, repo.id))? {
        println!("Aborted.");
        return Ok(());
    }

    db.delete_repo(user, id)?;
    println!("Removed repository '{}' (id {})", repo.name, id);
    Ok(())
}

fn cmd_docs(db: &Database, user: &str, id: &str, output: Option<&Path>) -> Result<()> {
    // A malformed id reads the same as an id that is not there
    let view = match id.parse::<i64>() {
        Ok(doc_id) => db.get_documentation(user, doc_id)?,
        Err(_) => None,
    };
    let Some(view) = view else {
        return Err(Error::DocumentationNotFound(id.to_string()).into());
    };

    let chunks = db.list_chunks(view.id)?;
    tracing::debug!(
        documentation_id = view.id,
        chunks = chunks.len(),
        "Rendering documentation page"
    );
    let page = docs::documentation_page(&view, &chunks);

    match output {
        Some(path) => {
            std::fs::write(path, &page)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => {
            print!("{page}");
        }
    }
    Ok(())
}

fn cmd_import_docs(db: &Database, user: &str, repo_id: i64, path: &Path) -> Result<()> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_message("Importing fragments...");
    spinner.enable_steady_tick(Duration::from_millis(80));
    let outcome = docs::import_documentation(db, user, repo_id, path, None);
    spinner.finish_and_clear();

    let outcome = outcome?;
    println!(
        "Imported {} chunk(s) as documentation {}",
        outcome.chunks_imported, outcome.documentation_id
    );
    println!("View with: repodocs docs {}", outcome.documentation_id);
    Ok(())
}

/// Ask a yes/no question on stdout, defaulting to no.
fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes" | "Yes"))
}
