//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/repodocs/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/repodocs/` (~/.config/repodocs/)
//! - Data: `$XDG_DATA_HOME/repodocs/` (~/.local/share/repodocs/)
//! - State/Logs: `$XDG_STATE_HOME/repodocs/` (~/.local/state/repodocs/)
//!
//! Two environment variables override the file for scripted use:
//! `REPODOCS_DB` (database path) and `REPODOCS_USER` (owning-user id).

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Who is using this instance; scopes every repository operation
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Database location override
    #[serde(default)]
    pub database: DatabaseConfig,

    /// GitHub API access
    #[serde(default)]
    pub github: GithubConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Identity of the dashboard user
#[derive(Debug, Deserialize, Default)]
pub struct IdentityConfig {
    /// Owning-user id recorded on every repository this instance connects
    pub user: Option<String>,
}

/// Database location override
#[derive(Debug, Deserialize, Default)]
pub struct DatabaseConfig {
    /// Path to the SQLite database (defaults to the XDG data dir)
    pub path: Option<PathBuf>,
}

/// GitHub API configuration
#[derive(Debug, Deserialize, Clone)]
pub struct GithubConfig {
    /// API token; `GITHUB_TOKEN` in the environment takes precedence
    pub token: Option<String>,

    /// API base URL (override for GitHub Enterprise or tests)
    #[serde(default = "default_github_api_url")]
    pub api_url: String,

    /// Repositories per page when listing (GitHub caps this at 100)
    #[serde(default = "default_github_per_page")]
    pub per_page: u8,

    /// HTTP request timeout in seconds
    #[serde(default = "default_github_timeout")]
    pub timeout_secs: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: default_github_api_url(),
            per_page: default_github_per_page(),
            timeout_secs: default_github_timeout(),
        }
    }
}

impl GithubConfig {
    /// Token to authenticate with, preferring the `GITHUB_TOKEN` env var.
    pub fn resolved_token(&self) -> Option<String> {
        std::env::var("GITHUB_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .or_else(|| self.token.clone())
    }

    /// Check if GitHub access is properly configured
    pub fn is_ready(&self) -> bool {
        self.resolved_token().is_some()
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.resolved_token().is_none() {
            return Err(Error::Config(
                "github.token is required (or set GITHUB_TOKEN)".to_string(),
            ));
        }
        if self.per_page == 0 || self.per_page > 100 {
            return Err(Error::Config(
                "github.per_page must be between 1 and 100".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_github_per_page() -> u8 {
    100
}

fn default_github_timeout() -> u64 {
    30
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Owning-user id for this instance.
    ///
    /// `REPODOCS_USER` in the environment wins over `identity.user` in the
    /// config file. Every repository operation requires one.
    pub fn current_user(&self) -> Result<String> {
        if let Ok(user) = std::env::var("REPODOCS_USER") {
            if !user.is_empty() {
                return Ok(user);
            }
        }
        self.identity.user.clone().ok_or_else(|| {
            Error::Config(
                "no user configured: set identity.user in config.toml or REPODOCS_USER".to_string(),
            )
        })
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/repodocs/config.toml` (~/.config/repodocs/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("repodocs").join("config.toml")
    }

    /// Returns the data directory path (for SQLite database)
    ///
    /// `$XDG_DATA_HOME/repodocs/` (~/.local/share/repodocs/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("repodocs")
    }

    /// Returns the state directory path (for logs and rendered pages)
    ///
    /// `$XDG_STATE_HOME/repodocs/` (~/.local/state/repodocs/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("repodocs")
    }

    /// Returns the database file path.
    ///
    /// Resolution order: `REPODOCS_DB` env var, then `database.path` from the
    /// config file, then `$XDG_DATA_HOME/repodocs/repodocs.db`.
    pub fn database_path(&self) -> PathBuf {
        if let Ok(path) = std::env::var("REPODOCS_DB") {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }
        if let Some(path) = &self.database.path {
            return path.clone();
        }
        Self::data_dir().join("repodocs.db")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/repodocs/repodocs.log` (~/.local/state/repodocs/repodocs.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("repodocs.log")
    }

    /// Returns the directory where rendered documentation pages are written
    ///
    /// `$XDG_STATE_HOME/repodocs/preview/`
    pub fn preview_dir() -> PathBuf {
        Self::state_dir().join("preview")
    }

    /// Ensure XDG base directory environment variables are set.
    ///
    /// This is mainly for CLI binaries that want explicit, stable path behavior
    /// before invoking other components that read these env vars.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_DATA_HOME").is_err() {
            std::env::set_var("XDG_DATA_HOME", home.join(".local/share"));
        }

        if std::env::var("XDG_STATE_HOME").is_err() {
            std::env::set_var("XDG_STATE_HOME", home.join(".local/state"));
        }

        if std::env::var("XDG_CONFIG_HOME").is_err() {
            std::env::set_var("XDG_CONFIG_HOME", home.join(".config"));
        }
    }
}
