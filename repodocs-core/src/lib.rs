//! # repodocs-core
//!
//! Core library for repodocs - a local dashboard for GitHub repositories
//! and their generated documentation.
//!
//! This library provides:
//! - Domain types for connected repositories, documentation runs, and chunks
//! - Database storage layer with SQLite
//! - A GitHub API client for the connect flow
//! - Documentation import and HTML page composition
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Access model
//!
//! Every repository operation is scoped to an owning user. Rows belonging
//! to other users are reported as absent, never as forbidden, so ids
//! cannot be probed. One GitHub repository can be connected once across
//! the whole database.
//!
//! ## Example
//!
//! ```rust,no_run
//! use repodocs_core::{Config, Database};
//!
//! // Load configuration
//! let config = Config::load().expect("failed to load config");
//!
//! // Open database
//! let db = Database::open(&config.database_path()).expect("failed to open database");
//! db.migrate().expect("failed to run migrations");
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use db::Database;
pub use error::{Error, Result};
pub use types::*;

// Public modules
pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod format;
pub mod github;
pub mod logging;
pub mod types;
