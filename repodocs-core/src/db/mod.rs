//! Database layer for repodocs
//!
//! This module provides the storage layer using SQLite with:
//! - Schema migrations
//! - Owner-scoped queries for the repository registry
//! - Ordered chunk retrieval for the documentation reader

pub mod schema;
pub mod store;

pub use store::Database;
