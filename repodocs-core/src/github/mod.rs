//! GitHub API integration
//!
//! Thin client behind the connect flow: browse the repositories a token
//! can see, or resolve one directly by owner/name.

pub mod client;

pub use client::{GithubClient, SyncGithubClient};
