//! HTTP client for the GitHub REST API
//!
//! Covers the two calls the connect flow needs: listing the repositories
//! the token can see, and resolving a single repository by owner/name.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};

use crate::config::GithubConfig;
use crate::error::{Error, Result};
use crate::types::GithubRepo;

/// HTTP client for the GitHub API
pub struct GithubClient {
    config: GithubConfig,
    http_client: reqwest::Client,
    base_url: String,
}

impl GithubClient {
    /// Create a new client from configuration
    ///
    /// Returns an error if the configuration is invalid or missing a token.
    pub fn new(config: GithubConfig) -> Result<Self> {
        config.validate()?;

        let base_url = config.api_url.trim_end_matches('/').to_string();

        // Build default headers
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );

        if let Some(token) = config.resolved_token() {
            let auth_value = format!("Bearer {}", token);
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&auth_value)
                    .map_err(|e| Error::Config(format!("invalid github token: {}", e)))?,
            );
        }

        // GitHub rejects requests without a User-Agent
        let http_client = reqwest::Client::builder()
            .user_agent("repodocs")
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
            base_url,
        })
    }

    /// List repositories visible to the authenticated user.
    pub async fn list_repos(&self) -> Result<Vec<GithubRepo>> {
        let url = format!(
            "{}/user/repos?per_page={}&sort=updated",
            self.base_url, self.config.per_page
        );

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Github(format!("HTTP request failed: {}", e)))?;

        let status = response.status();

        if status.is_success() {
            let repos: Vec<GithubRepo> = response
                .json()
                .await
                .map_err(|e| Error::Github(format!("failed to parse response: {}", e)))?;
            Ok(repos)
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            Err(Error::Github(format!(
                "API error ({}): {}",
                status, error_text
            )))
        }
    }

    /// Resolve a single repository by `owner/name`.
    ///
    /// Returns None if GitHub reports it does not exist (or the token
    /// cannot see it).
    pub async fn get_repo(&self, full_name: &str) -> Result<Option<GithubRepo>> {
        let (owner, name) = parse_full_name(full_name)?;
        let url = format!(
            "{}/repos/{}/{}",
            self.base_url,
            urlencoding::encode(owner),
            urlencoding::encode(name)
        );

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Github(format!("HTTP request failed: {}", e)))?;

        let status = response.status();

        if status.is_success() {
            let repo: GithubRepo = response
                .json()
                .await
                .map_err(|e| Error::Github(format!("failed to parse response: {}", e)))?;
            Ok(Some(repo))
        } else if status == reqwest::StatusCode::NOT_FOUND {
            Ok(None)
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            Err(Error::Github(format!(
                "API error ({}): {}",
                status, error_text
            )))
        }
    }
}

/// Synchronous wrapper for contexts without an async runtime
///
/// The CLI and the dashboard are synchronous; this owns a small
/// current-thread runtime and blocks on each call.
pub struct SyncGithubClient {
    inner: GithubClient,
    runtime: tokio::runtime::Runtime,
}

impl SyncGithubClient {
    /// Create a new sync client from configuration
    pub fn new(config: GithubConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Github(format!("failed to create runtime: {}", e)))?;

        Ok(Self {
            inner: GithubClient::new(config)?,
            runtime,
        })
    }

    /// List repositories visible to the authenticated user (blocking)
    pub fn list_repos(&self) -> Result<Vec<GithubRepo>> {
        self.runtime.block_on(self.inner.list_repos())
    }

    /// Resolve a single repository by `owner/name` (blocking)
    pub fn get_repo(&self, full_name: &str) -> Result<Option<GithubRepo>> {
        self.runtime.block_on(self.inner.get_repo(full_name))
    }
}

/// Split an `owner/name` reference into its two segments.
fn parse_full_name(full_name: &str) -> Result<(&str, &str)> {
    match full_name.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok((owner, name))
        }
        _ => Err(Error::Github(format!(
            "expected owner/name, got '{}'",
            full_name
        ))),
    }
}
