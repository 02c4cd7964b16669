//! GitHub REST API client
//!
//! Talks to the code-scanning endpoints for database listings and downloads,
//! and to the commits endpoint to resolve a fingerprint (full or abbreviated)
//! into commit metadata. The base URL is injectable so tests can point the
//! client at a mock server.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::ACCEPT;
use serde::Deserialize;

use crate::error::{QldbError, Result};
use crate::layout::RepoId;

/// Production API endpoint
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Environment variable holding the API token
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// One entry from the code-scanning database listing.
#[derive(Debug, Clone, Deserialize)]
pub struct CodeScanningDatabase {
    pub id: u64,
    pub name: String,
    pub language: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub commit_oid: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Commit metadata resolved from a fingerprint.
#[derive(Debug, Clone)]
pub struct CommitInfo {
    /// The full commit SHA
    pub sha: String,
    /// When the commit was committed
    pub committed_date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    sha: String,
    commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    committer: GitActor,
}

#[derive(Debug, Deserialize)]
struct GitActor {
    date: DateTime<Utc>,
}

/// Client for the GitHub REST API.
pub struct GitHubClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl GitHubClient {
    /// Client against the production API, authenticating with `GITHUB_TOKEN`
    /// when the variable is set.
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_API_URL, std::env::var(TOKEN_ENV).ok())
    }

    /// Client against an arbitrary base URL (tests point this at wiremock).
    pub fn with_base_url(base_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("qldb/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    /// List the per-language databases code scanning has for a repository.
    pub async fn list_databases(&self, repo: &RepoId) -> Result<Vec<CodeScanningDatabase>> {
        let url = format!(
            "{}/repos/{}/code-scanning/codeql/databases",
            self.base_url, repo
        );
        let response = self.get(&url).send().await?;
        let response = Self::check_status(response, &url)?;
        Ok(response.json().await?)
    }

    /// Fetch the raw archive bytes for one language's database.
    pub async fn download_database(&self, repo: &RepoId, language: &str) -> Result<Vec<u8>> {
        let url = format!(
            "{}/repos/{}/code-scanning/codeql/databases/{}",
            self.base_url, repo, language
        );
        let response = self
            .get(&url)
            .header(ACCEPT, "application/zip")
            .send()
            .await?;
        let response = Self::check_status(response, &url)?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Resolve a commit fingerprint (full or abbreviated) to its full SHA and
    /// commit date.
    pub async fn commit_info(&self, repo: &RepoId, sha: &str) -> Result<CommitInfo> {
        let url = format!("{}/repos/{}/commits/{}", self.base_url, repo, sha);
        let response = self.get(&url).send().await?;
        let response = Self::check_status(response, &url)?;
        let commit: CommitResponse = response.json().await?;

        Ok(CommitInfo {
            sha: commit.sha,
            committed_date: commit.commit.committer.date,
        })
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let builder = self.client.get(url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn check_status(response: reqwest::Response, url: &str) -> Result<reqwest::Response> {
        if !response.status().is_success() {
            return Err(QldbError::Api {
                status: response.status(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }
}
