//! GitHub REST client for a user's recently updated repositories.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use url::Url;

use crate::error::FeedError;
use crate::source::{Credentials, FeedSource};
use crate::types::RepoSummary;
use crate::youtube::parse_base;

pub const DEFAULT_API_BASE: &str = "https://api.github.com/";

pub struct GitHubClient {
    http: reqwest::Client,
    api_base: Url,
}

impl GitHubClient {
    pub fn new(api_base: Option<&str>, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("showreel/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self { http, api_base: parse_base(api_base.unwrap_or(DEFAULT_API_BASE))? })
    }

    pub(crate) fn repos_url(&self, username: &str, limit: u32) -> Result<Url, FeedError> {
        let mut url = self.api_base
            .join(&format!("users/{}/repos", username))
            .map_err(|e| FeedError::Transport(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("sort", "updated")
            .append_pair("per_page", &limit.to_string());
        Ok(url)
    }
}

#[async_trait]
impl FeedSource for GitHubClient {
    type Item = RepoSummary;

    fn name(&self) -> &str { "github" }

    fn max_page_size(&self) -> u32 { 100 }

    fn default_page_size(&self) -> u32 { crate::config::DEFAULT_REPO_RESULTS }

    fn account_checked_first(&self) -> bool { true }

    async fn fetch_latest(&self, creds: Credentials<'_>, limit: u32) -> Result<Vec<RepoSummary>, FeedError> {
        let url = self.repos_url(creds.account, limit)?;
        let resp = self.http
            .get(url)
            .header(ACCEPT, "application/vnd.github.v3+json")
            .header(AUTHORIZATION, format!("Bearer {}", creds.secret))
            .send()
            .await
            .map_err(FeedError::from_reqwest)?;
        if !resp.status().is_success() {
            return Err(FeedError::from_status(resp.status()));
        }
        let body = resp.text().await.map_err(FeedError::from_reqwest)?;
        parse_repos(&body)
    }
}

pub(crate) fn parse_repos(body: &str) -> Result<Vec<RepoSummary>, FeedError> {
    serde_json::from_str(body).map_err(|e| FeedError::MalformedResponse(e.to_string()))
}
