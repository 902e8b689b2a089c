use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;

use crate::feed::{FeedConfig, RepoFeedConfig, VideoFeedConfig, DEFAULT_CACHE_TTL, DEFAULT_MAX_RESULTS};
use crate::types::{RepoSummary, VideoSummary};

pub const DEFAULT_REPO_RESULTS: u32 = 6;
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Settings file contents (`config.toml`), overridable via `SHOWREEL_*` env vars.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Settings {
    pub database_url: Option<String>,
    pub cache_ttl_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub youtube: YouTubeSettings,
    pub github: GitHubSettings,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct YouTubeSettings {
    pub channel_id: Option<String>,
    pub api_key: Option<String>,
    pub max_results: Option<u32>,
    pub api_base: Option<String>,
    /// Placeholder videos; empty means nothing is shown when the API is unavailable.
    /// `showreel.example.toml` ships a starter set.
    pub fallback: Vec<VideoSummary>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct GitHubSettings {
    pub username: Option<String>,
    pub token: Option<String>,
    pub max_results: Option<u32>,
    pub api_base: Option<String>,
    pub fallback: Vec<RepoSummary>,
}

impl Settings {
    /// Load from `path`, or from the platform config dir when `None`, then apply env overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(p) => Self::from_file(p)?,
            None => match default_config_path() {
                Some(p) if p.exists() => Self::from_file(&p)?,
                _ => Self::default(),
            },
        };
        settings.apply_env(|k| std::env::var(k).ok());
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file: {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing config file: {}", path.display()))
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("SHOWREEL_DATABASE_URL") { self.database_url = Some(v); }
        if let Some(v) = lookup("SHOWREEL_YOUTUBE_CHANNEL_ID") { self.youtube.channel_id = Some(v); }
        if let Some(v) = lookup("SHOWREEL_YOUTUBE_API_KEY") { self.youtube.api_key = Some(v); }
        if let Some(v) = lookup("SHOWREEL_GITHUB_USERNAME") { self.github.username = Some(v); }
        if let Some(v) = lookup("SHOWREEL_GITHUB_TOKEN") { self.github.token = Some(v); }
        match lookup("SHOWREEL_CACHE_TTL_SECS").map(|s| s.trim().parse::<u64>()) {
            Some(Ok(secs)) => self.cache_ttl_secs = Some(secs),
            Some(Err(e)) => tracing::warn!("ignoring SHOWREEL_CACHE_TTL_SECS: {e}"),
            None => {}
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl_secs.map(Duration::from_secs).unwrap_or(DEFAULT_CACHE_TTL)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    pub fn video_config(&self) -> VideoFeedConfig {
        FeedConfig {
            account: self.youtube.channel_id.clone(),
            credential: self.youtube.api_key.clone(),
            max_results: self.youtube.max_results.unwrap_or(DEFAULT_MAX_RESULTS),
            cache_ttl: self.cache_ttl(),
            static_fallback: self.youtube.fallback.clone(),
        }
    }

    pub fn repo_config(&self) -> RepoFeedConfig {
        FeedConfig {
            account: self.github.username.clone(),
            credential: self.github.token.clone(),
            max_results: self.github.max_results.unwrap_or(DEFAULT_REPO_RESULTS),
            cache_ttl: self.cache_ttl(),
            static_fallback: self.github.fallback.clone(),
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("dev", "showreel", "showreel").map(|p| p.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SAMPLE: &str = r#"
cache_ttl_secs = 3600

[youtube]
channel_id = "UC123"
max_results = 4

[[youtube.fallback]]
id = "xr-hRMU85Z0"
title = "Secure Your Docker Image"
thumbnail_url = "https://i.ytimg.com/vi/xr-hRMU85Z0/hqdefault.jpg"
published_at = "2024-06-01T12:00:00Z"

[github]
username = "octocat"
"#;

    #[test]
    fn parses_file_with_fallbacks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let s = Settings::from_file(&path).unwrap();
        let v = s.video_config();
        assert_eq!(v.account.as_deref(), Some("UC123"));
        assert_eq!(v.credential, None);
        assert_eq!(v.max_results, 4);
        assert_eq!(v.cache_ttl, Duration::from_secs(3600));
        assert_eq!(v.static_fallback.len(), 1);
        assert_eq!(v.static_fallback[0].description, "");

        let r = s.repo_config();
        assert_eq!(r.account.as_deref(), Some("octocat"));
        assert_eq!(r.max_results, DEFAULT_REPO_RESULTS);
        assert!(r.static_fallback.is_empty());
    }

    #[test]
    fn env_overrides_file() {
        let mut s: Settings = toml::from_str(SAMPLE).unwrap();
        let env: HashMap<&str, &str> = [
            ("SHOWREEL_YOUTUBE_API_KEY", "secret"),
            ("SHOWREEL_YOUTUBE_CHANNEL_ID", "UC999"),
            ("SHOWREEL_CACHE_TTL_SECS", "60"),
        ].into_iter().collect();
        s.apply_env(|k| env.get(k).map(|v| v.to_string()));

        let v = s.video_config();
        assert_eq!(v.account.as_deref(), Some("UC999"));
        assert_eq!(v.credential.as_deref(), Some("secret"));
        assert_eq!(v.cache_ttl, Duration::from_secs(60));
    }

    #[test]
    fn bad_ttl_env_is_ignored() {
        let mut s = Settings::default();
        s.apply_env(|k| (k == "SHOWREEL_CACHE_TTL_SECS").then(|| "soon".to_string()));
        assert_eq!(s.cache_ttl(), DEFAULT_CACHE_TTL);
        assert_eq!(s.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn example_config_ships_placeholder_videos() {
        let s: Settings = toml::from_str(include_str!("../showreel.example.toml")).unwrap();
        let v = s.video_config();
        assert_eq!(v.static_fallback.len(), 3);
        assert_eq!(v.static_fallback[2].id, "jITLfdxiXUg");
        assert!(v.static_fallback.iter().all(|video| !video.description.is_empty()));
        assert_eq!(v.credential, None);
        assert_eq!(s.repo_config().max_results, DEFAULT_REPO_RESULTS);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Settings::load(Some(dir.path().join("nope.toml").as_path())).is_err());
    }
}
