use serde::{Deserialize, Serialize};

use crate::error::FeedError;

/// A display-ready video record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSummary {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub thumbnail_url: String,
    pub published_at: String, // ISO string
}

impl VideoSummary {
    /// Playback link for this video. Placeholder ids link to the channel page instead.
    pub fn watch_url(&self, channel_id: &str) -> String {
        if self.id.starts_with("VIDEO_ID") || self.id.starts_with("fallback") {
            format!("https://www.youtube.com/channel/{}", channel_id)
        } else {
            format!("https://www.youtube.com/watch?v={}", self.id)
        }
    }
}

/// A display-ready repository record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSummary {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub html_url: String,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
}

/// Persisted form of a successful upstream fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub items: Vec<T>,
    /// Epoch milliseconds at which the entry was written.
    pub fetched_at: i64,
}

/// How the returned items were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Staleness {
    /// Fetched from the upstream during this call.
    Fresh,
    /// Served from a cache entry younger than the ttl.
    Cached,
    /// Upstream failed; served from an entry older than the ttl.
    ExpiredCache,
    /// Nothing usable; served the caller's static fallback.
    StaticFallback,
}

impl Staleness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Staleness::Fresh => "fresh",
            Staleness::Cached => "cached",
            Staleness::ExpiredCache => "expired_cache",
            Staleness::StaticFallback => "static_fallback",
        }
    }
}

/// Result of a feed resolution. Always holds something renderable.
#[derive(Debug, Clone, Serialize)]
pub struct Feed<T> {
    pub items: Vec<T>,
    pub used_fallback: bool,
    pub staleness: Staleness,
    /// Write time of the entry served, if the items came from the upstream or the cache.
    pub fetched_at: Option<i64>,
    #[serde(serialize_with = "serialize_diagnostic")]
    pub diagnostic: Option<FeedError>,
}

pub type VideoFeed = Feed<VideoSummary>;
pub type RepoFeed = Feed<RepoSummary>;

impl<T> Feed<T> {
    pub(crate) fn fresh(items: Vec<T>, fetched_at: i64) -> Self {
        Self { items, used_fallback: false, staleness: Staleness::Fresh, fetched_at: Some(fetched_at), diagnostic: None }
    }

    pub(crate) fn cached(entry: CacheEntry<T>) -> Self {
        Self { items: entry.items, used_fallback: false, staleness: Staleness::Cached, fetched_at: Some(entry.fetched_at), diagnostic: None }
    }

    pub(crate) fn expired(entry: CacheEntry<T>, diagnostic: FeedError) -> Self {
        Self { items: entry.items, used_fallback: true, staleness: Staleness::ExpiredCache, fetched_at: Some(entry.fetched_at), diagnostic: Some(diagnostic) }
    }

    pub(crate) fn static_fallback(items: Vec<T>, diagnostic: FeedError) -> Self {
        Self { items, used_fallback: true, staleness: Staleness::StaticFallback, fetched_at: None, diagnostic: Some(diagnostic) }
    }

    /// Message meant for the end user. Only configuration problems are surfaced;
    /// upstream failures stay internal diagnostics.
    pub fn notice(&self) -> Option<String> {
        match &self.diagnostic {
            Some(e @ FeedError::MissingConfiguration { .. }) => Some(e.to_string()),
            _ => None,
        }
    }
}

impl VideoFeed {
    pub fn videos(&self) -> &[VideoSummary] { &self.items }
}

impl RepoFeed {
    pub fn repos(&self) -> &[RepoSummary] { &self.items }
}

fn serialize_diagnostic<S: serde::Serializer>(d: &Option<FeedError>, s: S) -> Result<S::Ok, S::Error> {
    match d {
        Some(e) => s.serialize_some(&e.to_string()),
        None => s.serialize_none(),
    }
}
