//! Cache-first feed resolution with graceful degradation.
//!
//! A resolution reads the persisted entry, short-circuits on a fresh one,
//! otherwise asks the upstream and, when that fails, serves the expired entry
//! or the caller's static fallback. It never fails: every path yields a
//! [`Feed`] that can be rendered.

use std::sync::Arc;
use std::time::Duration;

use crate::error::FeedError;
use crate::github::GitHubClient;
use crate::source::{Credentials, FeedSource};
use crate::storage::Storage;
use crate::types::{CacheEntry, Feed, RepoFeed, RepoSummary, VideoFeed, VideoSummary};
use crate::youtube::YouTubeClient;

pub const DEFAULT_MAX_RESULTS: u32 = 3;
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Source of wall-clock time in epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64
    }
}

/// Per-call inputs of a resolution.
#[derive(Debug, Clone)]
pub struct FeedConfig<T> {
    /// Upstream account: YouTube channel id or GitHub user name.
    pub account: Option<String>,
    /// API key or token.
    pub credential: Option<String>,
    pub max_results: u32,
    pub cache_ttl: Duration,
    pub static_fallback: Vec<T>,
}

pub type VideoFeedConfig = FeedConfig<VideoSummary>;
pub type RepoFeedConfig = FeedConfig<RepoSummary>;

impl<T> FeedConfig<T> {
    pub fn new(static_fallback: Vec<T>) -> Self {
        Self {
            account: None,
            credential: None,
            max_results: DEFAULT_MAX_RESULTS,
            cache_ttl: DEFAULT_CACHE_TTL,
            static_fallback,
        }
    }

    pub fn with_account(mut self, account: impl Into<String>) -> Self { self.account = Some(account.into()); self }
    pub fn with_credential(mut self, credential: impl Into<String>) -> Self { self.credential = Some(credential.into()); self }
    pub fn with_max_results(mut self, n: u32) -> Self { self.max_results = n; self }
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self { self.cache_ttl = ttl; self }

    fn credentials(&self, account_first: bool) -> Result<Credentials<'_>, FeedError> {
        let secret = non_blank(&self.credential).ok_or(FeedError::MissingConfiguration { field: "API credential" });
        let account = non_blank(&self.account).ok_or(FeedError::MissingConfiguration { field: "Account identifier" });
        if account_first {
            Ok(Credentials { account: account?, secret: secret? })
        } else {
            let secret = secret?;
            Ok(Credentials { account: account?, secret })
        }
    }
}

fn non_blank(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Resolves one feed against one upstream, owning exactly one cache key.
pub struct FeedProvider<S> {
    source: S,
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    cache_key: String,
}

pub type VideoFeedProvider = FeedProvider<YouTubeClient>;
pub type RepoFeedProvider = FeedProvider<GitHubClient>;

impl<S: FeedSource> FeedProvider<S> {
    pub fn new(source: S, storage: Arc<dyn Storage>) -> Self {
        let cache_key = format!("{}|latest", source.name());
        Self { source, storage, clock: Arc::new(SystemClock), cache_key }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self { self.clock = clock; self }

    pub fn with_cache_key(mut self, key: impl Into<String>) -> Self { self.cache_key = key.into(); self }

    pub fn cache_key(&self) -> &str { &self.cache_key }

    pub fn source(&self) -> &S { &self.source }

    pub async fn resolve(&self, config: &FeedConfig<S::Item>) -> Feed<S::Item> {
        let name = self.source.name();
        let now = self.clock.now_millis();
        let cached = self.read_entry().await;

        if let Some(entry) = &cached {
            let age = now.saturating_sub(entry.fetched_at);
            if age < ttl_millis(config.cache_ttl) {
                tracing::debug!(source = name, age_ms = age, "serving cached feed");
                return Feed::cached(entry.clone());
            }
            tracing::debug!(source = name, age_ms = age, "cached feed expired");
        }

        let creds = match config.credentials(self.source.account_checked_first()) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(source = name, "{e}");
                return Feed::static_fallback(config.static_fallback.clone(), e);
            }
        };

        let limit = self.effective_limit(config.max_results);
        tracing::info!(source = name, limit, "fetching feed from upstream");
        let err = match self.source.fetch_latest(creds, limit).await {
            Ok(items) if items.is_empty() => FeedError::EmptyUpstreamResult,
            Ok(mut items) => {
                items.truncate(limit as usize);
                self.write_entry(&items, now).await;
                return Feed::fresh(items, now);
            }
            Err(e) => e,
        };

        match cached {
            Some(entry) => {
                tracing::warn!(source = name, error = %err, "upstream failed, serving expired cache");
                Feed::expired(entry, err)
            }
            None => {
                tracing::warn!(source = name, error = %err, "upstream failed, serving static fallback");
                Feed::static_fallback(config.static_fallback.clone(), err)
            }
        }
    }

    fn effective_limit(&self, requested: u32) -> u32 {
        let n = if requested == 0 {
            let fallback = self.source.default_page_size();
            tracing::warn!(source = self.source.name(), "max_results must be positive, using {fallback}");
            fallback
        } else {
            requested
        };
        n.min(self.source.max_page_size())
    }

    async fn read_entry(&self) -> Option<CacheEntry<S::Item>> {
        let payload = match self.storage.get_cache(&self.cache_key).await {
            Ok(p) => p?,
            Err(e) => {
                tracing::warn!(key = %self.cache_key, error = %FeedError::Storage(e.to_string()), "cache read failed, treating as miss");
                return None;
            }
        };
        match decode_entry(&payload) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(key = %self.cache_key, error = %e, "discarding cache entry");
                None
            }
        }
    }

    async fn write_entry(&self, items: &[S::Item], now: i64) {
        let entry = CacheEntry { items: items.to_vec(), fetched_at: now };
        let payload = match serde_json::to_string(&entry) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(key = %self.cache_key, error = %e, "could not encode cache entry");
                return;
            }
        };
        if let Err(e) = self.storage.put_cache(&self.cache_key, &payload, now).await {
            tracing::warn!(key = %self.cache_key, error = %FeedError::Storage(e.to_string()), "cache write failed");
        }
    }
}

impl<S: FeedSource<Item = VideoSummary>> FeedProvider<S> {
    /// Resolve the videos to display.
    pub async fn resolve_videos(&self, config: &FeedConfig<VideoSummary>) -> VideoFeed {
        self.resolve(config).await
    }
}

impl<S: FeedSource<Item = RepoSummary>> FeedProvider<S> {
    /// Resolve the repositories to display.
    pub async fn resolve_repos(&self, config: &FeedConfig<RepoSummary>) -> RepoFeed {
        self.resolve(config).await
    }
}

fn ttl_millis(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX)
}

fn decode_entry<T: serde::de::DeserializeOwned>(payload: &str) -> Result<CacheEntry<T>, FeedError> {
    let entry: CacheEntry<T> = serde_json::from_str(payload).map_err(|e| FeedError::CacheCorrupt(e.to_string()))?;
    if entry.items.is_empty() {
        return Err(FeedError::CacheCorrupt("entry has no items".into()));
    }
    Ok(entry)
}
