pub mod config;
pub mod db;
pub mod error;
pub mod feed;
pub mod github;
pub mod source;
pub mod storage;
pub mod types;
pub mod youtube;

#[cfg(test)]
mod test_support;

// --- Library API for embedding ---

/// Convenience re-exports for embedders.
pub mod prelude {
    pub use crate::config::Settings;
    pub use crate::error::FeedError;
    pub use crate::feed::{Clock, FeedConfig, FeedProvider, RepoFeedConfig, RepoFeedProvider, VideoFeedConfig, VideoFeedProvider};
    pub use crate::source::{Credentials, FeedSource};
    pub use crate::storage::{MemoryStorage, Storage};
    pub use crate::types::{CacheEntry, Feed, RepoFeed, RepoSummary, Staleness, VideoFeed, VideoSummary};
    pub use crate::Showreel;
}

use std::sync::Arc;

use anyhow::Result;

use crate::config::Settings;
use crate::db::{CacheStats, Database};
use crate::feed::{Clock, RepoFeedProvider, SystemClock, VideoFeedProvider};
use crate::github::GitHubClient;
use crate::storage::Storage;
use crate::types::{RepoFeed, VideoFeed};
use crate::youtube::YouTubeClient;

/// Async library entry point. Owns the cache database and both feed providers.
pub struct Showreel {
    db: Database,
    settings: Settings,
    videos: VideoFeedProvider,
    repos: RepoFeedProvider,
}

impl Showreel {
    /// Open the cache database (optionally running migrations) and build the HTTP clients.
    pub async fn connect(settings: Settings, run_migrations: bool) -> Result<Self> {
        let db = Database::connect(settings.database_url.as_deref()).await?;
        if run_migrations { db.run_migrations().await?; }

        let storage: Arc<dyn Storage> = Arc::new(db.clone());
        let timeout = settings.request_timeout();
        let youtube = YouTubeClient::new(settings.youtube.api_base.as_deref(), timeout)?;
        let github = GitHubClient::new(settings.github.api_base.as_deref(), timeout)?;

        Ok(Self {
            db,
            videos: VideoFeedProvider::new(youtube, storage.clone()),
            repos: RepoFeedProvider::new(github, storage),
            settings,
        })
    }

    pub fn settings(&self) -> &Settings { &self.settings }

    pub fn database(&self) -> &Database { &self.db }

    /// Latest channel videos, from cache, upstream or fallback.
    pub async fn resolve_videos(&self) -> VideoFeed {
        self.videos.resolve_videos(&self.settings.video_config()).await
    }

    /// Recently updated repositories, from cache, upstream or fallback.
    pub async fn resolve_repos(&self) -> RepoFeed {
        self.repos.resolve_repos(&self.settings.repo_config()).await
    }

    /// Resolve both feeds concurrently. They own distinct cache keys.
    pub async fn resolve_all(&self) -> (VideoFeed, RepoFeed) {
        futures::join!(self.resolve_videos(), self.resolve_repos())
    }

    /// Clear cache entries by prefix. Returns number of rows removed.
    pub async fn clear_cache_prefix(&self, prefix: Option<&str>) -> Result<u64> {
        self.db.clear_cache_prefix(prefix).await
    }

    /// Count cache entries and those older than the configured ttl.
    pub async fn cache_stats(&self) -> Result<CacheStats> {
        let ttl_ms = i64::try_from(self.settings.cache_ttl().as_millis()).unwrap_or(i64::MAX);
        let expired_before = SystemClock.now_millis().saturating_sub(ttl_ms);
        self.db.cache_stats(expired_before).await
    }

    /// Vacuum/compact the database (SQLite only; no-op on others).
    pub async fn vacuum_db(&self) -> Result<()> { self.db.vacuum().await }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Staleness;

    fn settings_in(dir: &tempfile::TempDir) -> Settings {
        Settings {
            database_url: Some(format!("sqlite://{}?mode=rwc", dir.path().join("showreel.db").display())),
            ..Settings::default()
        }
    }

    #[tokio::test]
    async fn unconfigured_feeds_fall_back_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let reel = Showreel::connect(settings_in(&dir), true).await.unwrap();

        let (videos, repos) = reel.resolve_all().await;
        assert_eq!(videos.staleness, Staleness::StaticFallback);
        assert!(videos.notice().is_some());
        assert_eq!(repos.staleness, Staleness::StaticFallback);

        let stats = reel.cache_stats().await.unwrap();
        assert_eq!(stats.entries, 0);
    }

    #[tokio::test]
    async fn cached_entry_in_database_is_served() {
        let dir = tempfile::tempdir().unwrap();
        let reel = Showreel::connect(settings_in(&dir), true).await.unwrap();
        let now = SystemClock.now_millis();
        let payload = serde_json::json!({
            "items": [{
                "id": "jITLfdxiXUg",
                "title": "Deploy AWS Lambda with Terraform",
                "description": "",
                "thumbnail_url": "https://i.ytimg.com/vi/jITLfdxiXUg/hqdefault.jpg",
                "published_at": "2024-05-01T00:00:00Z"
            }],
            "fetched_at": now
        });
        reel.database().put_cache("youtube|latest", &payload.to_string(), now).await.unwrap();

        let feed = reel.resolve_videos().await;
        assert_eq!(feed.staleness, Staleness::Cached);
        assert_eq!(feed.videos()[0].id, "jITLfdxiXUg");

        assert_eq!(reel.clear_cache_prefix(Some("youtube|")).await.unwrap(), 1);
    }
}
