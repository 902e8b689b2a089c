//! YouTube Data API v3 search client.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::error::FeedError;
use crate::source::{Credentials, FeedSource};
use crate::types::VideoSummary;

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3/";

pub struct YouTubeClient {
    http: reqwest::Client,
    api_base: Url,
}

impl YouTubeClient {
    pub fn new(api_base: Option<&str>, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("showreel/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self { http, api_base: parse_base(api_base.unwrap_or(DEFAULT_API_BASE))? })
    }

    pub(crate) fn search_url(&self, creds: Credentials<'_>, limit: u32) -> Result<Url, FeedError> {
        let mut url = self.api_base.join("search").map_err(|e| FeedError::Transport(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("key", creds.secret)
            .append_pair("channelId", creds.account)
            .append_pair("part", "snippet")
            .append_pair("order", "date")
            .append_pair("maxResults", &limit.to_string())
            .append_pair("type", "video");
        Ok(url)
    }
}

#[async_trait]
impl FeedSource for YouTubeClient {
    type Item = VideoSummary;

    fn name(&self) -> &str { "youtube" }

    fn max_page_size(&self) -> u32 { 50 }

    fn default_page_size(&self) -> u32 { crate::feed::DEFAULT_MAX_RESULTS }

    async fn fetch_latest(&self, creds: Credentials<'_>, limit: u32) -> Result<Vec<VideoSummary>, FeedError> {
        let url = self.search_url(creds, limit)?;
        let resp = self.http.get(url).send().await.map_err(FeedError::from_reqwest)?;
        if !resp.status().is_success() {
            return Err(FeedError::from_status(resp.status()));
        }
        let body = resp.text().await.map_err(FeedError::from_reqwest)?;
        parse_search_response(&body)
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    id: ItemId,
    snippet: Snippet,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemId {
    video_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    thumbnails: Thumbnails,
    published_at: String,
}

#[derive(Deserialize, Default)]
struct Thumbnails {
    high: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Deserialize)]
struct Thumbnail {
    url: String,
}

pub(crate) fn parse_search_response(body: &str) -> Result<Vec<VideoSummary>, FeedError> {
    let resp: SearchResponse = serde_json::from_str(body).map_err(|e| FeedError::MalformedResponse(e.to_string()))?;
    Ok(resp.items.into_iter().map(into_summary).collect())
}

fn into_summary(item: SearchItem) -> VideoSummary {
    let SearchItem { id, snippet } = item;
    let thumbnail_url = snippet.thumbnails.high
        .or(snippet.thumbnails.medium)
        .or(snippet.thumbnails.default)
        .map(|t| t.url)
        .unwrap_or_else(|| format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", id.video_id));
    VideoSummary {
        id: id.video_id,
        title: snippet.title,
        description: snippet.description,
        thumbnail_url,
        published_at: snippet.published_at,
    }
}

// Url::join drops the last segment unless the base ends with '/'.
pub(crate) fn parse_base(base: &str) -> anyhow::Result<Url> {
    let mut s = base.trim().to_string();
    if !s.ends_with('/') { s.push('/'); }
    Url::parse(&s).map_err(|e| anyhow::anyhow!("invalid api base {base}: {e}"))
}
