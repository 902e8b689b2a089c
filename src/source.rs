use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::FeedError;

/// Account and secret a source authenticates with.
#[derive(Debug, Clone, Copy)]
pub struct Credentials<'a> {
    pub account: &'a str,
    pub secret: &'a str,
}

/// An upstream that lists the latest items of one account, newest first.
#[async_trait]
pub trait FeedSource: Send + Sync {
    type Item: Serialize + DeserializeOwned + Clone + Send + Sync;

    /// Short name used in cache keys and logs.
    fn name(&self) -> &str;

    /// Largest page the upstream accepts.
    fn max_page_size(&self) -> u32;

    /// Page size used when the caller asks for zero items.
    fn default_page_size(&self) -> u32;

    /// Whether a missing account is reported before a missing secret.
    fn account_checked_first(&self) -> bool { false }

    async fn fetch_latest(&self, creds: Credentials<'_>, limit: u32) -> Result<Vec<Self::Item>, FeedError>;
}
