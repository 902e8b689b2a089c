use thiserror::Error;

/// Conditions the feed resolver absorbs into a fallback result.
/// None of these are ever returned as `Err` from a resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    #[error("{field} is missing - using placeholder content")]
    MissingConfiguration { field: &'static str },

    #[error("upstream returned {status} {reason}")]
    UpstreamStatus { status: u16, reason: String },

    #[error("upstream rate limit exceeded ({status})")]
    RateLimited { status: u16 },

    #[error("upstream request failed: {0}")]
    Transport(String),

    #[error("malformed upstream response: {0}")]
    MalformedResponse(String),

    #[error("upstream returned no items")]
    EmptyUpstreamResult,

    #[error("cached entry is unreadable: {0}")]
    CacheCorrupt(String),

    #[error("cache storage failed: {0}")]
    Storage(String),
}

impl FeedError {
    /// Map a non-success HTTP status to the matching upstream error.
    pub(crate) fn from_status(status: reqwest::StatusCode) -> Self {
        match status.as_u16() {
            403 | 429 => FeedError::RateLimited { status: status.as_u16() },
            code => FeedError::UpstreamStatus {
                status: code,
                reason: status.canonical_reason().unwrap_or("").to_string(),
            },
        }
    }

    // The request URL carries the API key, so it never reaches the message.
    pub(crate) fn from_reqwest(e: reqwest::Error) -> Self {
        let e = e.without_url();
        if e.is_decode() {
            FeedError::MalformedResponse(e.to_string())
        } else {
            FeedError::Transport(e.to_string())
        }
    }
}
