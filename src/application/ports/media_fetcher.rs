use async_trait::async_trait;
use bytes::Bytes;

#[derive(Debug, Clone)]
pub struct FetchedMedia {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Download the media payload with a bounded timeout.
    async fn fetch(&self, url: &str) -> Result<FetchedMedia, MediaFetchError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MediaFetchError {
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("timed out: {0}")]
    Timeout(String),
}
