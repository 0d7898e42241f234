use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::Language;

/// Action item the engine pulled out of a transcript.
#[derive(Debug, Clone)]
pub struct ExtractedTask {
    pub title: String,
    pub due_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait SummarizationEngine: Send + Sync {
    /// Produce a structured meeting summary in the given language.
    async fn summarize(
        &self,
        transcript: &str,
        language: Language,
    ) -> Result<String, SummarizationError>;

    /// Extract action items with optional due times from a transcript.
    async fn extract_tasks(
        &self,
        transcript: &str,
    ) -> Result<Vec<ExtractedTask>, SummarizationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SummarizationError {
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
    #[error("rate limited")]
    RateLimited,
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}
