use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{AudioFormat, Language};

/// Successful transcription plus the media duration when the container
/// yields one (used for billing; callers fall back to a bitrate estimate).
#[derive(Debug, Clone)]
pub struct Transcription {
    pub text: String,
    pub duration: Option<Duration>,
}

#[async_trait]
pub trait TranscriptionEngine: Send + Sync {
    /// Transcribe raw audio bytes. Implementations handle format rejection
    /// internally with at most one re-encode (16 kHz mono PCM) and retry;
    /// a returned error is final for this job.
    async fn transcribe(
        &self,
        audio: &[u8],
        format: AudioFormat,
        language_hint: Option<Language>,
    ) -> Result<Transcription, TranscriptionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    #[error("audio decoding failed: {0}")]
    DecodingFailed(String),
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
    #[error("transcript empty or too short")]
    EmptyTranscript,
}
