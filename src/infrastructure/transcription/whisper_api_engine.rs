use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart;

use crate::application::ports::{Transcription, TranscriptionEngine, TranscriptionError};
use crate::domain::{AudioFormat, Language};

use super::audio_transcoder::{probe_duration, transcode_to_wav_16k_mono};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Transcripts shorter than this count as a failed attempt.
const MIN_TRANSCRIPT_CHARS: usize = 5;

/// Speech-to-text over the OpenAI audio transcription API. A rejected or
/// empty first attempt triggers exactly one re-encode to 16 kHz mono WAV and
/// one retry; a second failure is final.
pub struct WhisperApiEngine {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl WhisperApiEngine {
    pub fn new(api_key: String, base_url: Option<String>, model: Option<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            api_key,
            base_url: base_url.unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            model: model.unwrap_or_else(|| "whisper-1".to_string()),
        }
    }

    async fn request(
        &self,
        audio: Vec<u8>,
        format: AudioFormat,
        language_hint: Option<Language>,
    ) -> Result<String, TranscriptionError> {
        let url = format!("{}/audio/transcriptions", self.base_url);

        let file_part = multipart::Part::bytes(audio)
            .file_name(format!("audio.{}", format.extension()))
            .mime_str(format.mime())
            .map_err(|e| TranscriptionError::ApiRequestFailed(format!("mime: {}", e)))?;

        let mut form = multipart::Form::new()
            .text("model", self.model.clone())
            .text("response_format", "text")
            .part("file", file_part);
        if let Some(language) = language_hint {
            form = form.text("language", language.code());
        }

        tracing::debug!(model = %self.model, format = format.extension(), "Sending audio to transcription API");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TranscriptionError::ApiRequestFailed(format!("request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            if status == reqwest::StatusCode::BAD_REQUEST
                || status == reqwest::StatusCode::UNSUPPORTED_MEDIA_TYPE
            {
                return Err(TranscriptionError::UnsupportedFormat(format!(
                    "status {}: {}",
                    status, body
                )));
            }
            return Err(TranscriptionError::ApiRequestFailed(format!(
                "status {}: {}",
                status, body
            )));
        }

        let transcript = response
            .text()
            .await
            .map_err(|e| TranscriptionError::ApiRequestFailed(format!("body: {}", e)))?;

        Ok(transcript.trim().to_string())
    }
}

#[async_trait]
impl TranscriptionEngine for WhisperApiEngine {
    async fn transcribe(
        &self,
        audio: &[u8],
        format: AudioFormat,
        language_hint: Option<Language>,
    ) -> Result<Transcription, TranscriptionError> {
        let first_attempt = self.request(audio.to_vec(), format, language_hint).await;

        match first_attempt {
            Ok(text) if text.chars().count() >= MIN_TRANSCRIPT_CHARS => {
                tracing::info!(chars = text.len(), "Transcription completed");
                return Ok(Transcription {
                    duration: probe_duration(audio, format),
                    text,
                });
            }
            Ok(_) => {
                tracing::warn!("Transcript empty or too short, re-encoding and retrying once");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Transcription failed, re-encoding and retrying once");
            }
        }

        let wav = transcode_to_wav_16k_mono(audio, format)?;
        let text = self
            .request(wav.clone(), AudioFormat::Wav, language_hint)
            .await?;
        if text.chars().count() < MIN_TRANSCRIPT_CHARS {
            return Err(TranscriptionError::EmptyTranscript);
        }

        tracing::info!(chars = text.len(), "Transcription completed after re-encode");
        Ok(Transcription {
            duration: probe_duration(&wav, AudioFormat::Wav),
            text,
        })
    }
}
