use std::time::Duration;

use async_trait::async_trait;

use crate::application::ports::{FetchedMedia, MediaFetchError, MediaFetcher};

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Downloads webhook media over HTTP. Twilio-hosted media requires the
/// account's basic-auth credentials; everything else is fetched anonymously.
pub struct HttpMediaFetcher {
    client: reqwest::Client,
    twilio_account_sid: Option<String>,
    twilio_auth_token: Option<String>,
}

impl HttpMediaFetcher {
    pub fn new(twilio_account_sid: Option<String>, twilio_auth_token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(DOWNLOAD_TIMEOUT)
                .build()
                .unwrap_or_default(),
            twilio_account_sid,
            twilio_auth_token,
        }
    }
}

#[async_trait]
impl MediaFetcher for HttpMediaFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedMedia, MediaFetchError> {
        let mut request = self.client.get(url);

        if url.contains("twilio.com") {
            if let (Some(sid), Some(token)) = (&self.twilio_account_sid, &self.twilio_auth_token) {
                request = request.basic_auth(sid, Some(token));
            }
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                MediaFetchError::Timeout(e.to_string())
            } else {
                MediaFetchError::RequestFailed(e.to_string())
            }
        })?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(MediaFetchError::Unauthorized(
                "media host rejected credentials".to_string(),
            ));
        }
        if !response.status().is_success() {
            return Err(MediaFetchError::RequestFailed(format!(
                "status {}",
                response.status()
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| MediaFetchError::RequestFailed(format!("body: {}", e)))?;

        tracing::debug!(bytes = bytes.len(), content_type = ?content_type, "Media downloaded");

        Ok(FetchedMedia {
            bytes,
            content_type,
        })
    }
}
