use std::time::Duration;

use async_trait::async_trait;

use crate::application::ports::{Messenger, MessengerError};
use crate::domain::PhoneNumber;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_SEND_ATTEMPTS: u32 = 3;

/// WhatsApp delivery over the Twilio Messages API. Transient transport
/// errors (5xx, timeouts) retry with linear backoff; client errors fail
/// immediately.
pub struct TwilioMessenger {
    client: reqwest::Client,
    account_sid: String,
    auth_token: String,
    from_number: String,
    base_url: String,
}

impl TwilioMessenger {
    pub fn new(
        account_sid: String,
        auth_token: String,
        from_number: String,
        base_url: Option<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            account_sid,
            auth_token,
            from_number,
            base_url: base_url.unwrap_or_else(|| "https://api.twilio.com".to_string()),
        }
    }

    async fn attempt(&self, to: &PhoneNumber, body: &str) -> Result<(), SendAttemptError> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        );

        let params = [
            ("From", self.from_number.as_str()),
            ("To", to.as_str()),
            ("Body", body),
        ];

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&params)
            .send()
            .await
            .map_err(|e| SendAttemptError::Transient(format!("request: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        if status.is_server_error() {
            Err(SendAttemptError::Transient(format!(
                "status {}: {}",
                status, text
            )))
        } else {
            Err(SendAttemptError::Permanent(format!(
                "status {}: {}",
                status, text
            )))
        }
    }
}

enum SendAttemptError {
    Transient(String),
    Permanent(String),
}

#[async_trait]
impl Messenger for TwilioMessenger {
    async fn send_message(&self, to: &PhoneNumber, body: &str) -> Result<(), MessengerError> {
        if to.as_str() == "whatsapp:+" {
            return Err(MessengerError::InvalidRecipient(to.as_str().to_string()));
        }

        for attempt in 1..=MAX_SEND_ATTEMPTS {
            match self.attempt(to, body).await {
                Ok(()) => {
                    tracing::debug!(to = %to, attempt, "WhatsApp message sent");
                    return Ok(());
                }
                Err(SendAttemptError::Permanent(e)) => {
                    return Err(MessengerError::Transport(e));
                }
                Err(SendAttemptError::Transient(e)) if attempt < MAX_SEND_ATTEMPTS => {
                    let wait = Duration::from_secs(2 * attempt as u64);
                    tracing::warn!(
                        error = %e,
                        attempt,
                        wait_secs = wait.as_secs(),
                        "Transient send failure, retrying"
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(SendAttemptError::Transient(e)) => {
                    return Err(MessengerError::Transport(format!(
                        "gave up after {} attempts: {}",
                        MAX_SEND_ATTEMPTS, e
                    )));
                }
            }
        }

        unreachable!("send loop returns on every branch")
    }
}
