use async_trait::async_trait;

use crate::domain::PhoneNumber;

#[async_trait]
pub trait Messenger: Send + Sync {
    /// Deliver one plain-text message. Implementations retry transient
    /// transport errors a bounded number of times before returning an error;
    /// callers treat a returned error as a delivery failure to log, not
    /// retry further.
    async fn send_message(&self, to: &PhoneNumber, body: &str) -> Result<(), MessengerError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MessengerError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid recipient: {0}")]
    InvalidRecipient(String),
}
