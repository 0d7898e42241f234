use chrono::{DateTime, Utc};

use super::{Language, PhoneNumber};

pub const DEFAULT_STARTING_CREDITS: f64 = 30.0;

/// Billing account, created lazily on first contact.
#[derive(Debug, Clone)]
pub struct UserAccount {
    pub phone: PhoneNumber,
    pub credits_remaining: f64,
    pub subscription_active: bool,
    pub subscription_expiry: Option<DateTime<Utc>>,
    pub preferred_language: Option<Language>,
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    pub fn new(phone: PhoneNumber) -> Self {
        Self {
            phone,
            credits_remaining: DEFAULT_STARTING_CREDITS,
            subscription_active: false,
            subscription_expiry: None,
            preferred_language: None,
            created_at: Utc::now(),
        }
    }

    /// Active and unexpired subscriptions get unlimited use; minute-based
    /// deduction is skipped entirely.
    pub fn has_active_subscription(&self, now: DateTime<Utc>) -> bool {
        self.subscription_active
            && self
                .subscription_expiry
                .map(|expiry| expiry > now)
                .unwrap_or(true)
    }
}
