use async_trait::async_trait;

use crate::domain::{Language, PhoneNumber, UserAccount};

use super::RepositoryError;

/// Outcome of a deduction attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Deduction {
    pub deducted: f64,
    pub remaining: f64,
}

#[async_trait]
pub trait UserAccountRepository: Send + Sync {
    /// Fetch the account, creating it with default credits on first contact.
    async fn get_or_create(&self, phone: &PhoneNumber) -> Result<UserAccount, RepositoryError>;

    /// Deduct `minutes` from the balance under a row lock spanning the
    /// check-then-update. Subscribed accounts deduct nothing; the balance
    /// floors at exactly 0.0 and never fails the caller.
    async fn deduct_minutes(
        &self,
        phone: &PhoneNumber,
        minutes: f64,
    ) -> Result<Deduction, RepositoryError>;

    async fn set_preferred_language(
        &self,
        phone: &PhoneNumber,
        language: Language,
    ) -> Result<(), RepositoryError>;
}
