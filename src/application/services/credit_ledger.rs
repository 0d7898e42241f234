use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{Deduction, RepositoryError, UserAccountRepository};
use crate::domain::PhoneNumber;

/// Billing blast radius bound for malformed files: no single note bills more
/// than this, whatever the estimate says.
const MAX_BILLABLE_SECONDS: f64 = 30.0 * 60.0;

/// Bitrate assumed when the container yields no duration (bits per second).
const FALLBACK_BITRATE: f64 = 80_000.0;

/// Deducts usage minutes from user balances. The lost-update-free
/// check-then-update itself lives behind the account repository's row lock;
/// this service owns the duration-to-minutes policy.
pub struct CreditLedger {
    accounts: Arc<dyn UserAccountRepository>,
}

impl CreditLedger {
    pub fn new(accounts: Arc<dyn UserAccountRepository>) -> Self {
        Self { accounts }
    }

    /// Deduct the given minutes unless the account holds an active
    /// subscription. Never fails the job for an empty balance; the balance
    /// floors at zero.
    pub async fn deduct_if_needed(
        &self,
        phone: &PhoneNumber,
        minutes: f64,
    ) -> Result<Deduction, RepositoryError> {
        let deduction = self.accounts.deduct_minutes(phone, minutes).await?;
        tracing::info!(
            phone = %phone,
            minutes = minutes,
            deducted = deduction.deducted,
            remaining = deduction.remaining,
            "Credit deduction settled"
        );
        Ok(deduction)
    }
}

/// Billable minutes for an audio payload: container-reported duration when
/// available, else a bitrate-based estimate from the raw byte count, capped
/// at 30 minutes either way. Rounded to two decimals.
pub fn billable_minutes(duration: Option<Duration>, byte_len: usize) -> f64 {
    let seconds = match duration {
        Some(d) => d.as_secs_f64(),
        None => (byte_len as f64 * 8.0) / FALLBACK_BITRATE,
    };
    let capped = seconds.min(MAX_BILLABLE_SECONDS);
    (capped / 60.0 * 100.0).round() / 100.0
}
