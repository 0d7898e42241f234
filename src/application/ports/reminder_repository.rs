use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Reminder, ReminderId};

use super::RepositoryError;

#[async_trait]
pub trait ReminderRepository: Send + Sync {
    async fn create(&self, reminder: &Reminder) -> Result<(), RepositoryError>;

    /// Unsent reminders due at or before `now`, oldest first.
    async fn due_reminders(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Reminder>, RepositoryError>;

    /// Returns `false` when the reminder was already marked sent by another
    /// sweeper instance.
    async fn mark_sent(&self, id: ReminderId) -> Result<bool, RepositoryError>;
}
