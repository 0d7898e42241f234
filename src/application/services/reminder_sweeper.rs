use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;

use crate::application::ports::{Messenger, ReminderRepository, RepositoryError};

const SWEEP_BATCH: usize = 50;

/// Periodic poll-and-notify loop for due reminders. Each reminder is marked
/// sent only after a successful delivery; the conditional mark lets multiple
/// sweeper instances coexist without double-sending.
pub struct ReminderSweeper {
    reminders: Arc<dyn ReminderRepository>,
    messenger: Arc<dyn Messenger>,
    interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl ReminderSweeper {
    pub fn new(
        reminders: Arc<dyn ReminderRepository>,
        messenger: Arc<dyn Messenger>,
        interval: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            reminders,
            messenger,
            interval,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Reminder sweeper started");
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.sweep().await {
                        Ok(0) => {}
                        Ok(sent) => tracing::info!(sent, "Reminder sweep delivered"),
                        Err(e) => tracing::error!(error = %e, "Reminder sweep failed"),
                    }
                }
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        tracing::info!("Reminder sweeper stopped");
    }

    async fn sweep(&self) -> Result<usize, RepositoryError> {
        let due = self.reminders.due_reminders(Utc::now(), SWEEP_BATCH).await?;
        let mut sent = 0;

        for reminder in due {
            let body = format!("⏰ Reminder: {}", reminder.body);
            if let Err(e) = self
                .messenger
                .send_message(&reminder.owner_phone, &body)
                .await
            {
                tracing::warn!(error = %e, reminder_id = %reminder.id.as_uuid(), "Reminder delivery failed");
                continue;
            }
            match self.reminders.mark_sent(reminder.id).await {
                Ok(true) => sent += 1,
                Ok(false) => {
                    tracing::debug!(reminder_id = %reminder.id.as_uuid(), "Reminder already marked sent")
                }
                Err(e) => tracing::warn!(error = %e, "Failed to mark reminder sent"),
            }
        }

        Ok(sent)
    }
}
