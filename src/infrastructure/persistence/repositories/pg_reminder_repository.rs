use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::instrument;

use crate::application::ports::{ReminderRepository, RepositoryError};
use crate::domain::{PhoneNumber, Reminder, ReminderId};

pub struct PgReminderRepository {
    pool: PgPool,
}

impl PgReminderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn query_failed(e: sqlx::Error) -> RepositoryError {
    RepositoryError::QueryFailed(e.to_string())
}

#[async_trait]
impl ReminderRepository for PgReminderRepository {
    #[instrument(skip(self, reminder), fields(reminder_id = %reminder.id.as_uuid()))]
    async fn create(&self, reminder: &Reminder) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO reminders (id, owner_phone, body, remind_at, sent, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(reminder.id.as_uuid())
        .bind(reminder.owner_phone.as_str())
        .bind(&reminder.body)
        .bind(reminder.remind_at)
        .bind(reminder.sent)
        .bind(reminder.created_at)
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(())
    }

    async fn due_reminders(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Reminder>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_phone, body, remind_at, sent, created_at
            FROM reminders
            WHERE remind_at <= $1 AND NOT sent
            ORDER BY remind_at ASC
            LIMIT $2
            "#,
        )
        .bind(now)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed)?;

        rows.iter()
            .map(|row| {
                Ok(Reminder {
                    id: ReminderId::from_uuid(row.try_get("id").map_err(query_failed)?),
                    owner_phone: PhoneNumber::from_canonical(
                        row.try_get("owner_phone").map_err(query_failed)?,
                    ),
                    body: row.try_get("body").map_err(query_failed)?,
                    remind_at: row.try_get("remind_at").map_err(query_failed)?,
                    sent: row.try_get("sent").map_err(query_failed)?,
                    created_at: row.try_get("created_at").map_err(query_failed)?,
                })
            })
            .collect()
    }

    #[instrument(skip(self), fields(reminder_id = %id.as_uuid()))]
    async fn mark_sent(&self, id: ReminderId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE reminders SET sent = TRUE WHERE id = $1 AND NOT sent")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(query_failed)?;

        Ok(result.rows_affected() > 0)
    }
}
