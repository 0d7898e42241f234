use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::instrument;

use crate::application::ports::{RepositoryError, TaskRepository};
use crate::domain::{PhoneNumber, Task, TaskId, TaskStatus};

pub struct PgTaskRepository {
    pool: PgPool,
}

impl PgTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn query_failed(e: sqlx::Error) -> RepositoryError {
    RepositoryError::QueryFailed(e.to_string())
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    #[instrument(skip(self, task), fields(task_id = %task.id.as_uuid()))]
    async fn create(&self, task: &Task) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO tasks (id, owner_phone, title, due_at, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(task.id.as_uuid())
        .bind(task.owner_phone.as_str())
        .bind(&task.title)
        .bind(task.due_at)
        .bind(task.status.as_str())
        .bind(task.created_at)
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(())
    }

    async fn list_open_for(
        &self,
        phone: &PhoneNumber,
        limit: usize,
    ) -> Result<Vec<Task>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_phone, title, due_at, status, created_at
            FROM tasks
            WHERE owner_phone = $1 AND status = $2
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(phone.as_str())
        .bind(TaskStatus::Open.as_str())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed)?;

        rows.iter()
            .map(|row| {
                let status: String = row.try_get("status").map_err(query_failed)?;
                Ok(Task {
                    id: TaskId::from_uuid(row.try_get("id").map_err(query_failed)?),
                    owner_phone: PhoneNumber::from_canonical(
                        row.try_get("owner_phone").map_err(query_failed)?,
                    ),
                    title: row.try_get("title").map_err(query_failed)?,
                    due_at: row.try_get("due_at").map_err(query_failed)?,
                    status: status
                        .parse::<TaskStatus>()
                        .map_err(RepositoryError::QueryFailed)?,
                    created_at: row.try_get("created_at").map_err(query_failed)?,
                })
            })
            .collect()
    }
}
