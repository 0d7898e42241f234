use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use crate::application::ports::{Deduction, RepositoryError, UserAccountRepository};
use crate::domain::{Language, PhoneNumber, UserAccount, DEFAULT_STARTING_CREDITS};

pub struct PgUserAccountRepository {
    pool: PgPool,
}

impl PgUserAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn query_failed(e: sqlx::Error) -> RepositoryError {
    RepositoryError::QueryFailed(e.to_string())
}

fn map_row(row: &PgRow) -> Result<UserAccount, RepositoryError> {
    let preferred: Option<String> = row.try_get("preferred_language").map_err(query_failed)?;
    let preferred_language = preferred
        .map(|code| code.parse::<Language>())
        .transpose()
        .map_err(RepositoryError::QueryFailed)?;

    Ok(UserAccount {
        phone: PhoneNumber::from_canonical(row.try_get("phone").map_err(query_failed)?),
        credits_remaining: row.try_get("credits_remaining").map_err(query_failed)?,
        subscription_active: row.try_get("subscription_active").map_err(query_failed)?,
        subscription_expiry: row.try_get("subscription_expiry").map_err(query_failed)?,
        preferred_language,
        created_at: row.try_get("created_at").map_err(query_failed)?,
    })
}

const SELECT_COLUMNS: &str = "phone, credits_remaining, subscription_active, \
     subscription_expiry, preferred_language, created_at";

#[async_trait]
impl UserAccountRepository for PgUserAccountRepository {
    #[instrument(skip(self), fields(phone = %phone))]
    async fn get_or_create(&self, phone: &PhoneNumber) -> Result<UserAccount, RepositoryError> {
        // Race-safe lazy creation: a concurrent insert loses the conflict
        // and the follow-up select observes the winner's row.
        sqlx::query(
            r#"
            INSERT INTO users (phone, credits_remaining, created_at)
            VALUES ($1, $2, now())
            ON CONFLICT (phone) DO NOTHING
            "#,
        )
        .bind(phone.as_str())
        .bind(DEFAULT_STARTING_CREDITS)
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        let row = sqlx::query(&format!(
            "SELECT {} FROM users WHERE phone = $1",
            SELECT_COLUMNS
        ))
        .bind(phone.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(query_failed)?;

        map_row(&row)
    }

    #[instrument(skip(self), fields(phone = %phone, minutes = minutes))]
    async fn deduct_minutes(
        &self,
        phone: &PhoneNumber,
        minutes: f64,
    ) -> Result<Deduction, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(query_failed)?;

        // Row lock spans the check-then-update so concurrent jobs for the
        // same user serialize their deductions.
        let row = sqlx::query(
            r#"
            SELECT credits_remaining, subscription_active, subscription_expiry
            FROM users
            WHERE phone = $1
            FOR UPDATE
            "#,
        )
        .bind(phone.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(query_failed)?;

        let row = match row {
            Some(row) => row,
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO users (phone, credits_remaining, created_at)
                    VALUES ($1, $2, now())
                    "#,
                )
                .bind(phone.as_str())
                .bind(DEFAULT_STARTING_CREDITS)
                .execute(&mut *tx)
                .await
                .map_err(query_failed)?;

                sqlx::query(
                    r#"
                    SELECT credits_remaining, subscription_active, subscription_expiry
                    FROM users
                    WHERE phone = $1
                    FOR UPDATE
                    "#,
                )
                .bind(phone.as_str())
                .fetch_one(&mut *tx)
                .await
                .map_err(query_failed)?
            }
        };

        let credits: f64 = row.try_get("credits_remaining").map_err(query_failed)?;
        let subscription_active: bool =
            row.try_get("subscription_active").map_err(query_failed)?;
        let subscription_expiry: Option<chrono::DateTime<Utc>> =
            row.try_get("subscription_expiry").map_err(query_failed)?;

        let subscribed = subscription_active
            && subscription_expiry
                .map(|expiry| expiry > Utc::now())
                .unwrap_or(true);
        if subscribed {
            tx.commit().await.map_err(query_failed)?;
            return Ok(Deduction {
                deducted: 0.0,
                remaining: credits,
            });
        }

        let remaining = (credits - minutes).max(0.0);
        sqlx::query("UPDATE users SET credits_remaining = $2 WHERE phone = $1")
            .bind(phone.as_str())
            .bind(remaining)
            .execute(&mut *tx)
            .await
            .map_err(query_failed)?;

        tx.commit().await.map_err(query_failed)?;

        Ok(Deduction {
            deducted: credits - remaining,
            remaining,
        })
    }

    #[instrument(skip(self), fields(phone = %phone, language = %language))]
    async fn set_preferred_language(
        &self,
        phone: &PhoneNumber,
        language: Language,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE users SET preferred_language = $2 WHERE phone = $1")
            .bind(phone.as_str())
            .bind(language.code())
            .execute(&self.pool)
            .await
            .map_err(query_failed)?;

        Ok(())
    }
}
