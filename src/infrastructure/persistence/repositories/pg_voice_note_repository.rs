use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use crate::application::ports::{RepositoryError, VoiceNoteRepository};
use crate::domain::{JobState, Language, PhoneNumber, VoiceNote, VoiceNoteId};

pub struct PgVoiceNoteRepository {
    pool: PgPool,
}

impl PgVoiceNoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn query_failed(e: sqlx::Error) -> RepositoryError {
    RepositoryError::QueryFailed(e.to_string())
}

fn map_row(row: &PgRow) -> Result<VoiceNote, RepositoryError> {
    let state: String = row.try_get("state").map_err(query_failed)?;
    let state = state.parse::<JobState>().map_err(RepositoryError::QueryFailed)?;

    let detected: Option<String> = row.try_get("detected_language").map_err(query_failed)?;
    let detected_language = detected
        .map(|code| code.parse::<Language>())
        .transpose()
        .map_err(RepositoryError::QueryFailed)?;

    let chosen: Option<String> = row.try_get("chosen_language").map_err(query_failed)?;
    let chosen_language = chosen
        .map(|code| code.parse::<Language>())
        .transpose()
        .map_err(RepositoryError::QueryFailed)?;

    Ok(VoiceNote {
        id: VoiceNoteId::from_uuid(row.try_get("id").map_err(query_failed)?),
        owner_phone: PhoneNumber::from_canonical(
            row.try_get("owner_phone").map_err(query_failed)?,
        ),
        audio_source: row.try_get("audio_source").map_err(query_failed)?,
        transcript: row.try_get("transcript").map_err(query_failed)?,
        detected_language,
        chosen_language,
        summary: row.try_get("summary").map_err(query_failed)?,
        state,
        summary_generated_at: row
            .try_get("summary_generated_at")
            .map_err(query_failed)?,
        dedupe_key: row.try_get("dedupe_key").map_err(query_failed)?,
        error_message: row.try_get("error_message").map_err(query_failed)?,
        created_at: row.try_get("created_at").map_err(query_failed)?,
        updated_at: row.try_get("updated_at").map_err(query_failed)?,
    })
}

const SELECT_COLUMNS: &str = "id, owner_phone, audio_source, transcript, detected_language, \
     chosen_language, summary, state, summary_generated_at, dedupe_key, error_message, \
     created_at, updated_at";

#[async_trait]
impl VoiceNoteRepository for PgVoiceNoteRepository {
    #[instrument(skip(self, note), fields(note_id = %note.id))]
    async fn create_if_new(&self, note: &VoiceNote) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            INSERT INTO voice_notes
                (id, owner_phone, audio_source, state, dedupe_key, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (dedupe_key) WHERE dedupe_key IS NOT NULL DO NOTHING
            "#,
        )
        .bind(note.id.as_uuid())
        .bind(note.owner_phone.as_str())
        .bind(&note.audio_source)
        .bind(note.state.as_str())
        .bind(&note.dedupe_key)
        .bind(note.created_at)
        .bind(note.updated_at)
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self), fields(note_id = %id))]
    async fn get_by_id(&self, id: VoiceNoteId) -> Result<Option<VoiceNote>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM voice_notes WHERE id = $1",
            SELECT_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_failed)?;

        row.as_ref().map(map_row).transpose()
    }

    #[instrument(skip(self, transcript), fields(note_id = %id, detected = %detected_language))]
    async fn save_transcription(
        &self,
        id: VoiceNoteId,
        transcript: &str,
        detected_language: Language,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            UPDATE voice_notes
            SET transcript = $2, detected_language = $3, state = $4, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(transcript)
        .bind(detected_language.code())
        .bind(JobState::AwaitingLanguageChoice.as_str())
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(())
    }

    #[instrument(skip(self), fields(note_id = %id, language = %language))]
    async fn set_chosen_language(
        &self,
        id: VoiceNoteId,
        language: Language,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE voice_notes
            SET chosen_language = $2, state = $3, updated_at = now()
            WHERE id = $1 AND state = $4
            "#,
        )
        .bind(id.as_uuid())
        .bind(language.code())
        .bind(JobState::LanguageSelected.as_str())
        .bind(JobState::AwaitingLanguageChoice.as_str())
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_chosen_language(
        &self,
        id: VoiceNoteId,
    ) -> Result<Option<Language>, RepositoryError> {
        let row = sqlx::query("SELECT chosen_language FROM voice_notes WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(query_failed)?;

        let code: Option<String> = match row {
            Some(row) => row.try_get("chosen_language").map_err(query_failed)?,
            None => None,
        };
        code.map(|c| c.parse::<Language>())
            .transpose()
            .map_err(RepositoryError::QueryFailed)
    }

    #[instrument(skip(self, summary), fields(note_id = %id, language = %language))]
    async fn complete_summary(
        &self,
        id: VoiceNoteId,
        summary: &str,
        language: Language,
    ) -> Result<bool, RepositoryError> {
        // The idempotency guard: only the first completing execution sees a
        // null stamp and wins the row.
        let result = sqlx::query(
            r#"
            UPDATE voice_notes
            SET summary = $2, chosen_language = $3, state = $4,
                summary_generated_at = now(), updated_at = now()
            WHERE id = $1 AND summary_generated_at IS NULL
            "#,
        )
        .bind(id.as_uuid())
        .bind(summary)
        .bind(language.code())
        .bind(JobState::Completed.as_str())
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, error_message), fields(note_id = %id))]
    async fn mark_failed(
        &self,
        id: VoiceNoteId,
        error_message: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            UPDATE voice_notes
            SET state = $2, error_message = $3, updated_at = now()
            WHERE id = $1 AND state <> $4
            "#,
        )
        .bind(id.as_uuid())
        .bind(JobState::Failed.as_str())
        .bind(error_message)
        .bind(JobState::Completed.as_str())
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(())
    }

    async fn latest_awaiting_for(
        &self,
        phone: &PhoneNumber,
    ) -> Result<Option<VoiceNote>, RepositoryError> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {} FROM voice_notes
            WHERE owner_phone = $1 AND state = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
            SELECT_COLUMNS
        ))
        .bind(phone.as_str())
        .bind(JobState::AwaitingLanguageChoice.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_failed)?;

        row.as_ref().map(map_row).transpose()
    }

    #[instrument(skip(self), fields(state = %state))]
    async fn list_in_state_older_than(
        &self,
        state: JobState,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<VoiceNote>, RepositoryError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM voice_notes
            WHERE state = $1 AND created_at < $2
            ORDER BY created_at ASC
            "#,
            SELECT_COLUMNS
        ))
        .bind(state.as_str())
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed)?;

        rows.iter().map(map_row).collect()
    }
}
