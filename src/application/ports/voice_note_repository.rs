use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{JobState, Language, PhoneNumber, VoiceNote, VoiceNoteId};

use super::RepositoryError;

/// Persistence for the pipeline state rows. Every phase transition goes
/// through one of the conditional writes here; the boolean returns report
/// whether this caller won the transition.
#[async_trait]
pub trait VoiceNoteRepository: Send + Sync {
    /// Insert a new pending row. Returns `false` when the dedupe key has
    /// already been recorded, i.e. this webhook delivery is a duplicate.
    async fn create_if_new(&self, note: &VoiceNote) -> Result<bool, RepositoryError>;

    async fn get_by_id(&self, id: VoiceNoteId) -> Result<Option<VoiceNote>, RepositoryError>;

    /// Persist transcript plus detected language and advance the row to
    /// `awaiting_language_choice` in a single write.
    async fn save_transcription(
        &self,
        id: VoiceNoteId,
        transcript: &str,
        detected_language: Language,
    ) -> Result<(), RepositoryError>;

    /// Record the user's choice and advance to `language_selected`. Guarded
    /// on the row still being `awaiting_language_choice`; returns `false`
    /// when another writer got there first.
    async fn set_chosen_language(
        &self,
        id: VoiceNoteId,
        language: Language,
    ) -> Result<bool, RepositoryError>;

    /// Poll target for the selection wait loop.
    async fn get_chosen_language(
        &self,
        id: VoiceNoteId,
    ) -> Result<Option<Language>, RepositoryError>;

    /// The completing write: summary, chosen language, `completed` state and
    /// the `summary_generated_at` stamp, accepted only while the stamp is
    /// still null. Returns `false` when another execution already completed
    /// the job (idempotent no-op for the caller).
    async fn complete_summary(
        &self,
        id: VoiceNoteId,
        summary: &str,
        language: Language,
    ) -> Result<bool, RepositoryError>;

    async fn mark_failed(
        &self,
        id: VoiceNoteId,
        error_message: &str,
    ) -> Result<(), RepositoryError>;

    /// Newest row awaiting a language choice for this sender, used to route
    /// free-text replies.
    async fn latest_awaiting_for(
        &self,
        phone: &PhoneNumber,
    ) -> Result<Option<VoiceNote>, RepositoryError>;

    /// Operational sweep support: rows stuck in `state` since before `cutoff`.
    async fn list_in_state_older_than(
        &self,
        state: JobState,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<VoiceNote>, RepositoryError>;
}
