use chrono::{DateTime, Utc};

use super::{JobState, Language, PhoneNumber, VoiceNoteId};

/// Persisted row representing one inbound voice note and its pipeline
/// progress. The row is the single source of truth across worker instances;
/// no in-memory state is trusted across process boundaries.
#[derive(Debug, Clone)]
pub struct VoiceNote {
    pub id: VoiceNoteId,
    pub owner_phone: PhoneNumber,
    pub audio_source: String,
    pub transcript: Option<String>,
    pub detected_language: Option<Language>,
    pub chosen_language: Option<Language>,
    pub summary: Option<String>,
    pub state: JobState,
    pub summary_generated_at: Option<DateTime<Utc>>,
    pub dedupe_key: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VoiceNote {
    pub fn new(owner_phone: PhoneNumber, audio_source: String, dedupe_key: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: VoiceNoteId::new(),
            owner_phone,
            audio_source,
            transcript: None,
            detected_language: None,
            chosen_language: None,
            summary: None,
            state: JobState::Pending,
            summary_generated_at: None,
            dedupe_key,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }
}
