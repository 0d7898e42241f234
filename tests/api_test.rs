use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use vaani::application::ports::{
    Deduction, Messenger, MessengerError, RepositoryError, UserAccountRepository,
    VoiceNoteRepository,
};
use vaani::application::services::PipelineJob;
use vaani::domain::{JobState, Language, PhoneNumber, UserAccount, VoiceNote, VoiceNoteId};
use vaani::presentation::{create_router, AppState};

#[derive(Default)]
struct InMemoryNotes {
    rows: Mutex<HashMap<Uuid, VoiceNote>>,
}

#[async_trait::async_trait]
impl VoiceNoteRepository for InMemoryNotes {
    async fn create_if_new(&self, note: &VoiceNote) -> Result<bool, RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(key) = &note.dedupe_key {
            if rows.values().any(|n| n.dedupe_key.as_deref() == Some(key)) {
                return Ok(false);
            }
        }
        rows.insert(note.id.as_uuid(), note.clone());
        Ok(true)
    }

    async fn get_by_id(&self, id: VoiceNoteId) -> Result<Option<VoiceNote>, RepositoryError> {
        Ok(self.rows.lock().unwrap().get(&id.as_uuid()).cloned())
    }

    async fn save_transcription(
        &self,
        _id: VoiceNoteId,
        _transcript: &str,
        _detected_language: Language,
    ) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn set_chosen_language(
        &self,
        id: VoiceNoteId,
        language: Language,
    ) -> Result<bool, RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        let note = rows
            .get_mut(&id.as_uuid())
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        if note.state != JobState::AwaitingLanguageChoice {
            return Ok(false);
        }
        note.chosen_language = Some(language);
        note.state = JobState::LanguageSelected;
        Ok(true)
    }

    async fn get_chosen_language(
        &self,
        id: VoiceNoteId,
    ) -> Result<Option<Language>, RepositoryError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .get(&id.as_uuid())
            .and_then(|n| n.chosen_language))
    }

    async fn complete_summary(
        &self,
        _id: VoiceNoteId,
        _summary: &str,
        _language: Language,
    ) -> Result<bool, RepositoryError> {
        Ok(true)
    }

    async fn mark_failed(
        &self,
        _id: VoiceNoteId,
        _error_message: &str,
    ) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn latest_awaiting_for(
        &self,
        phone: &PhoneNumber,
    ) -> Result<Option<VoiceNote>, RepositoryError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|n| {
                &n.owner_phone == phone && n.state == JobState::AwaitingLanguageChoice
            })
            .max_by_key(|n| n.created_at)
            .cloned())
    }

    async fn list_in_state_older_than(
        &self,
        _state: JobState,
        _cutoff: DateTime<Utc>,
    ) -> Result<Vec<VoiceNote>, RepositoryError> {
        Ok(vec![])
    }
}

struct MockAccounts;

#[async_trait::async_trait]
impl UserAccountRepository for MockAccounts {
    async fn get_or_create(&self, phone: &PhoneNumber) -> Result<UserAccount, RepositoryError> {
        Ok(UserAccount::new(phone.clone()))
    }

    async fn deduct_minutes(
        &self,
        _phone: &PhoneNumber,
        _minutes: f64,
    ) -> Result<Deduction, RepositoryError> {
        Ok(Deduction {
            deducted: 0.0,
            remaining: 30.0,
        })
    }

    async fn set_preferred_language(
        &self,
        _phone: &PhoneNumber,
        _language: Language,
    ) -> Result<(), RepositoryError> {
        Ok(())
    }
}

struct SilentMessenger;

#[async_trait::async_trait]
impl Messenger for SilentMessenger {
    async fn send_message(&self, _to: &PhoneNumber, _body: &str) -> Result<(), MessengerError> {
        Ok(())
    }
}

fn test_state() -> (AppState, Arc<InMemoryNotes>, mpsc::Receiver<PipelineJob>) {
    let notes = Arc::new(InMemoryNotes::default());
    let (job_sender, job_receiver) = mpsc::channel(8);
    let state = AppState {
        notes: notes.clone(),
        accounts: Arc::new(MockAccounts),
        messenger: Arc::new(SilentMessenger),
        job_sender,
    };
    (state, notes, job_receiver)
}

fn media_webhook_request(message_sid: &str) -> Request<Body> {
    let body = format!(
        "From=whatsapp%3A%2B919876543210&MessageSid={}&NumMedia=1\
         &MediaUrl0=https%3A%2F%2Fapi.twilio.com%2Fmedia%2F1\
         &MediaContentType0=audio%2Fogg",
        message_sid
    );
    Request::builder()
        .method("POST")
        .uri("/webhook/whatsapp")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

fn text_webhook_request(body_text: &str) -> Request<Body> {
    let body = format!(
        "From=whatsapp%3A%2B919876543210&MessageSid=SMTEXT&NumMedia=0&Body={}",
        body_text
    );
    Request::builder()
        .method("POST")
        .uri("/webhook/whatsapp")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn given_media_webhook_when_posted_then_row_created_and_job_enqueued() {
    let (state, notes, mut jobs) = test_state();
    let router = create_router(state);

    let response = router.oneshot(media_webhook_request("SM100")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(notes.rows.lock().unwrap().len(), 1);
    let job = jobs.try_recv().expect("one job enqueued");
    assert!(matches!(job, PipelineJob::ProcessAudio { .. }));
}

#[tokio::test]
async fn given_duplicate_webhook_delivery_when_posted_twice_then_one_row_and_one_job() {
    let (state, notes, mut jobs) = test_state();
    let router = create_router(state);

    let first = router
        .clone()
        .oneshot(media_webhook_request("SM200"))
        .await
        .unwrap();
    let second = router.oneshot(media_webhook_request("SM200")).await.unwrap();

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);

    assert_eq!(notes.rows.lock().unwrap().len(), 1, "dedupe rejected the replay");
    assert!(jobs.try_recv().is_ok());
    assert!(jobs.try_recv().is_err(), "no second job for the duplicate");
}

#[tokio::test]
async fn given_awaiting_note_when_valid_reply_arrives_then_language_recorded_and_summary_job_enqueued()
{
    let (state, notes, mut jobs) = test_state();

    let mut note = VoiceNote::new(
        PhoneNumber::normalize("+919876543210"),
        "https://api.twilio.com/media/1".to_string(),
        Some("SM300".to_string()),
    );
    note.transcript = Some("some transcript text".to_string());
    note.state = JobState::AwaitingLanguageChoice;
    let note_id = note.id;
    notes.rows.lock().unwrap().insert(note_id.as_uuid(), note);

    let router = create_router(state);
    let response = router.oneshot(text_webhook_request("2")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let stored = notes.rows.lock().unwrap()[&note_id.as_uuid()].clone();
    assert_eq!(stored.chosen_language, Some(Language::English));
    assert_eq!(stored.state, JobState::LanguageSelected);

    match jobs.try_recv().expect("summary job enqueued") {
        PipelineJob::CompleteSummary { note_id: id, language } => {
            assert_eq!(id, note_id);
            assert_eq!(language, Language::English);
        }
        other => panic!("unexpected job: {:?}", other),
    }
}

#[tokio::test]
async fn given_awaiting_note_when_invalid_reply_arrives_then_no_state_change_and_no_job() {
    let (state, notes, mut jobs) = test_state();

    let mut note = VoiceNote::new(
        PhoneNumber::normalize("+919876543210"),
        "https://api.twilio.com/media/1".to_string(),
        Some("SM400".to_string()),
    );
    note.state = JobState::AwaitingLanguageChoice;
    let note_id = note.id;
    notes.rows.lock().unwrap().insert(note_id.as_uuid(), note);

    let router = create_router(state);
    let response = router.oneshot(text_webhook_request("hello")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let stored = notes.rows.lock().unwrap()[&note_id.as_uuid()].clone();
    assert_eq!(stored.state, JobState::AwaitingLanguageChoice);
    assert_eq!(stored.chosen_language, None);
    assert!(jobs.try_recv().is_err());
}

#[tokio::test]
async fn given_note_row_when_fetching_status_then_state_is_reported() {
    let (state, notes, _jobs) = test_state();

    let mut note = VoiceNote::new(
        PhoneNumber::normalize("+919876543210"),
        "https://api.twilio.com/media/1".to_string(),
        None,
    );
    note.state = JobState::AwaitingLanguageChoice;
    note.detected_language = Some(Language::Hindi);
    let note_id = note.id;
    notes.rows.lock().unwrap().insert(note_id.as_uuid(), note);

    let router = create_router(state);
    let response = router
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/notes/{}", note_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = http_body_util::BodyExt::collect(response.into_body())
        .await
        .unwrap()
        .to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["state"], "awaiting_language_choice");
    assert_eq!(json["detected_language"], "hi");
}

#[tokio::test]
async fn given_unknown_note_id_when_fetching_status_then_404() {
    let (state, _notes, _jobs) = test_state();
    let router = create_router(state);

    let response = router
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/notes/{}", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn given_health_endpoint_when_queried_then_healthy() {
    let (state, _notes, _jobs) = test_state();
    let router = create_router(state);

    let response = router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
