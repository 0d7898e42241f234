use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use uuid::Uuid;

use vaani::application::ports::{
    Deduction, ExtractedTask, FetchedMedia, MediaFetchError, MediaFetcher, Messenger,
    MessengerError, ReminderRepository, RepositoryError, SummarizationEngine, SummarizationError,
    TaskRepository, Transcription, TranscriptionEngine, TranscriptionError, UserAccountRepository,
    VoiceNoteRepository,
};
use vaani::application::services::{AudioPipeline, PipelineConfig, ReminderSweeper};
use vaani::domain::{
    AudioFormat, JobState, Language, PhoneNumber, Reminder, Task, UserAccount, VoiceNote,
    VoiceNoteId,
};

const TEST_TRANSCRIPT: &str = "Hello team, how are you today, let us review the budget";
const TEST_SUMMARY: &str = "Key discussion points were captured in detail.";

// ---------------------------------------------------------------------------
// Port mocks
// ---------------------------------------------------------------------------

#[derive(Default)]
struct InMemoryNotes {
    rows: Mutex<HashMap<Uuid, VoiceNote>>,
    transitions: Mutex<Vec<JobState>>,
}

impl InMemoryNotes {
    fn seed(&self, note: VoiceNote) {
        self.rows.lock().unwrap().insert(note.id.as_uuid(), note);
    }

    fn get(&self, id: VoiceNoteId) -> VoiceNote {
        self.rows.lock().unwrap()[&id.as_uuid()].clone()
    }

    fn transitions(&self) -> Vec<JobState> {
        self.transitions.lock().unwrap().clone()
    }
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
        id: VoiceNoteId,
        transcript: &str,
        detected_language: Language,
    ) -> Result<(), RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        let note = rows
            .get_mut(&id.as_uuid())
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        note.transcript = Some(transcript.to_string());
        note.detected_language = Some(detected_language);
        note.state = JobState::AwaitingLanguageChoice;
        note.updated_at = Utc::now();
        self.transitions
            .lock()
            .unwrap()
            .push(JobState::AwaitingLanguageChoice);
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
        note.updated_at = Utc::now();
        self.transitions
            .lock()
            .unwrap()
            .push(JobState::LanguageSelected);
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
        id: VoiceNoteId,
        summary: &str,
        language: Language,
    ) -> Result<bool, RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        let note = rows
            .get_mut(&id.as_uuid())
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        if note.summary_generated_at.is_some() {
            return Ok(false);
        }
        note.summary = Some(summary.to_string());
        note.chosen_language = Some(language);
        note.state = JobState::Completed;
        note.summary_generated_at = Some(Utc::now());
        note.updated_at = Utc::now();
        self.transitions.lock().unwrap().push(JobState::Completed);
        Ok(true)
    }

    async fn mark_failed(
        &self,
        id: VoiceNoteId,
        error_message: &str,
    ) -> Result<(), RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        let note = rows
            .get_mut(&id.as_uuid())
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        if note.state != JobState::Completed {
            note.state = JobState::Failed;
            note.error_message = Some(error_message.to_string());
            self.transitions.lock().unwrap().push(JobState::Failed);
        }
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
        state: JobState,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<VoiceNote>, RepositoryError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|n| n.state == state && n.created_at < cutoff)
            .cloned()
            .collect())
    }
}

struct MockAccounts {
    credits: Mutex<f64>,
    subscribed: bool,
    preferred: Mutex<Option<Language>>,
    deduct_calls: Mutex<u32>,
}

impl MockAccounts {
    fn with_credits(credits: f64) -> Self {
        Self {
            credits: Mutex::new(credits),
            subscribed: false,
            preferred: Mutex::new(None),
            deduct_calls: Mutex::new(0),
        }
    }
}

#[async_trait::async_trait]
impl UserAccountRepository for MockAccounts {
    async fn get_or_create(&self, phone: &PhoneNumber) -> Result<UserAccount, RepositoryError> {
        Ok(UserAccount {
            phone: phone.clone(),
            credits_remaining: *self.credits.lock().unwrap(),
            subscription_active: self.subscribed,
            subscription_expiry: None,
            preferred_language: *self.preferred.lock().unwrap(),
            created_at: Utc::now(),
        })
    }

    async fn deduct_minutes(
        &self,
        _phone: &PhoneNumber,
        minutes: f64,
    ) -> Result<Deduction, RepositoryError> {
        *self.deduct_calls.lock().unwrap() += 1;
        if self.subscribed {
            return Ok(Deduction {
                deducted: 0.0,
                remaining: *self.credits.lock().unwrap(),
            });
        }
        // The lock here plays the row lock's role: check-then-update is one
        // critical section.
        let mut credits = self.credits.lock().unwrap();
        let before = *credits;
        let remaining = (before - minutes).max(0.0);
        *credits = remaining;
        Ok(Deduction {
            deducted: before - remaining,
            remaining,
        })
    }

    async fn set_preferred_language(
        &self,
        _phone: &PhoneNumber,
        language: Language,
    ) -> Result<(), RepositoryError> {
        *self.preferred.lock().unwrap() = Some(language);
        Ok(())
    }
}

#[derive(Default)]
struct MockTasks {
    created: Mutex<Vec<Task>>,
}

#[async_trait::async_trait]
impl TaskRepository for MockTasks {
    async fn create(&self, task: &Task) -> Result<(), RepositoryError> {
        self.created.lock().unwrap().push(task.clone());
        Ok(())
    }

    async fn list_open_for(
        &self,
        _phone: &PhoneNumber,
        _limit: usize,
    ) -> Result<Vec<Task>, RepositoryError> {
        Ok(vec![])
    }
}

struct StaticFetcher {
    payload: Bytes,
    content_type: Option<String>,
}

#[async_trait::async_trait]
impl MediaFetcher for StaticFetcher {
    async fn fetch(&self, _url: &str) -> Result<FetchedMedia, MediaFetchError> {
        Ok(FetchedMedia {
            bytes: self.payload.clone(),
            content_type: self.content_type.clone(),
        })
    }
}

struct MockTranscriber;

#[async_trait::async_trait]
impl TranscriptionEngine for MockTranscriber {
    async fn transcribe(
        &self,
        _audio: &[u8],
        _format: AudioFormat,
        _language_hint: Option<Language>,
    ) -> Result<Transcription, TranscriptionError> {
        Ok(Transcription {
            text: TEST_TRANSCRIPT.to_string(),
            duration: Some(Duration::from_secs(120)),
        })
    }
}

struct MockSummarizer;

#[async_trait::async_trait]
impl SummarizationEngine for MockSummarizer {
    async fn summarize(
        &self,
        _transcript: &str,
        _language: Language,
    ) -> Result<String, SummarizationError> {
        Ok(TEST_SUMMARY.to_string())
    }

    async fn extract_tasks(
        &self,
        _transcript: &str,
    ) -> Result<Vec<ExtractedTask>, SummarizationError> {
        Ok(vec![])
    }
}

#[derive(Default)]
struct RecordingMessenger {
    sent: Mutex<Vec<String>>,
}

impl RecordingMessenger {
    fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Messenger for RecordingMessenger {
    async fn send_message(&self, _to: &PhoneNumber, body: &str) -> Result<(), MessengerError> {
        self.sent.lock().unwrap().push(body.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

struct Harness {
    pipeline: AudioPipeline,
    notes: Arc<InMemoryNotes>,
    messenger: Arc<RecordingMessenger>,
    _shutdown: watch::Sender<bool>,
}

fn harness_with(
    payload: Bytes,
    config: PipelineConfig,
    accounts: Arc<MockAccounts>,
    shutdown_now: bool,
) -> Harness {
    let notes = Arc::new(InMemoryNotes::default());
    let messenger = Arc::new(RecordingMessenger::default());
    let (shutdown_tx, shutdown_rx) = watch::channel(shutdown_now);

    let pipeline = AudioPipeline::new(
        notes.clone(),
        accounts.clone(),
        Arc::new(MockTasks::default()),
        Arc::new(StaticFetcher {
            payload,
            content_type: Some("audio/ogg; codecs=opus".to_string()),
        }),
        Arc::new(MockTranscriber),
        Arc::new(MockSummarizer),
        messenger.clone(),
        config,
        shutdown_rx,
    );

    Harness {
        pipeline,
        notes,
        messenger,
        _shutdown: shutdown_tx,
    }
}

fn fast_config() -> PipelineConfig {
    PipelineConfig {
        selection_timeout: Duration::from_millis(50),
        selection_poll_start: Duration::from_millis(5),
        selection_poll_cap: Duration::from_millis(10),
        ..PipelineConfig::default()
    }
}

fn seeded_note(notes: &InMemoryNotes) -> VoiceNote {
    let note = VoiceNote::new(
        PhoneNumber::normalize("+919876543210"),
        "https://media.example.com/audio/1".to_string(),
        Some("SM0001".to_string()),
    );
    notes.seed(note.clone());
    note
}

fn assert_monotonic(transitions: &[JobState]) {
    for pair in transitions.windows(2) {
        assert!(
            pair[0].can_advance_to(pair[1]),
            "state regressed: {} -> {}",
            pair[0],
            pair[1]
        );
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn given_pending_note_with_user_choice_when_processing_then_completes_and_sends_one_summary()
{
    let harness = harness_with(
        Bytes::from(vec![0u8; 4096]),
        fast_config(),
        Arc::new(MockAccounts::with_credits(30.0)),
        false,
    );

    let mut note = seeded_note(&harness.notes);
    // The user's reply already landed in the row before the worker reached
    // the wait phase.
    note.chosen_language = Some(Language::Marathi);
    harness.notes.seed(note.clone());

    harness.pipeline.process_audio(note.id).await.unwrap();

    let stored = harness.notes.get(note.id);
    assert_eq!(stored.state, JobState::Completed);
    assert!(stored.transcript.is_some());
    assert!(stored.summary.is_some());
    assert_eq!(stored.chosen_language, Some(Language::Marathi));
    assert!(stored.summary_generated_at.is_some());

    let sent = harness.messenger.sent();
    let summaries = sent.iter().filter(|m| m.contains("Meeting Summary")).count();
    let menus = sent
        .iter()
        .filter(|m| m.contains("Choose summary language"))
        .count();
    assert_eq!(summaries, 1, "exactly one summary message: {:?}", sent);
    assert_eq!(menus, 1, "exactly one menu message: {:?}", sent);

    assert_monotonic(&harness.notes.transitions());
}

#[tokio::test]
async fn given_no_reply_when_selection_times_out_then_default_language_applies_with_notice_before_summary()
{
    let harness = harness_with(
        Bytes::from(vec![0u8; 4096]),
        fast_config(),
        Arc::new(MockAccounts::with_credits(30.0)),
        false,
    );
    let note = seeded_note(&harness.notes);

    harness.pipeline.process_audio(note.id).await.unwrap();

    let stored = harness.notes.get(note.id);
    assert_eq!(stored.state, JobState::Completed);
    assert_eq!(stored.chosen_language, Some(Language::English));

    let sent = harness.messenger.sent();
    let timeout_at = sent
        .iter()
        .position(|m| m.contains("No language selected in time"))
        .expect("timeout notice sent");
    let summary_at = sent
        .iter()
        .position(|m| m.contains("Meeting Summary"))
        .expect("summary sent");
    assert!(timeout_at < summary_at, "notice must precede summary: {:?}", sent);

    assert_monotonic(&harness.notes.transitions());
}

#[tokio::test]
async fn given_oversized_media_when_processing_then_fails_with_one_message_and_no_deduction() {
    let config = fast_config();
    let oversized = Bytes::from(vec![0u8; config.max_media_bytes + 1]);
    let accounts = Arc::new(MockAccounts::with_credits(30.0));
    let harness = harness_with(oversized, config, accounts.clone(), false);
    let note = seeded_note(&harness.notes);

    let result = harness.pipeline.process_audio(note.id).await;
    assert!(result.is_err());

    let stored = harness.notes.get(note.id);
    assert_eq!(stored.state, JobState::Failed);
    assert!(stored.error_message.is_some());

    let sent = harness.messenger.sent();
    assert_eq!(sent.len(), 1, "exactly one error message: {:?}", sent);
    assert!(sent[0].contains("too large"));

    assert_eq!(*accounts.deduct_calls.lock().unwrap(), 0);
}

#[tokio::test]
async fn given_undersized_media_when_processing_then_fails_as_corrupt() {
    let harness = harness_with(
        Bytes::from(vec![0u8; 16]),
        fast_config(),
        Arc::new(MockAccounts::with_credits(30.0)),
        false,
    );
    let note = seeded_note(&harness.notes);

    assert!(harness.pipeline.process_audio(note.id).await.is_err());
    assert_eq!(harness.notes.get(note.id).state, JobState::Failed);
    assert_eq!(harness.messenger.sent().len(), 1);
}

#[tokio::test]
async fn given_completed_note_when_completing_again_then_second_run_is_a_no_op() {
    let harness = harness_with(
        Bytes::from(vec![0u8; 4096]),
        fast_config(),
        Arc::new(MockAccounts::with_credits(30.0)),
        false,
    );

    let mut note = seeded_note(&harness.notes);
    note.transcript = Some(TEST_TRANSCRIPT.to_string());
    note.state = JobState::LanguageSelected;
    note.chosen_language = Some(Language::English);
    harness.notes.seed(note.clone());

    harness
        .pipeline
        .complete_summary(note.id, Language::English)
        .await
        .unwrap();
    harness
        .pipeline
        .complete_summary(note.id, Language::English)
        .await
        .unwrap();

    let sent = harness.messenger.sent();
    let summaries = sent.iter().filter(|m| m.contains("Meeting Summary")).count();
    assert_eq!(summaries, 1, "summary delivered exactly once: {:?}", sent);
}

#[tokio::test]
async fn given_conditional_completing_write_when_invoked_twice_then_only_first_affects_the_row() {
    let notes = InMemoryNotes::default();
    let mut note = VoiceNote::new(
        PhoneNumber::normalize("+919876543210"),
        "https://media.example.com/audio/2".to_string(),
        None,
    );
    note.transcript = Some(TEST_TRANSCRIPT.to_string());
    note.state = JobState::LanguageSelected;
    notes.seed(note.clone());

    let first = notes
        .complete_summary(note.id, TEST_SUMMARY, Language::Hindi)
        .await
        .unwrap();
    let second = notes
        .complete_summary(note.id, "a different summary entirely", Language::Tamil)
        .await
        .unwrap();

    assert!(first);
    assert!(!second);

    let stored = notes.get(note.id);
    assert_eq!(stored.summary.as_deref(), Some(TEST_SUMMARY));
    assert_eq!(stored.chosen_language, Some(Language::Hindi));
}

#[tokio::test]
async fn given_duplicate_dedupe_key_when_creating_then_second_insert_is_rejected() {
    let notes = InMemoryNotes::default();
    let phone = PhoneNumber::normalize("+919876543210");

    let first = VoiceNote::new(phone.clone(), "https://m/1".to_string(), Some("SMX".to_string()));
    let duplicate = VoiceNote::new(phone, "https://m/1".to_string(), Some("SMX".to_string()));

    assert!(notes.create_if_new(&first).await.unwrap());
    assert!(!notes.create_if_new(&duplicate).await.unwrap());
    assert_eq!(notes.rows.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn given_concurrent_deductions_when_settled_then_balance_floors_at_zero() {
    let accounts = Arc::new(MockAccounts::with_credits(30.0));
    let phone = PhoneNumber::normalize("+919876543210");

    let mut handles = Vec::new();
    for _ in 0..10 {
        let accounts = accounts.clone();
        let phone = phone.clone();
        handles.push(tokio::spawn(async move {
            accounts.deduct_minutes(&phone, 4.0).await.unwrap()
        }));
    }

    let mut total_deducted = 0.0;
    for handle in handles {
        let deduction = handle.await.unwrap();
        assert!(deduction.remaining >= 0.0, "balance went negative");
        total_deducted += deduction.deducted;
    }

    let remaining = *accounts.credits.lock().unwrap();
    assert_eq!(remaining, 0.0);
    assert!((total_deducted - 30.0).abs() < f64::EPSILON * 64.0);
}

#[tokio::test]
async fn given_shutdown_signal_when_waiting_for_selection_then_job_exits_without_writes() {
    let harness = harness_with(
        Bytes::from(vec![0u8; 4096]),
        PipelineConfig {
            selection_timeout: Duration::from_secs(30),
            ..fast_config()
        },
        Arc::new(MockAccounts::with_credits(30.0)),
        true,
    );

    let mut note = seeded_note(&harness.notes);
    note.transcript = Some(TEST_TRANSCRIPT.to_string());
    note.state = JobState::AwaitingLanguageChoice;
    harness.notes.seed(note.clone());

    harness.pipeline.process_audio(note.id).await.unwrap();

    let stored = harness.notes.get(note.id);
    assert_eq!(stored.state, JobState::AwaitingLanguageChoice, "row stays resumable");
    assert!(harness.messenger.sent().is_empty(), "no messages on cancellation");
}

#[tokio::test]
async fn given_transcription_when_complete_then_minutes_deducted_from_balance() {
    let accounts = Arc::new(MockAccounts::with_credits(30.0));
    let harness = harness_with(
        Bytes::from(vec![0u8; 4096]),
        fast_config(),
        accounts.clone(),
        false,
    );

    let mut note = seeded_note(&harness.notes);
    note.chosen_language = Some(Language::English);
    harness.notes.seed(note.clone());

    harness.pipeline.process_audio(note.id).await.unwrap();

    // 120 seconds of audio -> 2.0 minutes.
    assert_eq!(*accounts.deduct_calls.lock().unwrap(), 1);
    assert_eq!(*accounts.credits.lock().unwrap(), 28.0);
}

#[tokio::test]
async fn given_due_reminder_when_sweeping_then_notified_once_and_marked_sent() {
    struct OneReminder {
        reminder: Mutex<Reminder>,
    }

    #[async_trait::async_trait]
    impl ReminderRepository for OneReminder {
        async fn create(&self, _reminder: &Reminder) -> Result<(), RepositoryError> {
            Ok(())
        }

        async fn due_reminders(
            &self,
            now: DateTime<Utc>,
            _limit: usize,
        ) -> Result<Vec<Reminder>, RepositoryError> {
            let reminder = self.reminder.lock().unwrap().clone();
            if !reminder.sent && reminder.remind_at <= now {
                Ok(vec![reminder])
            } else {
                Ok(vec![])
            }
        }

        async fn mark_sent(
            &self,
            _id: vaani::domain::ReminderId,
        ) -> Result<bool, RepositoryError> {
            let mut reminder = self.reminder.lock().unwrap();
            if reminder.sent {
                return Ok(false);
            }
            reminder.sent = true;
            Ok(true)
        }
    }

    let phone = PhoneNumber::normalize("+919876543210");
    let reminders = Arc::new(OneReminder {
        reminder: Mutex::new(Reminder::new(
            phone,
            "Call the supplier".to_string(),
            Utc::now() - chrono::Duration::minutes(1),
        )),
    });
    let messenger = Arc::new(RecordingMessenger::default());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let sweeper = ReminderSweeper::new(
        reminders.clone(),
        messenger.clone(),
        Duration::from_millis(10),
        shutdown_rx,
    );
    let handle = tokio::spawn(sweeper.run());

    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown_tx.send(true).unwrap();
    handle.await.unwrap();

    let sent = messenger.sent();
    assert_eq!(sent.len(), 1, "reminder delivered exactly once: {:?}", sent);
    assert!(sent[0].contains("Call the supplier"));
    assert!(reminders.reminder.lock().unwrap().sent);
}
