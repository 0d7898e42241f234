use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::application::ports::{
    MediaFetchError, MediaFetcher, Messenger, RepositoryError, SummarizationEngine,
    SummarizationError, TaskRepository, TranscriptionEngine, TranscriptionError,
    UserAccountRepository, VoiceNoteRepository,
};
use crate::application::services::credit_ledger::{billable_minutes, CreditLedger};
use crate::application::services::{delivery, language_detector};
use crate::domain::{AudioFormat, JobState, Language, PhoneNumber, Task, VoiceNote, VoiceNoteId};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Hard ceiling on the downloaded payload.
    pub max_media_bytes: usize,
    /// Payloads under this are treated as corrupt.
    pub min_media_bytes: usize,
    /// How long Phase 2 waits for a language reply before applying the
    /// default.
    pub selection_timeout: Duration,
    /// Initial poll backoff while waiting for a selection.
    pub selection_poll_start: Duration,
    /// Poll backoff cap.
    pub selection_poll_cap: Duration,
    /// Applied when the selection window lapses and the account has no
    /// stored preference.
    pub default_language: Language,
    /// Per-message character ceiling for outbound delivery.
    pub max_message_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_media_bytes: 24 * 1024 * 1024,
            min_media_bytes: 128,
            selection_timeout: Duration::from_secs(45),
            selection_poll_start: Duration::from_secs(1),
            selection_poll_cap: Duration::from_secs(8),
            default_language: Language::English,
            max_message_chars: delivery::MAX_MESSAGE_CHARS,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("voice note not found: {0}")]
    NoteNotFound(VoiceNoteId),
    #[error("media fetch: {0}")]
    MediaFetch(#[from] MediaFetchError),
    #[error("audio payload too large: {0} bytes")]
    MediaTooLarge(usize),
    #[error("audio payload too small: {0} bytes")]
    MediaTooSmall(usize),
    #[error("transcription: {0}")]
    Transcription(#[from] TranscriptionError),
    #[error("summarization: {0}")]
    Summarization(#[from] SummarizationError),
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
    #[error("transcript missing for {0}")]
    TranscriptMissing(VoiceNoteId),
    #[error("summary empty or too short")]
    SummaryTooShort,
}

enum Selection {
    Chosen(Language),
    TimedOut,
    Cancelled,
}

/// Orchestrates one voice note through download, transcription, language
/// selection, summarization and delivery. Every phase transition is a
/// committed row write before any externally observable side effect, so a
/// crash between phases leaves the row resumable.
///
/// This is the only component that sends user-facing messages or decides
/// state transitions; adapters report typed errors upward.
pub struct AudioPipeline {
    notes: Arc<dyn VoiceNoteRepository>,
    accounts: Arc<dyn UserAccountRepository>,
    tasks: Arc<dyn TaskRepository>,
    fetcher: Arc<dyn MediaFetcher>,
    transcriber: Arc<dyn TranscriptionEngine>,
    summarizer: Arc<dyn SummarizationEngine>,
    messenger: Arc<dyn Messenger>,
    ledger: CreditLedger,
    config: PipelineConfig,
    shutdown: watch::Receiver<bool>,
}

impl AudioPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        notes: Arc<dyn VoiceNoteRepository>,
        accounts: Arc<dyn UserAccountRepository>,
        tasks: Arc<dyn TaskRepository>,
        fetcher: Arc<dyn MediaFetcher>,
        transcriber: Arc<dyn TranscriptionEngine>,
        summarizer: Arc<dyn SummarizationEngine>,
        messenger: Arc<dyn Messenger>,
        config: PipelineConfig,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let ledger = CreditLedger::new(Arc::clone(&accounts));
        Self {
            notes,
            accounts,
            tasks,
            fetcher,
            transcriber,
            summarizer,
            messenger,
            ledger,
            config,
            shutdown,
        }
    }

    /// Entry point for a freshly enqueued note (`state == pending`). A
    /// redelivered job whose row already reached `awaiting_language_choice`
    /// resumes at the selection wait; rows past that point are left alone.
    #[tracing::instrument(skip(self), fields(note_id = %note_id))]
    pub async fn process_audio(&self, note_id: VoiceNoteId) -> Result<(), PipelineError> {
        let note = self
            .notes
            .get_by_id(note_id)
            .await?
            .ok_or(PipelineError::NoteNotFound(note_id))?;

        match note.state {
            JobState::Pending => {
                if let Err(e) = self.acquire_and_transcribe(&note).await {
                    self.fail_note(&note, &e).await;
                    return Err(e);
                }
            }
            JobState::AwaitingLanguageChoice => {
                tracing::info!("Resuming note at selection wait");
            }
            state => {
                tracing::info!(state = %state, "Note already past transcription, nothing to do");
                return Ok(());
            }
        }

        self.finish_after_selection(&note).await
    }

    /// Phase 1: download, sanity-check, transcribe, detect language, persist
    /// the combined transcription write, deduct estimated minutes and send
    /// the selection menu.
    async fn acquire_and_transcribe(&self, note: &VoiceNote) -> Result<(), PipelineError> {
        let media = self.fetcher.fetch(&note.audio_source).await?;
        let byte_len = media.bytes.len();

        if byte_len > self.config.max_media_bytes {
            return Err(PipelineError::MediaTooLarge(byte_len));
        }
        if byte_len < self.config.min_media_bytes {
            return Err(PipelineError::MediaTooSmall(byte_len));
        }

        let format = AudioFormat::from_content_type(media.content_type.as_deref().unwrap_or(""));
        tracing::debug!(bytes = byte_len, format = format.extension(), "Media downloaded");

        let transcription = self.transcriber.transcribe(&media.bytes, format, None).await?;
        let transcript = transcription.text.trim().to_string();
        let detected = language_detector::detect(&transcript);
        tracing::info!(
            chars = transcript.len(),
            detected = %detected,
            "Transcription complete"
        );

        self.notes
            .save_transcription(note.id, &transcript, detected)
            .await?;

        let minutes = billable_minutes(transcription.duration, byte_len);
        if let Err(e) = self.ledger.deduct_if_needed(&note.owner_phone, minutes).await {
            // The transcript is already persisted; billing trouble must not
            // lose the user's note.
            tracing::warn!(error = %e, "Credit deduction failed");
        }

        self.send(&note.owner_phone, &delivery::language_menu_message(detected))
            .await;
        Ok(())
    }

    /// Phase 2 and 3: wait (bounded, cancellable) for the user's choice,
    /// defaulting on timeout, then summarize and deliver.
    async fn finish_after_selection(&self, note: &VoiceNote) -> Result<(), PipelineError> {
        let selection = match self.await_selection(note.id).await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Selection wait failed");
                self.send(&note.owner_phone, APOLOGY_GENERIC).await;
                return Err(e.into());
            }
        };

        match selection {
            Selection::Chosen(language) => self.complete_summary(note.id, language).await,
            Selection::Cancelled => {
                tracing::info!("Shutdown during selection wait, leaving row resumable");
                Ok(())
            }
            Selection::TimedOut => {
                let default = match self.accounts.get_or_create(&note.owner_phone).await {
                    Ok(account) => account
                        .preferred_language
                        .unwrap_or(self.config.default_language),
                    Err(e) => {
                        tracing::warn!(error = %e, "Account lookup failed, using configured default");
                        self.config.default_language
                    }
                };

                let language = if self.notes.set_chosen_language(note.id, default).await? {
                    self.send(
                        &note.owner_phone,
                        &delivery::selection_timeout_message(default),
                    )
                    .await;
                    default
                } else {
                    // A reply raced the timeout; honor whatever won the row.
                    self.notes
                        .get_chosen_language(note.id)
                        .await?
                        .unwrap_or(default)
                };

                self.complete_summary(note.id, language).await
            }
        }
    }

    /// Bounded wait for `chosen_language`, polling with exponential backoff.
    /// Cancellable by the shutdown signal; cancellation performs no writes.
    async fn await_selection(&self, id: VoiceNoteId) -> Result<Selection, RepositoryError> {
        let deadline = Instant::now() + self.config.selection_timeout;
        let mut delay = self.config.selection_poll_start;
        let mut shutdown = self.shutdown.clone();

        if *shutdown.borrow() {
            return Ok(Selection::Cancelled);
        }

        loop {
            if let Some(language) = self.notes.get_chosen_language(id).await? {
                return Ok(Selection::Chosen(language));
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(Selection::TimedOut);
            }

            let sleep_for = delay.min(deadline - now);
            tokio::select! {
                _ = tokio::time::sleep(sleep_for) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        return Ok(Selection::Cancelled);
                    }
                }
            }
            delay = (delay * 2).min(self.config.selection_poll_cap);
        }
    }

    /// Phase 3, also invoked directly when a webhook reply enqueues a
    /// completion job. Failures here are recoverable: the transcript is
    /// preserved and a retry re-runs summarization without re-downloading.
    #[tracing::instrument(skip(self), fields(note_id = %note_id, language = %language))]
    pub async fn complete_summary(
        &self,
        note_id: VoiceNoteId,
        language: Language,
    ) -> Result<(), PipelineError> {
        let note = self
            .notes
            .get_by_id(note_id)
            .await?
            .ok_or(PipelineError::NoteNotFound(note_id))?;

        if note.summary_generated_at.is_some() {
            tracing::info!("Summary already generated (idempotent)");
            return Ok(());
        }

        let transcript = match note.transcript.as_deref() {
            Some(t) => t.to_string(),
            None => {
                let err = PipelineError::TranscriptMissing(note_id);
                self.fail_note(&note, &err).await;
                return Err(err);
            }
        };

        let result = self.summarize_and_deliver(&note, &transcript, language).await;
        if let Err(e) = &result {
            tracing::error!(error = %e, "Summary completion failed, transcript preserved for retry");
            self.send(&note.owner_phone, APOLOGY_SUMMARY_FAILED).await;
        }
        result
    }

    async fn summarize_and_deliver(
        &self,
        note: &VoiceNote,
        transcript: &str,
        language: Language,
    ) -> Result<(), PipelineError> {
        let summary = self.summarizer.summarize(transcript, language).await?;
        if summary.trim().chars().count() < 10 {
            return Err(PipelineError::SummaryTooShort);
        }

        let committed = self
            .notes
            .complete_summary(note.id, &summary, language)
            .await?;
        if !committed {
            tracing::info!("Completing write affected zero rows, another execution finished first");
            return Ok(());
        }

        for message in
            delivery::summary_messages(&summary, language, self.config.max_message_chars)
        {
            self.send(&note.owner_phone, &message).await;
        }

        if let Err(e) = self
            .accounts
            .set_preferred_language(&note.owner_phone, language)
            .await
        {
            tracing::debug!(error = %e, "Could not store language preference");
        }

        self.extract_and_record_tasks(note, transcript).await;
        Ok(())
    }

    /// Best-effort task extraction after a delivered summary; failures are
    /// logged and never surface to the user as a job failure.
    async fn extract_and_record_tasks(&self, note: &VoiceNote, transcript: &str) {
        let items = match self.summarizer.extract_tasks(transcript).await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(error = %e, "Task extraction failed, summary already delivered");
                return;
            }
        };
        if items.is_empty() {
            tracing::debug!("No tasks found in transcript");
            return;
        }

        let mut titles = Vec::new();
        for item in items {
            let task = Task::new(note.owner_phone.clone(), item.title.clone(), item.due_at);
            match self.tasks.create(&task).await {
                Ok(()) => titles.push(item.title),
                Err(e) => tracing::warn!(error = %e, title = %item.title, "Failed to persist task"),
            }
        }
        if !titles.is_empty() {
            self.send(
                &note.owner_phone,
                &delivery::tasks_confirmation_message(&titles),
            )
            .await;
        }
    }

    /// Single fatal-path handler: marks the row failed and sends exactly one
    /// user-facing message matched to the error kind.
    async fn fail_note(&self, note: &VoiceNote, error: &PipelineError) {
        if let Err(e) = self.notes.mark_failed(note.id, &error.to_string()).await {
            tracing::error!(error = %e, "Failed to record failure state");
        }

        let message = match error {
            PipelineError::MediaTooLarge(_) => {
                "⚠️ Audio file too large (max 24 MB). Please send a shorter note."
            }
            PipelineError::MediaTooSmall(_) => {
                "⚠️ Audio file too small / corrupt. Please try again."
            }
            PipelineError::Transcription(_) => {
                "⚠️ Could not transcribe this audio. Please re-record and try again."
            }
            _ => APOLOGY_GENERIC,
        };
        self.send(&note.owner_phone, message).await;
    }

    /// Outbound sends are fire-and-forget from the state machine's view;
    /// the messaging adapter owns transient-error retries.
    async fn send(&self, to: &PhoneNumber, body: &str) {
        if let Err(e) = self.messenger.send_message(to, body).await {
            tracing::error!(error = %e, to = %to, "Message delivery failed");
        }
    }
}

const APOLOGY_GENERIC: &str = "⚠️ Processing failed. Please try again.";
const APOLOGY_SUMMARY_FAILED: &str = "⚠️ Failed to generate summary. Please try again.";
