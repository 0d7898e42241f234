mod media_fetcher;
mod messenger;
mod reminder_repository;
mod repository_error;
mod summarization_engine;
mod task_repository;
mod transcription_engine;
mod user_account_repository;
mod voice_note_repository;

pub use media_fetcher::{FetchedMedia, MediaFetchError, MediaFetcher};
pub use messenger::{Messenger, MessengerError};
pub use reminder_repository::ReminderRepository;
pub use repository_error::RepositoryError;
pub use summarization_engine::{ExtractedTask, SummarizationEngine, SummarizationError};
pub use task_repository::TaskRepository;
pub use transcription_engine::{Transcription, TranscriptionEngine, TranscriptionError};
pub use user_account_repository::{Deduction, UserAccountRepository};
pub use voice_note_repository::VoiceNoteRepository;
