mod audio_format;
mod job_state;
mod language;
mod phone_number;
mod reminder;
mod task;
mod user_account;
mod voice_note;
mod voice_note_id;

pub use audio_format::AudioFormat;
pub use job_state::JobState;
pub use language::Language;
pub use phone_number::PhoneNumber;
pub use reminder::{Reminder, ReminderId};
pub use task::{Task, TaskId, TaskStatus};
pub use user_account::{UserAccount, DEFAULT_STARTING_CREDITS};
pub use voice_note::VoiceNote;
pub use voice_note_id::VoiceNoteId;
