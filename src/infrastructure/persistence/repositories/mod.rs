mod pg_reminder_repository;
mod pg_task_repository;
mod pg_user_account_repository;
mod pg_voice_note_repository;

pub use pg_reminder_repository::PgReminderRepository;
pub use pg_task_repository::PgTaskRepository;
pub use pg_user_account_repository::PgUserAccountRepository;
pub use pg_voice_note_repository::PgVoiceNoteRepository;
