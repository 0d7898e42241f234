pub mod llm;
pub mod messaging;
pub mod observability;
pub mod persistence;
pub mod transcription;
