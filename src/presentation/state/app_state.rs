use std::sync::Arc;

use tokio::sync::mpsc;

use crate::application::ports::{Messenger, UserAccountRepository, VoiceNoteRepository};
use crate::application::services::PipelineJob;

#[derive(Clone)]
pub struct AppState {
    pub notes: Arc<dyn VoiceNoteRepository>,
    pub accounts: Arc<dyn UserAccountRepository>,
    pub messenger: Arc<dyn Messenger>,
    pub job_sender: mpsc::Sender<PipelineJob>,
}
