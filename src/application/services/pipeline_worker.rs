use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::application::services::AudioPipeline;
use crate::domain::{Language, VoiceNoteId};

/// Unit of work pulled off the shared queue.
#[derive(Debug)]
pub enum PipelineJob {
    ProcessAudio { note_id: VoiceNoteId },
    CompleteSummary { note_id: VoiceNoteId, language: Language },
}

/// Drains the job queue and runs each job to completion in isolation. No
/// in-process state is shared between jobs; coordination happens through the
/// persisted rows, so any worker instance can pick up any job.
pub struct PipelineWorker {
    receiver: mpsc::Receiver<PipelineJob>,
    pipeline: Arc<AudioPipeline>,
    shutdown: watch::Receiver<bool>,
}

impl PipelineWorker {
    pub fn new(
        receiver: mpsc::Receiver<PipelineJob>,
        pipeline: Arc<AudioPipeline>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            receiver,
            pipeline,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        tracing::info!("Pipeline worker started");
        loop {
            let job = tokio::select! {
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                    continue;
                }
                job = self.receiver.recv() => match job {
                    Some(job) => job,
                    None => break,
                },
            };

            // Job errors stop at this boundary; the row already records the
            // outcome and the user has been notified by the orchestrator.
            match job {
                PipelineJob::ProcessAudio { note_id } => {
                    let span = tracing::info_span!("audio_job", note_id = %note_id);
                    let _guard = span.enter();
                    if let Err(e) = self.pipeline.process_audio(note_id).await {
                        tracing::error!(error = %e, "Audio job failed");
                    }
                }
                PipelineJob::CompleteSummary { note_id, language } => {
                    let span =
                        tracing::info_span!("summary_job", note_id = %note_id, language = %language);
                    let _guard = span.enter();
                    if let Err(e) = self.pipeline.complete_summary(note_id, language).await {
                        tracing::error!(error = %e, "Summary job failed");
                    }
                }
            }
        }
        tracing::info!("Pipeline worker stopped");
    }
}
