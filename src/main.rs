use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};

use vaani::application::ports::{
    MediaFetcher, Messenger, ReminderRepository, SummarizationEngine, TaskRepository,
    TranscriptionEngine, UserAccountRepository, VoiceNoteRepository,
};
use vaani::application::services::{
    AudioPipeline, PipelineConfig, PipelineWorker, ReminderSweeper,
};
use vaani::infrastructure::llm::OpenAiSummarizer;
use vaani::infrastructure::messaging::{HttpMediaFetcher, TwilioMessenger};
use vaani::infrastructure::observability::{init_tracing, TracingConfig};
use vaani::infrastructure::persistence::{
    create_pool, PgReminderRepository, PgTaskRepository, PgUserAccountRepository,
    PgVoiceNoteRepository,
};
use vaani::infrastructure::transcription::WhisperApiEngine;
use vaani::presentation::{create_router, AppState, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;
    init_tracing(
        TracingConfig {
            environment: settings.environment.to_string(),
            ..TracingConfig::default()
        },
        settings.server.port,
    );

    let pool = create_pool(&settings.database.url, settings.database.max_connections).await?;
    sqlx::migrate!().run(&pool).await?;

    let notes: Arc<dyn VoiceNoteRepository> = Arc::new(PgVoiceNoteRepository::new(pool.clone()));
    let accounts: Arc<dyn UserAccountRepository> =
        Arc::new(PgUserAccountRepository::new(pool.clone()));
    let tasks: Arc<dyn TaskRepository> = Arc::new(PgTaskRepository::new(pool.clone()));
    let reminders: Arc<dyn ReminderRepository> = Arc::new(PgReminderRepository::new(pool.clone()));

    let fetcher: Arc<dyn MediaFetcher> = Arc::new(HttpMediaFetcher::new(
        Some(settings.twilio.account_sid.clone()),
        Some(settings.twilio.auth_token.clone()),
    ));
    let transcriber: Arc<dyn TranscriptionEngine> = Arc::new(WhisperApiEngine::new(
        settings.openai.api_key.clone(),
        None,
        Some(settings.openai.transcribe_model.clone()),
    ));
    let summarizer: Arc<dyn SummarizationEngine> = Arc::new(OpenAiSummarizer::new(
        settings.openai.api_key.clone(),
        None,
        Some(settings.openai.summarize_model.clone()),
    ));
    let messenger: Arc<dyn Messenger> = Arc::new(TwilioMessenger::new(
        settings.twilio.account_sid.clone(),
        settings.twilio.auth_token.clone(),
        settings.twilio.from_number.clone(),
        None,
    ));

    let (job_sender, job_receiver) = mpsc::channel(settings.pipeline.queue_capacity);
    let (shutdown_sender, shutdown_receiver) = watch::channel(false);

    let pipeline_config = PipelineConfig {
        selection_timeout: Duration::from_secs(settings.pipeline.selection_timeout_secs),
        default_language: settings.default_language()?,
        ..PipelineConfig::default()
    };

    let pipeline = Arc::new(AudioPipeline::new(
        Arc::clone(&notes),
        Arc::clone(&accounts),
        Arc::clone(&tasks),
        fetcher,
        transcriber,
        summarizer,
        Arc::clone(&messenger),
        pipeline_config,
        shutdown_receiver.clone(),
    ));

    let worker = PipelineWorker::new(job_receiver, pipeline, shutdown_receiver.clone());
    let worker_handle = tokio::spawn(worker.run());

    let sweeper = ReminderSweeper::new(
        reminders,
        Arc::clone(&messenger),
        Duration::from_secs(settings.pipeline.reminder_sweep_secs),
        shutdown_receiver,
    );
    let sweeper_handle = tokio::spawn(sweeper.run());

    let state = AppState {
        notes,
        accounts,
        messenger,
        job_sender,
    };
    let router = create_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop workers after the HTTP server drains; in-flight jobs observe the
    // flag at their next suspension point and exit cleanly.
    let _ = shutdown_sender.send(true);
    let _ = worker_handle.await;
    let _ = sweeper_handle.await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received");
}
