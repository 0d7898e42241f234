mod audio_pipeline;
mod credit_ledger;
pub mod delivery;
pub mod language_detector;
mod pipeline_worker;
mod reminder_sweeper;

pub use audio_pipeline::{AudioPipeline, PipelineConfig, PipelineError};
pub use credit_ledger::{billable_minutes, CreditLedger};
pub use pipeline_worker::{PipelineJob, PipelineWorker};
pub use reminder_sweeper::ReminderSweeper;
