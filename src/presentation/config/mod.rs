mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    DatabaseSettings, OpenAiSettings, PipelineSettings, ServerSettings, Settings, SettingsError,
    TwilioSettings,
};
