use serde::Deserialize;

use crate::domain::Language;

use super::Environment;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(skip, default = "default_environment")]
    pub environment: Environment,
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub openai: OpenAiSettings,
    pub twilio: TwilioSettings,
    pub pipeline: PipelineSettings,
}

fn default_environment() -> Environment {
    Environment::Local
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiSettings {
    pub api_key: String,
    pub transcribe_model: String,
    pub summarize_model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TwilioSettings {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSettings {
    pub selection_timeout_secs: u64,
    pub default_language: String,
    pub queue_capacity: usize,
    pub reminder_sweep_secs: u64,
}

impl Settings {
    /// Assemble settings from the environment, with defaults for everything
    /// except credentials and the database URL.
    pub fn from_env() -> Result<Self, SettingsError> {
        let environment_raw = env_or("APP_ENV", "local");
        let environment =
            Environment::try_from(environment_raw.clone()).map_err(|_| SettingsError::Invalid {
                name: "APP_ENV",
                value: environment_raw,
            })?;

        Ok(Self {
            environment,
            server: ServerSettings {
                host: env_or("SERVER_HOST", "0.0.0.0"),
                port: parse_env("SERVER_PORT", 3000)?,
            },
            database: DatabaseSettings {
                url: require("DATABASE_URL")?,
                max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 10)?,
            },
            openai: OpenAiSettings {
                api_key: require("OPENAI_API_KEY")?,
                transcribe_model: env_or("OPENAI_TRANSCRIBE_MODEL", "whisper-1"),
                summarize_model: env_or("OPENAI_SUMMARIZE_MODEL", "gpt-4o-mini"),
            },
            twilio: TwilioSettings {
                account_sid: require("TWILIO_ACCOUNT_SID")?,
                auth_token: require("TWILIO_AUTH_TOKEN")?,
                from_number: env_or("TWILIO_WHATSAPP_FROM", "whatsapp:+14155238886"),
            },
            pipeline: PipelineSettings {
                selection_timeout_secs: parse_env("SELECTION_TIMEOUT_SECS", 45)?,
                default_language: env_or("DEFAULT_SUMMARY_LANGUAGE", "en"),
                queue_capacity: parse_env("PIPELINE_QUEUE_CAPACITY", 128)?,
                reminder_sweep_secs: parse_env("REMINDER_SWEEP_SECS", 60)?,
            },
        })
    }

    pub fn default_language(&self) -> Result<Language, SettingsError> {
        self.pipeline
            .default_language
            .parse::<Language>()
            .map_err(|_| SettingsError::Invalid {
                name: "DEFAULT_SUMMARY_LANGUAGE",
                value: self.pipeline.default_language.clone(),
            })
    }
}

fn env_or(name: &'static str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn require(name: &'static str) -> Result<String, SettingsError> {
    std::env::var(name).map_err(|_| SettingsError::Missing(name))
}

fn parse_env<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, SettingsError> {
    match std::env::var(name) {
        Ok(value) => value.parse::<T>().map_err(|_| SettingsError::Invalid {
            name,
            value,
        }),
        Err(_) => Ok(default),
    }
}
