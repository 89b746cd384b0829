use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_SITE_ORIGIN: &str = "https://www.youtube.com";
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gemini: GeminiConfig,
    pub directories: DirectoryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// Fallback key used when the user has not stored one.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub logs_dir: String,
    pub data_dir: String,
    pub settings_filename: String,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

/// Tunables for the content-side filter pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Quiet period before queued titles are flushed as one AI batch.
    pub debounce: Duration,
    /// Delay after a same-document navigation before cards are rescanned.
    pub settle_delay: Duration,
    pub history_limit: usize,
    /// Origin relative video links are resolved against.
    pub site_origin: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_API_BASE.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(2_000),
            settle_delay: Duration::from_millis(1_000),
            history_limit: 50,
            site_origin: DEFAULT_SITE_ORIGIN.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for environment variable {key}")]
    Invalid { key: &'static str, value: String },
}
