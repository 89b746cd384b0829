use std::{env, time::Duration};

use url::Url;

use super::env::{
    AppConfig, ConfigError, DirectoryConfig, GeminiConfig, LoggingConfig, DEFAULT_GEMINI_API_BASE,
    DEFAULT_GEMINI_MODEL,
};

pub fn load_config() -> Result<AppConfig, ConfigError> {
    AppConfig::from_env()
}

impl AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = var("GEMINI_API_BASE")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.to_string());
        if Url::parse(&base_url).is_err() {
            return Err(ConfigError::Invalid {
                key: "GEMINI_API_BASE",
                value: base_url,
            });
        }

        let timeout_ms = parse_u64(&var, "AI_REQUEST_TIMEOUT_MS").unwrap_or(30_000);
        if timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "AI_REQUEST_TIMEOUT_MS",
                value: timeout_ms.to_string(),
            });
        }

        let gemini = GeminiConfig {
            api_key: var("GEMINI_API_KEY").filter(|v| !v.is_empty()),
            model: var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            base_url,
            request_timeout: Duration::from_millis(timeout_ms),
        };

        let directories = DirectoryConfig {
            logs_dir: var("LOGS_DIR").unwrap_or_else(|| "logs".to_string()),
            data_dir: var("DATA_DIR").unwrap_or_else(|| "data".to_string()),
            settings_filename: var("SETTINGS_FILENAME")
                .unwrap_or_else(|| "settings.json".to_string()),
        };

        let logging = LoggingConfig {
            level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        };

        Ok(Self {
            gemini,
            directories,
            logging,
        })
    }
}

fn parse_u64(var: impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    var(key).and_then(|value| value.trim().parse::<u64>().ok())
}
