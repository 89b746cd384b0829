use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::Settings;

pub mod file;
pub mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

/// Persisted filter settings shared between the popup and the pipeline.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn load(&self) -> Result<Settings, StoreError>;
    async fn save(&self, settings: &Settings) -> Result<(), StoreError>;
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("settings file {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to encode settings: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Loads settings, falling back to defaults (no keywords, AI off) when the
/// store is unreadable.
pub async fn load_or_default(store: &dyn SettingsStore) -> Settings {
    match store.load().await {
        Ok(settings) => settings,
        Err(err) => {
            tracing::warn!(
                target: "storage",
                error = %err,
                "settings unavailable; using defaults"
            );
            Settings::default()
        }
    }
}
