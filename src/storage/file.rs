use std::{io::ErrorKind, path::PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::domain::Settings;

use super::{SettingsStore, StoreError};

/// Settings persisted as one JSON object on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl SettingsStore for JsonFileStore {
    async fn load(&self) -> Result<Settings, StoreError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!(
                    target: "storage",
                    path = %self.path.display(),
                    "no settings file yet"
                );
                return Ok(Settings::default());
            }
            Err(err) => return Err(self.io_error(err)),
        };
        if raw.trim().is_empty() {
            return Ok(Settings::default());
        }
        serde_json::from_str(&raw).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    async fn save(&self, settings: &Settings) -> Result<(), StoreError> {
        let encoded = serde_json::to_vec_pretty(settings)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|err| self.io_error(err))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, encoded)
            .await
            .map_err(|err| self.io_error(err))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|err| self.io_error(err))?;
        tracing::debug!(target: "storage", path = %self.path.display(), "settings saved");
        Ok(())
    }
}
