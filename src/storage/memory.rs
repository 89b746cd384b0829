use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::Settings;

use super::{SettingsStore, StoreError};

#[derive(Debug, Default)]
pub struct MemoryStore {
    settings: Mutex<Settings>,
}

impl MemoryStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Mutex::new(settings.normalized()),
        }
    }

    /// Replaces the stored settings, as the popup would.
    pub fn set(&self, settings: Settings) {
        *self.settings.lock() = settings.normalized();
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn load(&self) -> Result<Settings, StoreError> {
        Ok(self.settings.lock().clone())
    }

    async fn save(&self, settings: &Settings) -> Result<(), StoreError> {
        self.set(settings.clone());
        Ok(())
    }
}
