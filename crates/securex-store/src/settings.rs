//! Storage bootstrap and the persisted quota settings.

use securex_shared::constants::{
    STORAGE_KEY_ACTIVITY_LOGS, STORAGE_KEY_DOCUMENTS, STORAGE_KEY_SETTINGS,
};

use crate::database::Database;
use crate::error::Result;
use crate::models::StorageSettings;

impl Database {
    /// Make sure every storage key holds a value: empty collections and the
    /// default settings. Existing values are left alone.
    pub fn initialize_storage(&self) -> Result<()> {
        if self.get_item(STORAGE_KEY_DOCUMENTS)?.is_none() {
            self.set_item(STORAGE_KEY_DOCUMENTS, "[]")?;
        }
        if self.get_item(STORAGE_KEY_ACTIVITY_LOGS)?.is_none() {
            self.set_item(STORAGE_KEY_ACTIVITY_LOGS, "[]")?;
        }
        if self.read_json::<StorageSettings>(STORAGE_KEY_SETTINGS).is_none() {
            tracing::debug!("writing default storage settings");
            self.save_settings(&StorageSettings::default())?;
        }
        Ok(())
    }

    /// Current settings; defaults when missing or corrupt.
    pub fn settings(&self) -> StorageSettings {
        self.read_json(STORAGE_KEY_SETTINGS).unwrap_or_default()
    }

    pub fn save_settings(&self, settings: &StorageSettings) -> Result<()> {
        self.write_json(STORAGE_KEY_SETTINGS, settings)
    }
}
