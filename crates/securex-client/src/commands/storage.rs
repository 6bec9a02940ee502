//! Storage maintenance: statistics, settings, export/import, reset and the
//! demo/contract mode switch.

use serde::Serialize;
use tracing::info;

use securex_store::{ExportPayload, ImportStats, StorageSettings, StorageStats};

use crate::contract;
use crate::error::Result;
use crate::state::{AppState, Backend, StorageMode};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModeStatus {
    pub demo_mode: bool,
    pub contract_available: bool,
}

pub async fn storage_stats(state: &AppState) -> Result<StorageStats> {
    let route = state.route()?;
    match route.backend {
        Backend::Local => Ok(state.store.stats()),
        Backend::Contract(client) => {
            let documents = contract::fetch_user_documents(client, &route.owner).await?;
            Ok(StorageStats::from_documents(
                &documents,
                documents.len(),
                &state.store.settings(),
            ))
        }
    }
}

/// Whether the local store can currently persist data.
pub fn storage_available(state: &AppState) -> bool {
    state.store.is_available()
}

pub fn get_settings(state: &AppState) -> StorageSettings {
    state.store.settings()
}

pub fn update_settings(state: &AppState, settings: &StorageSettings) -> Result<()> {
    state.store.update_settings(settings)?;
    Ok(())
}

/// Snapshot of the local store. File bytes are not included.
pub fn export_data(state: &AppState) -> Result<ExportPayload> {
    state.require_connected()?;
    Ok(state.store.export_data()?)
}

pub fn import_data(state: &AppState, payload: &ExportPayload) -> Result<ImportStats> {
    state.require_connected()?;
    Ok(state.store.import_data(payload)?)
}

/// Remove every local document, activity entry and blob.
pub fn clear_storage(state: &AppState) -> Result<()> {
    let owner = state.require_connected()?;
    state.store.clear_all()?;
    info!(by = %owner.short(), "local storage reset");
    Ok(())
}

/// Seed example documents for the connected account when the local store is
/// empty. Does nothing outside demo mode.
pub fn initialize_demo_data(state: &AppState) -> Result<usize> {
    let owner = state.require_connected()?;
    if state.mode() != StorageMode::Demo {
        return Ok(0);
    }
    Ok(state.store.initialize_demo_data(owner.as_str())?)
}

pub fn mode_status(state: &AppState) -> ModeStatus {
    ModeStatus {
        demo_mode: state.mode() == StorageMode::Demo,
        contract_available: state.has_contract(),
    }
}

pub fn set_demo_mode(state: &AppState, demo_mode: bool) -> Result<ModeStatus> {
    state.set_demo_mode(demo_mode)?;
    Ok(mode_status(state))
}
