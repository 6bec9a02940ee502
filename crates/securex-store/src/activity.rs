use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;

use securex_shared::constants::{ACTIVITY_LOG_CAP, STORAGE_KEY_ACTIVITY_LOGS};

use crate::database::Database;
use crate::error::Result;
use crate::models::{ActivityEntry, ActivityKind, NewActivity};

/// `<type>-<unix millis>-<9 random chars>`
fn activity_id(kind: ActivityKind) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("{}-{}-{}", kind, Utc::now().timestamp_millis(), suffix)
}

impl Database {
    /// All entries, newest first. Empty when missing or corrupt.
    pub fn list_activity(&self) -> Vec<ActivityEntry> {
        self.read_collection(STORAGE_KEY_ACTIVITY_LOGS)
    }

    pub fn append_activity(&self, activity: NewActivity) -> Result<ActivityEntry> {
        self.append_activity_capped(activity, ACTIVITY_LOG_CAP)
    }

    // Prepends, then drops everything past `cap` from the old end.
    pub(crate) fn append_activity_capped(
        &self,
        activity: NewActivity,
        cap: usize,
    ) -> Result<ActivityEntry> {
        let mut logs = self.list_activity();

        let entry = ActivityEntry {
            id: activity_id(activity.kind),
            kind: activity.kind,
            action: activity.kind.action().to_string(),
            file_name: activity.file_name,
            content_hash: activity.content_hash,
            user: activity.user,
            timestamp: activity.timestamp.unwrap_or_else(Utc::now),
            block_number: activity.block_number,
            transaction_hash: activity.transaction_hash,
            gas_used: activity.gas_used,
            status: activity.status,
            provenance: activity.provenance,
        };

        logs.insert(0, entry.clone());
        logs.truncate(cap);

        self.write_json(STORAGE_KEY_ACTIVITY_LOGS, &logs)?;

        tracing::debug!(id = %entry.id, kind = %entry.kind, total = logs.len(), "activity appended");
        Ok(entry)
    }
}
