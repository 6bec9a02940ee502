use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Document, Edition, StorageStats};
use crate::store::{DocumentStore, StoreEvent};

/// Portable snapshot of the document collection. File bytes are never
/// included; only metadata travels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    pub version: String,
    pub edition: Edition,
    pub export_date: DateTime<Utc>,
    pub documents: Vec<Document>,
    pub stats: StorageStats,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImportStats {
    pub documents_imported: usize,
    /// Ids already present, files above the size limit, or documents
    /// refused because the document limit was hit.
    pub documents_skipped: usize,
}

impl DocumentStore {
    pub fn export_data(&self) -> Result<ExportPayload> {
        let settings = self.settings();
        let payload = ExportPayload {
            version: settings.version,
            edition: settings.edition,
            export_date: Utc::now(),
            documents: self.list_all(),
            stats: self.stats(),
        };
        tracing::info!(documents = payload.documents.len(), "exported storage");
        Ok(payload)
    }

    /// Merge documents from `payload` whose ids are not stored yet.
    ///
    /// Documents larger than `max_file_size` are skipped, and so is everything
    /// once `max_documents` is reached. Activity history is not touched.
    pub fn import_data(&self, payload: &ExportPayload) -> Result<ImportStats> {
        let (stats, imported_ids) = self.with_db(|db| {
            let settings = db.settings();
            let mut documents = db.list_documents();
            let mut known: HashSet<String> = documents.iter().map(|d| d.id.clone()).collect();

            let mut stats = ImportStats::default();
            let mut imported_ids = Vec::new();
            for doc in &payload.documents {
                if known.contains(&doc.id)
                    || doc.file_size > settings.max_file_size
                    || documents.len() >= settings.max_documents
                {
                    stats.documents_skipped += 1;
                    continue;
                }
                known.insert(doc.id.clone());
                imported_ids.push(doc.id.clone());
                documents.push(doc.clone());
                stats.documents_imported += 1;
            }

            if stats.documents_imported > 0 {
                documents.sort_by(|a, b| b.upload_date.cmp(&a.upload_date));
                db.save_documents(&documents)?;
            }
            Ok((stats, imported_ids))
        })?;

        tracing::info!(
            imported = stats.documents_imported,
            skipped = stats.documents_skipped,
            "imported storage"
        );
        for id in imported_ids {
            self.notify(StoreEvent::DocumentCreated { id });
        }
        Ok(stats)
    }
}
