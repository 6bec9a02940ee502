//! Document collection CRUD on top of the string-keyed store.
//!
//! These helpers are not synchronized; a multi-step mutation must run while
//! the caller holds exclusive access to the [`Database`]. Mutations touching
//! both the documents and the activity log run inside one transaction.

use chrono::Utc;
use uuid::Uuid;

use securex_shared::constants::STORAGE_KEY_DOCUMENTS;
use securex_shared::mime::mime_type_for;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{
    ActivityKind, Document, DocumentUpdate, NewActivity, NewDocument, StorageSettings,
};
use crate::simulated;

/// Counter-bumping access to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    View,
    Download,
}

impl Access {
    pub fn activity_kind(self) -> ActivityKind {
        match self {
            Access::View => ActivityKind::View,
            Access::Download => ActivityKind::Download,
        }
    }
}

impl Database {
    /// All documents, newest first. Empty when missing or corrupt.
    pub fn list_documents(&self) -> Vec<Document> {
        self.read_collection(STORAGE_KEY_DOCUMENTS)
    }

    pub fn save_documents(&self, documents: &[Document]) -> Result<()> {
        self.write_json(STORAGE_KEY_DOCUMENTS, documents)
    }

    pub fn get_document(&self, id: &str) -> Option<Document> {
        self.list_documents().into_iter().find(|d| d.id == id)
    }

    /// Reject a file of `file_size` bytes if it would break the quota.
    pub fn check_quota(&self, settings: &StorageSettings, file_size: u64) -> Result<()> {
        if file_size > settings.max_file_size {
            return Err(StoreError::FileTooLarge {
                size: file_size,
                max: settings.max_file_size,
            });
        }
        if self.list_documents().len() >= settings.max_documents {
            return Err(StoreError::DocumentLimit {
                max: settings.max_documents,
            });
        }
        Ok(())
    }

    /// Reject a batch of files unless every one of them fits the quota.
    pub fn check_batch_quota(&self, settings: &StorageSettings, sizes: &[u64]) -> Result<()> {
        if let Some(&size) = sizes.iter().find(|&&s| s > settings.max_file_size) {
            return Err(StoreError::FileTooLarge {
                size,
                max: settings.max_file_size,
            });
        }
        if self.list_documents().len() + sizes.len() > settings.max_documents {
            return Err(StoreError::DocumentLimit {
                max: settings.max_documents,
            });
        }
        Ok(())
    }

    /// Build a document from `new`, prepend it and record an upload activity.
    pub fn insert_document(&self, new: NewDocument) -> Result<Document> {
        let settings = self.settings();
        self.check_quota(&settings, new.file_size)?;

        let mut documents = self.list_documents();

        let mut id = Uuid::new_v4().to_string();
        while documents.iter().any(|d| d.id == id) {
            id = Uuid::new_v4().to_string();
        }

        let document = Document {
            id,
            mime_type: mime_type_for(&new.file_name).to_string(),
            file_name: new.file_name,
            content_hash: new.content_hash,
            file_size: new.file_size,
            uploader: new.uploader,
            upload_date: new.upload_date.unwrap_or_else(Utc::now),
            views: 0,
            download_count: 0,
            last_accessed: None,
            last_download: None,
            chain: simulated::upload_metadata(new.transaction_hash, new.document_id),
        };

        documents.insert(0, document.clone());

        let tx = self.conn().unchecked_transaction()?;
        self.save_documents(&documents)?;
        self.append_activity(NewActivity {
            timestamp: Some(document.upload_date),
            ..NewActivity::for_document(ActivityKind::Upload, &document)
        })?;
        tx.commit()?;

        tracing::info!(
            id = %document.id,
            file_name = %document.file_name,
            size = document.file_size,
            uploader = %document.uploader.short(),
            "document created"
        );
        Ok(document)
    }

    /// Merge `update` into the document with `id`. `None` if there is none.
    pub fn update_document(&self, id: &str, update: DocumentUpdate) -> Result<Option<Document>> {
        let mut documents = self.list_documents();
        let Some(doc) = documents.iter_mut().find(|d| d.id == id) else {
            return Ok(None);
        };

        update.apply_to(doc);
        let updated = doc.clone();

        self.save_documents(&documents)?;
        Ok(Some(updated))
    }

    /// Bump the view or download counter and log the access.
    ///
    /// The activity entry carries the document's identity as it was before
    /// the update. `None` if `id` is unknown; nothing is written then.
    pub fn record_access(&self, id: &str, access: Access) -> Result<Option<Document>> {
        let mut documents = self.list_documents();
        let Some(doc) = documents.iter_mut().find(|d| d.id == id) else {
            return Ok(None);
        };

        let activity = simulated::access_activity(access.activity_kind(), doc);

        let now = Utc::now();
        match access {
            Access::View => {
                doc.views = doc.views.saturating_add(1);
                doc.last_accessed = Some(now);
            }
            Access::Download => {
                doc.download_count = doc.download_count.saturating_add(1);
                doc.last_download = Some(now);
            }
        }
        let updated = doc.clone();

        let tx = self.conn().unchecked_transaction()?;
        self.save_documents(&documents)?;
        self.append_activity(NewActivity {
            timestamp: Some(now),
            ..activity
        })?;
        tx.commit()?;

        tracing::debug!(id, access = ?access, views = updated.views, downloads = updated.download_count, "document accessed");
        Ok(Some(updated))
    }

    /// Remove the document with `id`, returning it if it existed.
    pub fn delete_document(&self, id: &str) -> Result<Option<Document>> {
        let mut documents = self.list_documents();
        let Some(pos) = documents.iter().position(|d| d.id == id) else {
            return Ok(None);
        };

        let removed = documents.remove(pos);
        self.save_documents(&documents)?;
        Ok(Some(removed))
    }
}
