//! The document store service shared by every view.
//!
//! [`DocumentStore`] owns the [`Database`] behind a mutex: each operation
//! holds the lock for its whole read-modify-write cycle, so concurrent
//! callers observe mutations in call order and never lose an update.
//! Completed mutations are announced on a broadcast channel; views that do
//! not subscribe simply re-read.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{Duration, Utc};
use tokio::sync::broadcast;

use securex_shared::Address;

use crate::database::Database;
use crate::documents::Access;
use crate::error::{Result, StoreError};
use crate::models::{
    ActivityEntry, ActivityKind, Document, DocumentUpdate, NewActivity, NewDocument,
    StorageSettings, StorageStats,
};

const EVENT_CAPACITY: usize = 64;
const AVAILABILITY_KEY: &str = "__securex_storage_check__";

/// Change notifications published after a mutation commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    DocumentCreated { id: String },
    DocumentUpdated { id: String },
    DocumentDeleted { id: String },
    ActivityAppended { id: String },
    SettingsChanged,
    Cleared,
}

pub struct DocumentStore {
    db: Mutex<Database>,
    events: broadcast::Sender<StoreEvent>,
}

impl DocumentStore {
    /// Wrap an open database, initializing empty storage keys.
    pub fn new(db: Database) -> Result<Self> {
        db.initialize_storage()?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            db: Mutex::new(db),
            events,
        })
    }

    /// Store at the platform default location.
    pub fn open_default() -> Result<Self> {
        Self::new(Database::new()?)
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        Self::new(Database::open_at(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::new(Database::open_in_memory()?)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Database>> {
        self.db.lock().map_err(|_| StoreError::LockPoisoned)
    }

    // Reads never fail from the caller's point of view.
    fn read<T: Default>(&self, f: impl FnOnce(&Database) -> T) -> T {
        match self.lock() {
            Ok(db) => f(&db),
            Err(e) => {
                tracing::error!(error = %e, "store unavailable, returning empty result");
                T::default()
            }
        }
    }

    pub(crate) fn notify(&self, event: StoreEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Every document, newest first.
    pub fn list_all(&self) -> Vec<Document> {
        self.read(|db| db.list_documents())
    }

    /// Documents whose uploader equals `owner`, ignoring case.
    pub fn list_for_owner(&self, owner: &str) -> Vec<Document> {
        self.list_all()
            .into_iter()
            .filter(|d| d.is_owned_by(owner))
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<Document> {
        self.read(|db| db.get_document(id))
    }

    /// Case-insensitive substring search over name, hash and MIME type.
    pub fn search(&self, query: &str) -> Vec<Document> {
        self.list_all()
            .into_iter()
            .filter(|d| d.matches_query(query))
            .collect()
    }

    pub fn stats(&self) -> StorageStats {
        self.read(|db| {
            StorageStats::from_documents(
                &db.list_documents(),
                db.list_activity().len(),
                &db.settings(),
            )
        })
    }

    pub fn settings(&self) -> StorageSettings {
        self.read(|db| db.settings())
    }

    pub fn update_settings(&self, settings: &StorageSettings) -> Result<()> {
        self.lock()?.save_settings(settings)?;
        tracing::info!(
            max_file_size = settings.max_file_size,
            max_documents = settings.max_documents,
            "storage settings updated"
        );
        self.notify(StoreEvent::SettingsChanged);
        Ok(())
    }

    /// Fail with a quota error if a file of `file_size` bytes could not be
    /// created right now.
    pub fn check_quota(&self, file_size: u64) -> Result<()> {
        let db = self.lock()?;
        let settings = db.settings();
        db.check_quota(&settings, file_size)
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Create a document and log its upload.
    ///
    /// Quota violations are reported before anything is written.
    pub fn create(&self, new: NewDocument) -> Result<Document> {
        let (document, upload_log) = {
            let db = self.lock()?;
            let document = db.insert_document(new)?;
            let upload_log = db.list_activity().first().map(|e| e.id.clone());
            (document, upload_log)
        };

        self.notify(StoreEvent::DocumentCreated {
            id: document.id.clone(),
        });
        if let Some(id) = upload_log {
            self.notify(StoreEvent::ActivityAppended { id });
        }
        Ok(document)
    }

    /// Merge `update` into the document. `Ok(None)` if `id` is unknown.
    pub fn update(&self, id: &str, update: DocumentUpdate) -> Result<Option<Document>> {
        let updated = self.lock()?.update_document(id, update)?;
        if updated.is_some() {
            self.notify(StoreEvent::DocumentUpdated { id: id.to_string() });
        }
        Ok(updated)
    }

    pub fn increment_views(&self, id: &str) -> Result<Option<Document>> {
        self.access(id, Access::View)
    }

    pub fn increment_downloads(&self, id: &str) -> Result<Option<Document>> {
        self.access(id, Access::Download)
    }

    fn access(&self, id: &str, access: Access) -> Result<Option<Document>> {
        let (updated, log_id) = {
            let db = self.lock()?;
            let updated = db.record_access(id, access)?;
            let log_id = updated
                .as_ref()
                .and_then(|_| db.list_activity().first().map(|e| e.id.clone()));
            (updated, log_id)
        };

        if updated.is_some() {
            self.notify(StoreEvent::DocumentUpdated { id: id.to_string() });
        }
        if let Some(log_id) = log_id {
            self.notify(StoreEvent::ActivityAppended { id: log_id });
        }
        Ok(updated)
    }

    /// Remove a document. Its local blob goes too unless another document
    /// shares the content hash. Activity history is kept.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let removed = {
            let db = self.lock()?;
            let removed = db.delete_document(id)?;
            if let Some(doc) = &removed {
                let shared = db
                    .list_documents()
                    .iter()
                    .any(|d| d.content_hash == doc.content_hash);
                if !shared {
                    db.delete_blob(&doc.content_hash)?;
                }
            }
            removed
        };

        let Some(doc) = removed else {
            return Ok(false);
        };
        tracing::info!(id = %doc.id, file_name = %doc.file_name, "document deleted");
        self.notify(StoreEvent::DocumentDeleted { id: doc.id });
        Ok(true)
    }

    /// Drop all documents, activity and blobs, then restore empty storage
    /// with default settings.
    pub fn clear_all(&self) -> Result<()> {
        {
            let db = self.lock()?;
            let tx = db.conn().unchecked_transaction()?;
            db.conn().execute("DELETE FROM storage", [])?;
            db.clear_blobs()?;
            db.initialize_storage()?;
            tx.commit()?;
        }
        tracing::info!("local storage cleared");
        self.notify(StoreEvent::Cleared);
        Ok(())
    }

    /// Seed example documents owned by `address` when the store is empty.
    ///
    /// Returns the number of documents created; zero if anything was already
    /// stored or `address` is blank. A seed set that would break the quota is
    /// refused as a whole.
    pub fn initialize_demo_data(&self, address: &str) -> Result<usize> {
        let owner = Address::new(address);
        if owner.is_empty() {
            return Ok(0);
        }

        let created = {
            let db = self.lock()?;
            if !db.list_documents().is_empty() {
                return Ok(0);
            }

            let seeds = demo_documents(&owner);
            let sizes: Vec<u64> = seeds.iter().map(|s| s.file_size).collect();
            db.check_batch_quota(&db.settings(), &sizes)?;

            let mut created = Vec::new();
            // Oldest first, so the collection ends up newest first.
            for new in seeds {
                let doc = db.insert_document(new)?;
                let upload_log = db.list_activity().first().map(|e| e.id.clone());
                created.push((doc.id, upload_log));
            }
            created
        };

        tracing::info!(count = created.len(), owner = %owner.short(), "initialized demo data");
        let count = created.len();
        for (id, upload_log) in created {
            self.notify(StoreEvent::DocumentCreated { id });
            if let Some(id) = upload_log {
                self.notify(StoreEvent::ActivityAppended { id });
            }
        }
        Ok(count)
    }

    /// Whether the backing storage accepts a write, read back and removal.
    pub fn is_available(&self) -> bool {
        let Ok(db) = self.lock() else {
            return false;
        };
        let roundtrip = || -> Result<bool> {
            db.set_item(AVAILABILITY_KEY, AVAILABILITY_KEY)?;
            let read = db.get_item(AVAILABILITY_KEY)?;
            db.remove_item(AVAILABILITY_KEY)?;
            Ok(read.as_deref() == Some(AVAILABILITY_KEY))
        };
        match roundtrip() {
            Ok(ok) => ok,
            Err(e) => {
                tracing::warn!(error = %e, "storage availability check failed");
                false
            }
        }
    }

    // -----------------------------------------------------------------------
    // Blobs
    // -----------------------------------------------------------------------

    pub fn store_blob(&self, content_hash: &str, file_name: &str, data: &[u8]) -> Result<()> {
        self.lock()?.put_blob(content_hash, file_name, data)
    }

    pub fn load_blob(&self, content_hash: &str) -> Result<Vec<u8>> {
        self.lock()?.get_blob(content_hash)
    }

    pub fn remove_blob(&self, content_hash: &str) -> Result<bool> {
        self.lock()?.delete_blob(content_hash)
    }

    pub fn has_blob(&self, content_hash: &str) -> Result<bool> {
        self.lock()?.has_blob(content_hash)
    }

    // -----------------------------------------------------------------------
    // Activity log
    // -----------------------------------------------------------------------

    pub fn activity(&self) -> ActivityLog<'_> {
        ActivityLog { store: self }
    }

    pub(crate) fn with_db<T>(&self, f: impl FnOnce(&Database) -> Result<T>) -> Result<T> {
        let db = self.lock()?;
        f(&db)
    }
}

fn demo_documents(owner: &Address) -> Vec<NewDocument> {
    let now = Utc::now();
    vec![
        NewDocument::new(
            "Technical_Documentation.docx",
            "QmDef789ghi012jkl345mno678pqr901stu234vwx567yz8901abc234def567",
            3_355_443,
            owner.clone(),
        )
        .with_upload_date(now - Duration::days(5)),
        NewDocument::new(
            "Smart_Contract_Audit_Report.pdf",
            "QmAbc456def789xyz123uvw456qrs789tuv012wxy345zab678cde901fgh234",
            1_887_436,
            owner.clone(),
        )
        .with_upload_date(now - Duration::days(3)),
        NewDocument::new(
            "SecureX_Whitepaper_v2.pdf",
            "QmXyZ123abc456def789ghi012jkl345mno678pqr901stu234vwx567yz8",
            2_445_760,
            owner.clone(),
        )
        .with_upload_date(now - Duration::days(2)),
    ]
}

/// Read/append surface of the activity log.
pub struct ActivityLog<'a> {
    store: &'a DocumentStore,
}

impl ActivityLog<'_> {
    /// Append an entry, evicting the oldest past the cap.
    pub fn append(&self, activity: NewActivity) -> Result<ActivityEntry> {
        let entry = self.store.lock()?.append_activity(activity)?;
        self.store.notify(StoreEvent::ActivityAppended {
            id: entry.id.clone(),
        });
        Ok(entry)
    }

    /// Every entry, newest first.
    pub fn list_all(&self) -> Vec<ActivityEntry> {
        self.store.read(|db| db.list_activity())
    }

    pub fn list_for_user(&self, user: &str) -> Vec<ActivityEntry> {
        self.list_all()
            .into_iter()
            .filter(|e| e.user.matches(user))
            .collect()
    }

    pub fn list_by_kind(&self, kind: ActivityKind) -> Vec<ActivityEntry> {
        self.list_all()
            .into_iter()
            .filter(|e| e.kind == kind)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.list_all().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
