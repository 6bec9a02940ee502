//! Domain records persisted in the local store.
//!
//! Field names serialize in camelCase so the persisted JSON matches what the
//! dashboard views read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use securex_shared::constants::{FREE_MAX_DOCUMENTS, FREE_MAX_FILE_SIZE, STORAGE_VERSION};
use securex_shared::Address;

// ---------------------------------------------------------------------------
// Chain metadata
// ---------------------------------------------------------------------------

/// Where a record's chain metadata came from.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Fabricated locally in demo mode. Not backed by any transaction.
    #[default]
    Simulated,
    /// Returned by the deployed contract.
    OnChain,
}

/// Transaction details attached to a document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChainMetadata {
    pub transaction_hash: String,
    pub block_number: u64,
    pub gas_used: u64,
    pub document_id: u64,
    #[serde(default)]
    pub provenance: Provenance,
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// Metadata for one uploaded file. The bytes live elsewhere, addressed by
/// `content_hash`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Unique across the whole store, assigned at creation.
    pub id: String,
    pub file_name: String,
    pub content_hash: String,
    pub file_size: u64,
    /// Owner address, used for per-user filtering.
    pub uploader: Address,
    pub upload_date: DateTime<Utc>,
    pub mime_type: String,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub download_count: u64,
    #[serde(default)]
    pub last_accessed: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_download: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub chain: ChainMetadata,
}

impl Document {
    pub fn is_owned_by(&self, owner: &str) -> bool {
        self.uploader.matches(owner)
    }

    /// Case-insensitive substring match over name, hash and MIME type.
    /// An empty query matches everything.
    pub fn matches_query(&self, query: &str) -> bool {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return true;
        }
        self.file_name.to_lowercase().contains(&q)
            || self.content_hash.to_lowercase().contains(&q)
            || self.mime_type.to_lowercase().contains(&q)
    }
}

/// Input for [`DocumentStore::create`](crate::DocumentStore::create).
///
/// `file_name`, `content_hash`, `file_size` and `uploader` are required; the
/// remaining fields are filled in with simulated values when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewDocument {
    pub file_name: String,
    pub content_hash: String,
    pub file_size: u64,
    pub uploader: Address,
    pub upload_date: Option<DateTime<Utc>>,
    pub transaction_hash: Option<String>,
    pub document_id: Option<u64>,
}

impl NewDocument {
    pub fn new(
        file_name: impl Into<String>,
        content_hash: impl Into<String>,
        file_size: u64,
        uploader: impl Into<Address>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_hash: content_hash.into(),
            file_size,
            uploader: uploader.into(),
            ..Default::default()
        }
    }

    pub fn with_upload_date(mut self, date: DateTime<Utc>) -> Self {
        self.upload_date = Some(date);
        self
    }

    pub fn with_transaction_hash(mut self, hash: impl Into<String>) -> Self {
        self.transaction_hash = Some(hash.into());
        self
    }

    pub fn with_document_id(mut self, id: u64) -> Self {
        self.document_id = Some(id);
        self
    }
}

/// The mutable subset of a [`Document`]. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentUpdate {
    pub file_name: Option<String>,
    pub views: Option<u64>,
    pub download_count: Option<u64>,
    pub last_accessed: Option<DateTime<Utc>>,
    pub last_download: Option<DateTime<Utc>>,
}

impl DocumentUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub(crate) fn apply_to(self, doc: &mut Document) {
        if let Some(name) = self.file_name {
            doc.file_name = name;
        }
        if let Some(views) = self.views {
            doc.views = views;
        }
        if let Some(count) = self.download_count {
            doc.download_count = count;
        }
        if let Some(ts) = self.last_accessed {
            doc.last_accessed = Some(ts);
        }
        if let Some(ts) = self.last_download {
            doc.last_download = Some(ts);
        }
    }
}

// ---------------------------------------------------------------------------
// Activity log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Upload,
    View,
    Download,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Upload => "upload",
            ActivityKind::View => "view",
            ActivityKind::Download => "download",
        }
    }

    /// Human-readable label shown in the activity feed.
    pub fn action(&self) -> &'static str {
        match self {
            ActivityKind::Upload => "Document Uploaded",
            ActivityKind::View => "Document Accessed",
            ActivityKind::Download => "Document Downloaded",
        }
    }
}

impl std::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    #[default]
    Confirmed,
    Pending,
    Failed,
}

/// One upload / view / download event.
///
/// `file_name` and `content_hash` are copies taken at event time; the entry
/// outlives the document it describes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub action: String,
    pub file_name: String,
    pub content_hash: String,
    pub user: Address,
    pub timestamp: DateTime<Utc>,
    pub block_number: u64,
    pub transaction_hash: String,
    pub gas_used: u64,
    #[serde(default)]
    pub status: ActivityStatus,
    #[serde(default)]
    pub provenance: Provenance,
}

/// Input for [`ActivityLog::append`](crate::ActivityLog::append).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivity {
    pub kind: ActivityKind,
    pub file_name: String,
    pub content_hash: String,
    pub user: Address,
    pub timestamp: Option<DateTime<Utc>>,
    pub block_number: u64,
    pub transaction_hash: String,
    pub gas_used: u64,
    pub status: ActivityStatus,
    pub provenance: Provenance,
}

impl NewActivity {
    /// Activity describing `doc`, with chain details left for the caller.
    pub fn for_document(kind: ActivityKind, doc: &Document) -> Self {
        Self {
            kind,
            file_name: doc.file_name.clone(),
            content_hash: doc.content_hash.clone(),
            user: doc.uploader.clone(),
            timestamp: None,
            block_number: doc.chain.block_number,
            transaction_hash: doc.chain.transaction_hash.clone(),
            gas_used: doc.chain.gas_used,
            status: ActivityStatus::Confirmed,
            provenance: doc.chain.provenance,
        }
    }
}

// ---------------------------------------------------------------------------
// Settings and statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Edition {
    #[default]
    Free,
    Blockchain,
}

/// Quota configuration persisted under the settings key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StorageSettings {
    pub version: String,
    #[serde(default)]
    pub edition: Edition,
    /// Per-file limit in bytes.
    pub max_file_size: u64,
    /// Maximum number of stored documents.
    pub max_documents: usize,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            version: STORAGE_VERSION.to_string(),
            edition: Edition::Free,
            max_file_size: FREE_MAX_FILE_SIZE,
            max_documents: FREE_MAX_DOCUMENTS,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    pub total_documents: usize,
    pub total_activity_logs: usize,
    pub total_size: u64,
    pub oldest_document: Option<DateTime<Utc>>,
    pub newest_document: Option<DateTime<Utc>>,
    pub documents_limit: usize,
    pub documents_remaining: usize,
    pub average_file_size: u64,
}

impl StorageStats {
    /// Aggregate over `documents` in any order.
    pub fn from_documents(
        documents: &[Document],
        total_activity_logs: usize,
        settings: &StorageSettings,
    ) -> Self {
        let total_documents = documents.len();
        let total_size: u64 = documents.iter().map(|d| d.file_size).sum();

        Self {
            total_documents,
            total_activity_logs,
            total_size,
            oldest_document: documents.iter().map(|d| d.upload_date).min(),
            newest_document: documents.iter().map(|d| d.upload_date).max(),
            documents_limit: settings.max_documents,
            documents_remaining: settings.max_documents.saturating_sub(total_documents),
            average_file_size: match total_documents {
                0 => 0,
                n => total_size / n as u64,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        Document {
            id: "doc-1".to_string(),
            file_name: "Quarterly_Report.pdf".to_string(),
            content_hash: "QmAbc123".to_string(),
            file_size: 1000,
            uploader: Address::new("0xABC"),
            upload_date: Utc::now(),
            mime_type: "application/pdf".to_string(),
            views: 0,
            download_count: 0,
            last_accessed: None,
            last_download: None,
            chain: ChainMetadata {
                transaction_hash: "0x00".to_string(),
                block_number: 4_890_001,
                gas_used: 120_000,
                document_id: 7,
                provenance: Provenance::Simulated,
            },
        }
    }

    #[test]
    fn document_json_is_flat_camel_case() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["fileName"], "Quarterly_Report.pdf");
        assert_eq!(json["contentHash"], "QmAbc123");
        assert_eq!(json["blockNumber"], 4_890_001);
        assert_eq!(json["documentId"], 7);
        assert_eq!(json["provenance"], "simulated");
        assert!(json.get("chain").is_none());
    }

    #[test]
    fn query_matches_name_hash_and_mime() {
        let doc = sample();
        assert!(doc.matches_query("quarterly"));
        assert!(doc.matches_query("qmabc"));
        assert!(doc.matches_query("PDF"));
        assert!(doc.matches_query(""));
        assert!(!doc.matches_query("invoice"));
    }

    #[test]
    fn update_only_touches_given_fields() {
        let mut doc = sample();
        DocumentUpdate {
            views: Some(3),
            ..Default::default()
        }
        .apply_to(&mut doc);
        assert_eq!(doc.views, 3);
        assert_eq!(doc.download_count, 0);
        assert_eq!(doc.file_name, "Quarterly_Report.pdf");
    }

    #[test]
    fn activity_kind_serializes_as_type() {
        let doc = sample();
        let entry = ActivityEntry {
            id: "view-1-abc".to_string(),
            kind: ActivityKind::View,
            action: ActivityKind::View.action().to_string(),
            file_name: doc.file_name.clone(),
            content_hash: doc.content_hash.clone(),
            user: doc.uploader.clone(),
            timestamp: Utc::now(),
            block_number: 1,
            transaction_hash: "0x01".to_string(),
            gas_used: 15_000,
            status: ActivityStatus::Confirmed,
            provenance: Provenance::Simulated,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "view");
        assert_eq!(json["status"], "confirmed");
    }
}
