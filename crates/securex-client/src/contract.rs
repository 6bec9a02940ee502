//! Interface to the deployed document contract.
//!
//! The contract exposes four methods: `uploadDocument`, `getUserDocuments`,
//! `getDocument` and `getDocumentCount`. Transport (RPC, signing) belongs to
//! the [`ContractClient`] implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use securex_shared::mime::mime_type_for;
use securex_shared::Address;
use securex_store::{ChainMetadata, Document, Provenance};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContractError {
    #[error("Contract call failed: {0}")]
    Call(String),

    #[error("Document {0} not found or inactive")]
    Inactive(u64),

    #[error("Blockchain upload failed: {0}")]
    Upload(String),
}

/// A document as the contract stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractDocument {
    pub id: u64,
    pub file_name: String,
    pub ipfs_hash: String,
    pub uploader: Address,
    /// Unix seconds.
    pub timestamp: u64,
    pub file_size: u64,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    pub transaction_hash: String,
    pub block_number: u64,
    /// From the `DocumentUploaded` event, when the receipt carried one.
    pub document_id: Option<u64>,
    pub gas_used: u64,
}

#[async_trait]
pub trait ContractClient: Send + Sync {
    async fn upload_document(
        &self,
        file_name: &str,
        content_hash: &str,
        file_size: u64,
    ) -> Result<UploadReceipt, ContractError>;

    /// Ids of documents uploaded by `user`.
    async fn get_user_documents(&self, user: &Address) -> Result<Vec<u64>, ContractError>;

    async fn get_document(&self, id: u64) -> Result<ContractDocument, ContractError>;

    async fn get_document_count(&self) -> Result<u64, ContractError>;
}

/// Active documents of `user`, newest first.
///
/// A document that fails to load is logged and skipped; only failing to list
/// the ids fails the whole call.
pub async fn fetch_user_documents(
    client: &dyn ContractClient,
    user: &Address,
) -> Result<Vec<Document>, ContractError> {
    let ids = client.get_user_documents(user).await?;
    debug!(user = %user.short(), count = ids.len(), "fetched document ids");

    let mut docs = Vec::with_capacity(ids.len());
    for id in ids {
        match client.get_document(id).await {
            Ok(doc) if doc.is_active => docs.push(doc),
            Ok(_) => debug!(id, "skipping inactive document"),
            Err(e) => warn!(id, error = %e, "failed to fetch document"),
        }
    }

    docs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    info!(user = %user.short(), count = docs.len(), "loaded contract documents");
    Ok(docs.into_iter().map(shape_document).collect())
}

/// Fetch one document, treating an inactive one as missing.
pub async fn fetch_document(
    client: &dyn ContractClient,
    id: u64,
) -> Result<Document, ContractError> {
    let doc = client.get_document(id).await?;
    if !doc.is_active {
        return Err(ContractError::Inactive(id));
    }
    Ok(shape_document(doc))
}

/// Present a contract record in the same shape as locally stored documents.
///
/// The contract keeps no counters nor transaction details, so those stay
/// zero and empty.
pub fn shape_document(doc: ContractDocument) -> Document {
    let upload_date = i64::try_from(doc.timestamp)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .unwrap_or_default();

    Document {
        id: doc.id.to_string(),
        mime_type: mime_type_for(&doc.file_name).to_string(),
        file_name: doc.file_name,
        content_hash: doc.ipfs_hash,
        file_size: doc.file_size,
        uploader: doc.uploader,
        upload_date,
        views: 0,
        download_count: 0,
        last_accessed: None,
        last_download: None,
        chain: ChainMetadata {
            transaction_hash: String::new(),
            block_number: 0,
            gas_used: 0,
            document_id: doc.id,
            provenance: Provenance::OnChain,
        },
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use super::*;

    /// Contract state held in memory.
    #[derive(Default)]
    pub struct MockContract {
        docs: Mutex<BTreeMap<u64, ContractDocument>>,
        broken: Mutex<Vec<u64>>,
        uploader: Address,
        clock: Mutex<u64>,
    }

    impl MockContract {
        pub fn new(uploader: &str) -> Self {
            Self {
                uploader: Address::new(uploader),
                clock: Mutex::new(1_700_000_000),
                ..Default::default()
            }
        }

        pub fn insert(&self, doc: ContractDocument) {
            self.docs.lock().unwrap().insert(doc.id, doc);
        }

        pub fn break_document(&self, id: u64) {
            self.broken.lock().unwrap().push(id);
        }
    }

    #[async_trait]
    impl ContractClient for MockContract {
        async fn upload_document(
            &self,
            file_name: &str,
            content_hash: &str,
            file_size: u64,
        ) -> Result<UploadReceipt, ContractError> {
            let mut docs = self.docs.lock().unwrap();
            let id = docs.keys().last().copied().unwrap_or(0) + 1;
            let mut clock = self.clock.lock().unwrap();
            *clock += 60;
            docs.insert(
                id,
                ContractDocument {
                    id,
                    file_name: file_name.to_string(),
                    ipfs_hash: content_hash.to_string(),
                    uploader: self.uploader.clone(),
                    timestamp: *clock,
                    file_size,
                    is_active: true,
                },
            );
            Ok(UploadReceipt {
                transaction_hash: format!("0x{:064x}", id),
                block_number: 100 + id,
                document_id: Some(id),
                gas_used: 120_000,
            })
        }

        async fn get_user_documents(&self, user: &Address) -> Result<Vec<u64>, ContractError> {
            Ok(self
                .docs
                .lock()
                .unwrap()
                .values()
                .filter(|d| d.uploader == *user)
                .map(|d| d.id)
                .collect())
        }

        async fn get_document(&self, id: u64) -> Result<ContractDocument, ContractError> {
            if self.broken.lock().unwrap().contains(&id) {
                return Err(ContractError::Call("execution reverted".into()));
            }
            self.docs
                .lock()
                .unwrap()
                .get(&id)
                .cloned()
                .ok_or_else(|| ContractError::Call(format!("no document {id}")))
        }

        async fn get_document_count(&self) -> Result<u64, ContractError> {
            Ok(self.docs.lock().unwrap().len() as u64)
        }
    }
}
