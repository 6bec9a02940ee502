//! Document commands: upload, list, search, view and download.

use serde::Serialize;
use tracing::{info, warn};

use securex_store::{Document, NewDocument};

use crate::contract::{self, ContractDocument};
use crate::error::{ClientError, Result};
use crate::state::{AppState, Backend};

/// A document opened for viewing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentView {
    pub document: Document,
    /// Gateway URL, when the content is served publicly.
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadedFile {
    pub document: Document,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// Store `bytes` and record the document for the connected account.
///
/// In demo mode the quota is checked before any bytes are written, and the
/// blob is removed again if the document cannot be created.
pub async fn upload_document(state: &AppState, file_name: &str, bytes: &[u8]) -> Result<Document> {
    let route = state.route()?;
    let file_size = bytes.len() as u64;

    match route.backend {
        Backend::Local => {
            state.store.check_quota(file_size)?;
            let hash = state.upload_gateway().upload(file_name, bytes).await?;

            match state
                .store
                .create(NewDocument::new(file_name, hash.as_str(), file_size, route.owner))
            {
                Ok(doc) => Ok(doc),
                Err(e) => {
                    if let Err(cleanup) = state.store.remove_blob(&hash) {
                        warn!(hash = %hash, error = %cleanup, "failed to remove orphaned blob");
                    }
                    Err(e.into())
                }
            }
        }
        Backend::Contract(client) => {
            let hash = state.upload_gateway().upload(file_name, bytes).await?;
            let receipt = client.upload_document(file_name, &hash, file_size).await?;
            info!(
                tx = %receipt.transaction_hash,
                document_id = ?receipt.document_id,
                "document recorded on chain"
            );

            let mut doc = contract::shape_document(ContractDocument {
                id: receipt.document_id.unwrap_or_default(),
                file_name: file_name.to_string(),
                ipfs_hash: hash,
                uploader: route.owner,
                timestamp: chrono::Utc::now().timestamp().max(0) as u64,
                file_size,
                is_active: true,
            });
            if receipt.document_id.is_none() {
                doc.id = receipt.transaction_hash.clone();
            }
            doc.chain.transaction_hash = receipt.transaction_hash;
            doc.chain.block_number = receipt.block_number;
            doc.chain.gas_used = receipt.gas_used;
            Ok(doc)
        }
    }
}

/// Documents of the connected account, newest first.
pub async fn list_documents(state: &AppState) -> Result<Vec<Document>> {
    let route = state.route()?;
    match route.backend {
        Backend::Local => Ok(state.store.list_for_owner(route.owner.as_str())),
        Backend::Contract(client) => Ok(contract::fetch_user_documents(client, &route.owner).await?),
    }
}

pub async fn search_documents(state: &AppState, query: &str) -> Result<Vec<Document>> {
    Ok(list_documents(state)
        .await?
        .into_iter()
        .filter(|d| d.matches_query(query))
        .collect())
}

pub async fn get_document(state: &AppState, id: &str) -> Result<Document> {
    let route = state.route()?;
    match route.backend {
        Backend::Local => state
            .store
            .get(id)
            .ok_or_else(|| ClientError::DocumentNotFound(id.to_string())),
        Backend::Contract(client) => {
            let numeric = id
                .parse::<u64>()
                .map_err(|_| ClientError::DocumentNotFound(id.to_string()))?;
            Ok(contract::fetch_document(client, numeric).await?)
        }
    }
}

/// Open a document. Locally this counts a view and logs it.
pub async fn view_document(state: &AppState, id: &str) -> Result<DocumentView> {
    let route = state.route()?;
    let document = match route.backend {
        Backend::Local => state
            .store
            .increment_views(id)?
            .ok_or_else(|| ClientError::DocumentNotFound(id.to_string()))?,
        Backend::Contract(_) => get_document(state, id).await?,
    };

    Ok(DocumentView {
        url: state.content_url(&document.content_hash),
        document,
    })
}

/// Fetch a document's bytes. Locally the download is counted only once the
/// bytes are in hand.
pub async fn download_document(state: &AppState, id: &str) -> Result<DownloadedFile> {
    let route = state.route()?;
    let document = get_document(state, id).await?;
    let bytes = state.fetch_content(&document.content_hash).await?;

    let document = match route.backend {
        Backend::Local => state
            .store
            .increment_downloads(id)?
            .ok_or_else(|| ClientError::DocumentNotFound(id.to_string()))?,
        Backend::Contract(_) => document,
    };

    info!(id = %document.id, size = bytes.len(), "document downloaded");
    Ok(DownloadedFile { document, bytes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::*;
    use securex_store::{ActivityKind, Provenance, StorageSettings, StoreError};

    #[tokio::test]
    async fn commands_require_connection() {
        let state = demo_state();
        assert!(matches!(
            upload_document(&state, "a.txt", b"x").await,
            Err(ClientError::NotConnected)
        ));
        assert!(matches!(list_documents(&state).await, Err(ClientError::NotConnected)));
        assert!(matches!(view_document(&state, "x").await, Err(ClientError::NotConnected)));
        assert!(state.store.list_all().is_empty());
    }

    #[tokio::test]
    async fn demo_upload_view_download() {
        let state = connected(demo_state()).await;

        let doc = upload_document(&state, "notes.txt", b"hello world").await.unwrap();
        assert_eq!(doc.file_size, 11);
        assert_eq!(doc.mime_type, "text/plain");
        assert_eq!(doc.chain.provenance, Provenance::Simulated);
        assert!(doc.is_owned_by(&ALICE.to_lowercase()));

        let viewed = view_document(&state, &doc.id).await.unwrap();
        assert_eq!(viewed.document.views, 1);

        let file = download_document(&state, &doc.id).await.unwrap();
        assert_eq!(file.bytes, b"hello world");
        assert_eq!(file.document.download_count, 1);

        let kinds: Vec<ActivityKind> =
            state.store.activity().list_all().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            [ActivityKind::Download, ActivityKind::View, ActivityKind::Upload]
        );
        assert_eq!(list_documents(&state).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn oversized_upload_writes_nothing() {
        let state = connected(demo_state()).await;
        state
            .store
            .update_settings(&StorageSettings {
                max_file_size: 4,
                ..Default::default()
            })
            .unwrap();

        let err = upload_document(&state, "big.bin", b"12345").await.unwrap_err();
        assert!(err.is_quota());
        assert!(matches!(err, ClientError::Store(StoreError::FileTooLarge { .. })));
        assert!(state.store.list_all().is_empty());
        assert!(state.store.activity().is_empty());
    }

    #[tokio::test]
    async fn failed_download_is_not_counted() {
        let state = connected(demo_state()).await;
        state.store.initialize_demo_data(ALICE).unwrap();
        let doc = list_documents(&state).await.unwrap().remove(0);

        assert!(download_document(&state, &doc.id).await.is_err());
        assert_eq!(state.store.get(&doc.id).unwrap().download_count, 0);
    }

    #[tokio::test]
    async fn unknown_document_is_not_found() {
        let state = connected(demo_state()).await;
        assert!(matches!(
            view_document(&state, "missing").await,
            Err(ClientError::DocumentNotFound(_))
        ));
        assert!(state.store.activity().is_empty());
    }

    #[tokio::test]
    async fn search_is_scoped_to_owner() {
        let state = connected(demo_state()).await;
        upload_document(&state, "Invoice.pdf", b"a").await.unwrap();
        state
            .store
            .create(NewDocument::new("Invoice_other.pdf", "QmOther", 1, "0xsomeoneelse"))
            .unwrap();

        let hits = search_documents(&state, "invoice").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].file_name, "Invoice.pdf");
    }

    #[tokio::test]
    async fn contract_upload_and_list() {
        let (state, _contract) = contract_state();
        let state = connected(state).await;

        let doc = upload_document(&state, "deed.pdf", b"deed").await.unwrap();
        assert_eq!(doc.id, "1");
        assert_eq!(doc.chain.provenance, Provenance::OnChain);
        assert_eq!(doc.chain.document_id, 1);
        assert!(doc.chain.transaction_hash.starts_with("0x"));

        let listed = list_documents(&state).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].content_hash, doc.content_hash);
        // nothing is written to the local document collection
        assert!(state.store.list_all().is_empty());

        let viewed = view_document(&state, "1").await.unwrap();
        assert_eq!(viewed.document.file_name, "deed.pdf");

        let file = download_document(&state, "1").await.unwrap();
        assert_eq!(file.bytes, b"deed");

        assert!(matches!(
            get_document(&state, "not-a-number").await,
            Err(ClientError::DocumentNotFound(_))
        ));
    }
}
