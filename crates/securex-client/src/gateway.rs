//! Content-addressed storage for file bytes.
//!
//! [`LocalGateway`] keeps bytes in the local store under a demo hash.
//! [`IpfsGateway`] fetches through public HTTP gateways and pins uploads
//! with Pinata when credentials are configured.

use std::sync::Arc;

use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use securex_shared::constants::{APP_NAME, PINATA_PIN_FILE_URL};
use securex_store::{DocumentStore, StoreError};

use crate::config::PinataCredentials;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("Content {0} is not available from any gateway")]
    Unavailable(String),

    #[error("Upload credentials not configured")]
    UploadNotConfigured,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[async_trait]
pub trait ContentGateway: Send + Sync {
    /// Store `bytes` and return their content hash.
    async fn upload(&self, file_name: &str, bytes: &[u8]) -> Result<String, GatewayError>;

    async fn fetch(&self, content_hash: &str) -> Result<Vec<u8>, GatewayError>;

    /// Public URL for `content_hash`, if the gateway serves one.
    fn url_for(&self, content_hash: &str) -> Option<String>;
}

// ---------------------------------------------------------------------------
// Local
// ---------------------------------------------------------------------------

pub struct LocalGateway {
    store: Arc<DocumentStore>,
}

impl LocalGateway {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }

    pub fn contains(&self, content_hash: &str) -> bool {
        self.store.has_blob(content_hash).unwrap_or_else(|e| {
            warn!(error = %e, content_hash, "blob lookup failed");
            false
        })
    }
}

/// `QmDemo` + 20 hex chars of the BLAKE3 digest + a random suffix, so equal
/// files uploaded twice still get distinct hashes.
pub fn demo_content_hash(bytes: &[u8]) -> String {
    let digest = blake3::hash(bytes).to_hex();
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(15)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("QmDemo{}{}", &digest.as_str()[..20], suffix)
}

#[async_trait]
impl ContentGateway for LocalGateway {
    async fn upload(&self, file_name: &str, bytes: &[u8]) -> Result<String, GatewayError> {
        let hash = demo_content_hash(bytes);
        self.store.store_blob(&hash, file_name, bytes)?;
        debug!(hash = %hash, size = bytes.len(), "stored blob locally");
        Ok(hash)
    }

    async fn fetch(&self, content_hash: &str) -> Result<Vec<u8>, GatewayError> {
        match self.store.load_blob(content_hash) {
            Ok(bytes) => Ok(bytes),
            Err(StoreError::NotFound) => Err(GatewayError::Unavailable(content_hash.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    fn url_for(&self, _content_hash: &str) -> Option<String> {
        None
    }
}

// ---------------------------------------------------------------------------
// IPFS over HTTP
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

pub struct IpfsGateway {
    http: reqwest::Client,
    gateways: Vec<String>,
    pinata: Option<PinataCredentials>,
}

impl IpfsGateway {
    pub fn new(gateways: Vec<String>, pinata: Option<PinataCredentials>) -> Self {
        Self {
            http: reqwest::Client::new(),
            gateways,
            pinata,
        }
    }

    pub fn can_upload(&self) -> bool {
        self.pinata.is_some()
    }

    async fn fetch_from(&self, url: &str) -> Result<Vec<u8>, GatewayError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// `{gateway}/{hash}` for every configured gateway, in order.
    pub fn urls_for(&self, content_hash: &str) -> Vec<String> {
        self.gateways
            .iter()
            .map(|g| format!("{}/{}", g.trim_end_matches('/'), content_hash))
            .collect()
    }
}

#[async_trait]
impl ContentGateway for IpfsGateway {
    async fn upload(&self, file_name: &str, bytes: &[u8]) -> Result<String, GatewayError> {
        let creds = self.pinata.as_ref().ok_or(GatewayError::UploadNotConfigured)?;

        let metadata = serde_json::json!({
            "name": file_name,
            "keyvalues": {
                "uploadedBy": APP_NAME,
                "timestamp": chrono::Utc::now().timestamp_millis().to_string(),
            }
        });
        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes.to_vec()).file_name(file_name.to_string()),
            )
            .text("pinataMetadata", metadata.to_string());

        let response = self
            .http
            .post(PINATA_PIN_FILE_URL)
            .header("pinata_api_key", &creds.api_key)
            .header("pinata_secret_api_key", &creds.secret)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status {
                url: PINATA_PIN_FILE_URL.to_string(),
                status: status.as_u16(),
            });
        }

        let pinned: PinResponse = response.json().await?;
        info!(hash = %pinned.ipfs_hash, size = bytes.len(), "pinned file");
        Ok(pinned.ipfs_hash)
    }

    /// Try each gateway in order; the first success wins.
    async fn fetch(&self, content_hash: &str) -> Result<Vec<u8>, GatewayError> {
        for url in self.urls_for(content_hash) {
            match self.fetch_from(&url).await {
                Ok(bytes) => {
                    debug!(url = %url, size = bytes.len(), "fetched content");
                    return Ok(bytes);
                }
                Err(e) => warn!(url = %url, error = %e, "gateway fetch failed"),
            }
        }
        Err(GatewayError::Unavailable(content_hash.to_string()))
    }

    fn url_for(&self, content_hash: &str) -> Option<String> {
        self.urls_for(content_hash).into_iter().next()
    }
}
