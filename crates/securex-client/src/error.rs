use serde::{Serialize, Serializer};
use thiserror::Error;

use securex_store::StoreError;

use crate::contract::ContractError;
use crate::gateway::GatewayError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Wallet not connected")]
    NotConnected,

    #[error("Contract not configured")]
    ContractNotConfigured,

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl ClientError {
    pub fn is_quota(&self) -> bool {
        matches!(self, ClientError::Store(e) if e.is_quota())
    }
}

// Views receive errors as their display message.
impl Serialize for ClientError {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
