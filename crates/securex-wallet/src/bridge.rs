//! Interface to the external wallet extension.

use async_trait::async_trait;
use thiserror::Error;

use securex_shared::constants::{
    BRIDGE_ERR_REQUEST_PENDING, BRIDGE_ERR_UNRECOGNIZED_CHAIN, BRIDGE_ERR_USER_REJECTED,
};
use securex_shared::networks::NetworkParams;
use securex_shared::{Address, ChainId};

/// A failed bridge request: the provider's numeric code, when it sent one,
/// and its message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct BridgeError {
    pub code: Option<i64>,
    pub message: String,
}

impl BridgeError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn user_rejected() -> Self {
        Self::new(BRIDGE_ERR_USER_REJECTED, "User rejected the request.")
    }

    pub fn request_pending() -> Self {
        Self::new(BRIDGE_ERR_REQUEST_PENDING, "Request already pending.")
    }

    pub fn unrecognized_chain(chain_id: ChainId) -> Self {
        Self::new(
            BRIDGE_ERR_UNRECOGNIZED_CHAIN,
            format!("Unrecognized chain ID {}", chain_id.to_hex()),
        )
    }

    pub fn is_user_rejected(&self) -> bool {
        self.code == Some(BRIDGE_ERR_USER_REJECTED)
    }

    pub fn is_request_pending(&self) -> bool {
        self.code == Some(BRIDGE_ERR_REQUEST_PENDING)
    }

    pub fn is_unrecognized_chain(&self) -> bool {
        self.code == Some(BRIDGE_ERR_UNRECOGNIZED_CHAIN)
    }
}

/// The calls the session makes into the wallet extension.
///
/// Push notifications travel separately, as [`WalletEvent`](crate::WalletEvent)s.
#[async_trait]
pub trait WalletBridge: Send + Sync {
    /// Prompt the user for account access. Returns the authorized accounts,
    /// the active one first.
    async fn request_accounts(&self) -> Result<Vec<Address>, BridgeError>;

    /// Accounts already authorized, without prompting.
    async fn list_accounts(&self) -> Result<Vec<Address>, BridgeError>;

    async fn chain_id(&self) -> Result<ChainId, BridgeError>;

    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), BridgeError>;

    async fn add_chain(&self, params: &NetworkParams) -> Result<(), BridgeError>;
}
