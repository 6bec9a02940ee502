//! Application state shared by every command.
//!
//! [`AppState`] owns the store, session and external seams. The storage
//! mode lives in the session state, so views observe mode changes on the
//! same watch channel as connection changes.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use securex_shared::Address;
use securex_store::DocumentStore;
use securex_wallet::events::spawn_event_loop;
use securex_wallet::{Session, WalletEvent};

use crate::config::AppConfig;
use crate::contract::ContractClient;
use crate::error::{ClientError, Result};
use crate::gateway::{ContentGateway, IpfsGateway, LocalGateway};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    /// Documents and activity live in the local store.
    Demo,
    /// Documents are read from and written to the contract.
    Contract,
}

/// Where the current request goes.
pub enum Backend<'a> {
    Local,
    Contract(&'a dyn ContractClient),
}

/// A connected account and the backend serving it.
pub struct Route<'a> {
    pub owner: Address,
    pub backend: Backend<'a>,
}

pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<DocumentStore>,
    pub session: Arc<Session>,
    pub local_gateway: LocalGateway,
    pub ipfs_gateway: IpfsGateway,
    contract: Option<Arc<dyn ContractClient>>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<DocumentStore>,
        session: Arc<Session>,
        contract: Option<Arc<dyn ContractClient>>,
    ) -> Self {
        let contract = match contract {
            Some(_) if !config.contract_configured() => {
                warn!("contract client supplied without a deployed contract address, ignoring it");
                None
            }
            other => other,
        };
        if contract.is_none() && !session.snapshot().demo_mode {
            warn!("no contract available, falling back to demo mode");
            session.set_demo_mode(true);
        }

        Self {
            local_gateway: LocalGateway::new(Arc::clone(&store)),
            ipfs_gateway: IpfsGateway::new(config.ipfs_gateways.clone(), config.pinata.clone()),
            config,
            store,
            session,
            contract,
        }
    }

    pub fn mode(&self) -> StorageMode {
        if self.session.snapshot().demo_mode {
            StorageMode::Demo
        } else {
            StorageMode::Contract
        }
    }

    pub fn has_contract(&self) -> bool {
        self.contract.is_some()
    }

    /// Leaving demo mode requires a usable contract.
    pub fn set_demo_mode(&self, demo_mode: bool) -> Result<()> {
        if !demo_mode && self.contract.is_none() {
            return Err(ClientError::ContractNotConfigured);
        }
        self.session.set_demo_mode(demo_mode);
        Ok(())
    }

    pub fn require_connected(&self) -> Result<Address> {
        self.session
            .snapshot()
            .connected_address()
            .cloned()
            .ok_or(ClientError::NotConnected)
    }

    /// Resolve the connected account and the backend for the current mode.
    pub fn route(&self) -> Result<Route<'_>> {
        let owner = self.require_connected()?;
        let backend = match self.mode() {
            StorageMode::Demo => Backend::Local,
            StorageMode::Contract => {
                let contract = self
                    .contract
                    .as_deref()
                    .ok_or(ClientError::ContractNotConfigured)?;
                Backend::Contract(contract)
            }
        };
        Ok(Route { owner, backend })
    }

    /// Gateway receiving uploaded bytes: pinned to IPFS in contract mode
    /// when credentials exist, otherwise kept locally.
    pub fn upload_gateway(&self) -> &dyn ContentGateway {
        match self.mode() {
            StorageMode::Contract if self.ipfs_gateway.can_upload() => {
                &self.ipfs_gateway as &dyn ContentGateway
            }
            _ => &self.local_gateway,
        }
    }

    /// Bytes for `content_hash`, from the local store when present, from
    /// the IPFS gateways otherwise.
    pub async fn fetch_content(&self, content_hash: &str) -> Result<Vec<u8>> {
        if self.local_gateway.contains(content_hash) {
            return Ok(self.local_gateway.fetch(content_hash).await?);
        }
        Ok(self.ipfs_gateway.fetch(content_hash).await?)
    }

    pub fn content_url(&self, content_hash: &str) -> Option<String> {
        self.ipfs_gateway.url_for(content_hash)
    }

    /// Apply wallet notifications from `events` in a background task.
    pub fn listen(&self, events: mpsc::Receiver<WalletEvent>) -> JoinHandle<()> {
        info!("listening for wallet notifications");
        spawn_event_loop(Arc::clone(&self.session), events)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[tokio::test]
    async fn route_requires_connection() {
        let state = demo_state();
        assert!(matches!(state.route(), Err(ClientError::NotConnected)));

        let state = connected(state).await;
        let route = state.route().unwrap();
        assert!(route.owner.matches(ALICE));
        assert!(matches!(route.backend, Backend::Local));
    }

    #[tokio::test]
    async fn demo_mode_cannot_be_left_without_contract() {
        let state = demo_state();
        assert!(matches!(
            state.set_demo_mode(false),
            Err(ClientError::ContractNotConfigured)
        ));
        assert_eq!(state.mode(), StorageMode::Demo);
    }

    #[tokio::test]
    async fn contract_mode_routes_to_contract() {
        let (state, _contract) = contract_state();
        assert_eq!(state.mode(), StorageMode::Contract);
        let state = connected(state).await;
        assert!(matches!(state.route().unwrap().backend, Backend::Contract(_)));

        state.set_demo_mode(true).unwrap();
        assert!(matches!(state.route().unwrap().backend, Backend::Local));
    }

    #[tokio::test]
    async fn contract_without_deployment_is_ignored() {
        let store = Arc::new(DocumentStore::open_in_memory().unwrap());
        let session = Arc::new(Session::new(
            None,
            securex_wallet::SessionConfig {
                demo_mode: false,
                ..Default::default()
            },
        ));
        let contract = Arc::new(crate::contract::mock::MockContract::new(ALICE));
        let state = AppState::new(
            AppConfig::default(),
            store,
            session,
            Some(contract as Arc<dyn ContractClient>),
        );
        assert!(!state.has_contract());
        assert_eq!(state.mode(), StorageMode::Demo);
    }

    #[tokio::test]
    async fn uploads_stay_local_without_pinata() {
        let (state, _contract) = contract_state();
        let gw = state.upload_gateway();
        let hash = gw.upload("a.txt", b"abc").await.unwrap();
        assert!(hash.starts_with("QmDemo"));
        assert_eq!(state.fetch_content(&hash).await.unwrap(), b"abc");
    }
}
