//! Wallet session state machine.
//!
//! Phases: `Disconnected -> Connecting -> Connected`, and
//! `Connected -> SwitchingNetwork -> Connected`. Any phase falls back to
//! `Disconnected` on an explicit disconnect or when the wallet reports no
//! accounts. An error message may accompany either stable phase.
//!
//! Bridge failures never escape: every operation returns `()` and records
//! what went wrong in [`SessionState::error`]. State changes are published
//! on a `tokio::sync::watch` channel.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use securex_shared::networks::{self, NetworkParams};
use securex_shared::{Address, ChainId};

use crate::bridge::{BridgeError, WalletBridge};
use crate::events::WalletEvent;

pub const MSG_WALLET_NOT_INSTALLED: &str = "wallet not installed";
pub const MSG_USER_REJECTED: &str =
    "Connection request rejected. Approve the request in your wallet to continue.";
pub const MSG_REQUEST_PENDING: &str =
    "A connection request is already pending. Open your wallet to complete it, then retry.";
pub const MSG_CONNECT_FAILED: &str = "Failed to connect wallet";
pub const MSG_SWITCH_FAILED: &str = "Failed to switch network";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionPhase {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    SwitchingNetwork,
}

/// Snapshot of the session as views see it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub phase: SessionPhase,
    pub is_connected: bool,
    pub address: Option<Address>,
    pub chain_id: Option<ChainId>,
    pub loading: bool,
    pub error: Option<String>,
    pub demo_mode: bool,
}

impl SessionState {
    /// The connected account, if any.
    pub fn connected_address(&self) -> Option<&Address> {
        if self.is_connected {
            self.address.as_ref()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Network to move to after connecting, when the wallet is elsewhere.
    pub preferred_chain: Option<ChainId>,
    /// Parameters offered to the wallet when it does not know a network.
    pub networks: Vec<NetworkParams>,
    /// Initial storage mode.
    pub demo_mode: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            preferred_chain: None,
            networks: networks::known_networks(),
            demo_mode: true,
        }
    }
}

impl SessionConfig {
    pub fn network(&self, chain_id: ChainId) -> Option<&NetworkParams> {
        self.networks.iter().find(|n| n.chain_id == chain_id)
    }
}

/// Marks a connect or switch as in flight. Dropping it clears `loading` and
/// settles the phase, on every exit path.
struct InFlight<'a> {
    state: &'a watch::Sender<SessionState>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|s| {
            s.loading = false;
            s.phase = if s.is_connected {
                SessionPhase::Connected
            } else {
                SessionPhase::Disconnected
            };
        });
    }
}

pub struct Session {
    bridge: Option<Arc<dyn WalletBridge>>,
    config: SessionConfig,
    state: watch::Sender<SessionState>,
}

impl Session {
    /// `bridge` is `None` when no wallet extension is installed.
    pub fn new(bridge: Option<Arc<dyn WalletBridge>>, config: SessionConfig) -> Self {
        let initial = SessionState {
            demo_mode: config.demo_mode,
            ..Default::default()
        };
        let (state, _) = watch::channel(initial);
        Self {
            bridge,
            config,
            state,
        }
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.state.borrow().is_connected
    }

    pub fn has_bridge(&self) -> bool {
        self.bridge.is_some()
    }

    // Claims the in-flight slot unless another connect or switch holds it.
    fn begin(&self, phase: SessionPhase) -> Option<InFlight<'_>> {
        let started = self.state.send_if_modified(|s| {
            if s.loading {
                return false;
            }
            s.loading = true;
            s.phase = phase;
            true
        });
        started.then(|| InFlight { state: &self.state })
    }

    fn set_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.state.send_modify(|s| s.error = Some(message));
    }

    /// Ask the wallet for account access and capture address and network.
    ///
    /// A no-op while another connect or switch is in flight.
    pub async fn connect(&self) {
        let Some(bridge) = self.bridge.clone() else {
            warn!("connect requested without a wallet bridge");
            self.set_error(MSG_WALLET_NOT_INSTALLED);
            return;
        };

        let connected_on = {
            let Some(_in_flight) = self.begin(SessionPhase::Connecting) else {
                debug!("connect already in progress");
                return;
            };

            match request_session(bridge.as_ref()).await {
                Ok((address, chain_id)) => {
                    info!(address = %address.short(), chain_id = %chain_id, "wallet connected");
                    self.state.send_modify(|s| {
                        s.is_connected = true;
                        s.address = Some(address);
                        s.chain_id = Some(chain_id);
                        s.error = None;
                    });
                    Some(chain_id)
                }
                Err(e) => {
                    warn!(code = ?e.code, error = %e, "wallet connection failed");
                    let message = connect_error_message(&e);
                    self.state.send_modify(|s| {
                        s.is_connected = false;
                        s.address = None;
                        s.chain_id = None;
                        s.error = Some(message);
                    });
                    None
                }
            }
        };

        if let (Some(current), Some(preferred)) = (connected_on, self.config.preferred_chain) {
            if current != preferred {
                self.move_to_preferred(bridge.as_ref(), preferred).await;
            }
        }
    }

    // Best effort: a refusal leaves the session connected where it is.
    async fn move_to_preferred(&self, bridge: &dyn WalletBridge, target: ChainId) {
        let Some(_in_flight) = self.begin(SessionPhase::SwitchingNetwork) else {
            return;
        };
        match self.switch_on_bridge(bridge, target).await {
            Ok(chain_id) => {
                info!(chain_id = %chain_id, "moved to preferred network");
                self.state.send_modify(|s| s.chain_id = Some(chain_id));
            }
            Err(e) => {
                warn!(target = %target, error = %e, "could not move to preferred network");
            }
        }
    }

    /// Clear the connection locally. The wallet is not contacted.
    pub fn disconnect(&self) {
        self.state.send_modify(|s| {
            s.phase = SessionPhase::Disconnected;
            s.is_connected = false;
            s.address = None;
            s.chain_id = None;
            s.error = None;
        });
        info!("wallet disconnected");
    }

    /// Ask the wallet to change network, registering it first when the
    /// wallet does not know it.
    pub async fn switch_network(&self, target: ChainId) {
        let Some(bridge) = self.bridge.clone() else {
            self.set_error(MSG_WALLET_NOT_INSTALLED);
            return;
        };
        let Some(_in_flight) = self.begin(SessionPhase::SwitchingNetwork) else {
            debug!("network switch skipped, another request is in flight");
            return;
        };

        match self.switch_on_bridge(bridge.as_ref(), target).await {
            Ok(chain_id) => {
                info!(chain_id = %chain_id, "network switched");
                self.state.send_modify(|s| {
                    s.chain_id = Some(chain_id);
                    s.error = None;
                });
            }
            Err(e) => {
                warn!(target = %target, code = ?e.code, error = %e, "network switch failed");
                self.set_error(MSG_SWITCH_FAILED);
            }
        }
    }

    async fn switch_on_bridge(
        &self,
        bridge: &dyn WalletBridge,
        target: ChainId,
    ) -> Result<ChainId, BridgeError> {
        match bridge.switch_chain(target).await {
            Ok(()) => {}
            Err(e) if e.is_unrecognized_chain() => {
                let params = self.config.network(target).ok_or_else(|| {
                    BridgeError::other(format!("no network parameters for chain {target}"))
                })?;
                info!(chain = %params.chain_name, "registering network with wallet");
                bridge.add_chain(params).await?;
                bridge.switch_chain(target).await?;
            }
            Err(e) => return Err(e),
        }

        match bridge.chain_id().await {
            Ok(chain_id) => Ok(chain_id),
            Err(e) => {
                debug!(error = %e, "could not re-read chain id after switch");
                Ok(target)
            }
        }
    }

    /// Re-derive address and network from accounts the wallet has already
    /// authorized. Silent: failures are logged, never stored as errors.
    pub async fn refresh(&self) {
        let Some(bridge) = &self.bridge else {
            return;
        };

        match read_session(bridge.as_ref()).await {
            Ok(Some((address, chain_id))) => {
                debug!(address = %address.short(), chain_id = %chain_id, "session refreshed");
                self.state.send_modify(|s| {
                    s.is_connected = true;
                    s.address = Some(address);
                    s.chain_id = Some(chain_id);
                    if !s.loading {
                        s.phase = SessionPhase::Connected;
                    }
                });
            }
            Ok(None) => debug!("no authorized wallet accounts"),
            Err(e) => warn!(error = %e, "session refresh failed"),
        }
    }

    /// Apply a notification pushed by the wallet.
    pub async fn handle_event(&self, event: WalletEvent) {
        match event {
            WalletEvent::AccountsChanged(accounts) if accounts.is_empty() => {
                info!("wallet reported no accounts");
                self.disconnect();
            }
            WalletEvent::AccountsChanged(_) => self.refresh().await,
            WalletEvent::ChainChanged(chain_id) => {
                debug!(chain_id = %chain_id, "wallet changed network");
                self.state.send_if_modified(|s| {
                    if s.chain_id == Some(chain_id) {
                        return false;
                    }
                    s.chain_id = Some(chain_id);
                    true
                });
                self.refresh().await;
            }
        }
    }

    /// Drop the current error so the user can retry after resolving a
    /// request left open in the wallet.
    pub fn clear_pending_request(&self) {
        self.state.send_if_modified(|s| s.error.take().is_some());
    }

    pub fn set_demo_mode(&self, demo_mode: bool) {
        self.state.send_if_modified(|s| {
            if s.demo_mode == demo_mode {
                return false;
            }
            s.demo_mode = demo_mode;
            true
        });
        info!(demo_mode, "storage mode changed");
    }

    pub fn toggle_demo_mode(&self) -> bool {
        let demo_mode = !self.state.borrow().demo_mode;
        self.set_demo_mode(demo_mode);
        demo_mode
    }
}

async fn request_session(bridge: &dyn WalletBridge) -> Result<(Address, ChainId), BridgeError> {
    let accounts = bridge.request_accounts().await?;
    let address = first_account(accounts)
        .ok_or_else(|| BridgeError::other("Wallet returned no accounts"))?;
    let chain_id = bridge.chain_id().await?;
    Ok((address, chain_id))
}

async fn read_session(
    bridge: &dyn WalletBridge,
) -> Result<Option<(Address, ChainId)>, BridgeError> {
    let Some(address) = first_account(bridge.list_accounts().await?) else {
        return Ok(None);
    };
    let chain_id = bridge.chain_id().await?;
    Ok(Some((address, chain_id)))
}

fn first_account(accounts: Vec<Address>) -> Option<Address> {
    accounts.into_iter().find(|a| !a.is_empty())
}

fn connect_error_message(e: &BridgeError) -> String {
    if e.is_user_rejected() {
        MSG_USER_REJECTED.to_string()
    } else if e.is_request_pending() {
        MSG_REQUEST_PENDING.to_string()
    } else if e.message.trim().is_empty() {
        MSG_CONNECT_FAILED.to_string()
    } else {
        e.message.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBridge;
    use securex_shared::constants::{CHAIN_POLYGON_MUMBAI, CHAIN_SEPOLIA};

    const ALICE: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";
    const BOB: &str = "0x8ba1f109551bD432803012645Ac136ddd64DBA72";

    fn session_with(bridge: Arc<MockBridge>, config: SessionConfig) -> Session {
        Session::new(Some(bridge as Arc<dyn WalletBridge>), config)
    }

    fn session(bridge: Arc<MockBridge>) -> Session {
        session_with(bridge, SessionConfig::default())
    }

    fn assert_settled(state: &SessionState) {
        assert!(!state.loading);
        assert_eq!(state.is_connected, state.address.is_some());
        assert_ne!(state.phase, SessionPhase::Connecting);
        assert_ne!(state.phase, SessionPhase::SwitchingNetwork);
    }

    #[tokio::test]
    async fn connect_captures_address_and_chain() {
        let bridge = Arc::new(MockBridge::new(&[ALICE], CHAIN_SEPOLIA));
        let session = session(bridge);

        session.connect().await;

        let s = session.snapshot();
        assert!(s.is_connected);
        assert_eq!(s.phase, SessionPhase::Connected);
        assert!(s.address.as_ref().unwrap().matches(ALICE));
        assert_eq!(s.chain_id, Some(ChainId(CHAIN_SEPOLIA)));
        assert_eq!(s.error, None);
        assert_settled(&s);
    }

    #[tokio::test]
    async fn missing_bridge_reports_not_installed() {
        let session = Session::new(None, SessionConfig::default());
        session.connect().await;

        let s = session.snapshot();
        assert_eq!(s.error.as_deref(), Some(MSG_WALLET_NOT_INSTALLED));
        assert!(!s.is_connected);
        assert_settled(&s);
    }

    #[tokio::test]
    async fn failed_connect_never_leaves_loading() {
        let cases = [
            (BridgeError::user_rejected(), MSG_USER_REJECTED.to_string()),
            (BridgeError::request_pending(), MSG_REQUEST_PENDING.to_string()),
            (BridgeError::new(-32603, "Internal error"), "Internal error".to_string()),
            (BridgeError::other(""), MSG_CONNECT_FAILED.to_string()),
        ];

        for (error, expected) in cases {
            let bridge = Arc::new(MockBridge::new(&[ALICE], CHAIN_SEPOLIA));
            bridge.fail_request(error);
            let session = session(bridge);

            session.connect().await;

            let s = session.snapshot();
            assert!(!s.loading);
            assert!(!s.is_connected);
            assert_eq!(s.error, Some(expected));
            assert_eq!(s.phase, SessionPhase::Disconnected);
        }
    }

    #[tokio::test]
    async fn failing_chain_read_fails_connect() {
        let bridge = Arc::new(MockBridge::new(&[ALICE], CHAIN_SEPOLIA));
        bridge.fail_chain_id(Some(BridgeError::other("rpc down")));
        let session = session(bridge);

        session.connect().await;

        let s = session.snapshot();
        assert!(!s.is_connected);
        assert_eq!(s.address, None);
        assert_eq!(s.error.as_deref(), Some("rpc down"));
        assert_settled(&s);
    }

    #[tokio::test]
    async fn no_accounts_is_a_failure() {
        let bridge = Arc::new(MockBridge::new(&[], CHAIN_SEPOLIA));
        let session = session(bridge);
        session.connect().await;

        let s = session.snapshot();
        assert!(!s.is_connected);
        assert!(s.error.is_some());
        assert_settled(&s);
    }

    #[tokio::test]
    async fn success_clears_previous_error() {
        let bridge = Arc::new(MockBridge::new(&[ALICE], CHAIN_SEPOLIA));
        bridge.fail_request(BridgeError::user_rejected());
        let session = session(bridge);

        session.connect().await;
        assert!(session.snapshot().error.is_some());

        session.connect().await;
        let s = session.snapshot();
        assert!(s.is_connected);
        assert_eq!(s.error, None);
    }

    #[tokio::test]
    async fn disconnect_clears_everything_but_mode() {
        let bridge = Arc::new(MockBridge::new(&[ALICE], CHAIN_SEPOLIA));
        let session = session(bridge.clone());
        session.connect().await;
        let calls = bridge.calls().len();

        session.disconnect();

        let s = session.snapshot();
        assert_eq!(
            s,
            SessionState {
                demo_mode: true,
                ..Default::default()
            }
        );
        assert_eq!(bridge.calls().len(), calls);
    }

    #[tokio::test]
    async fn switch_to_known_chain() {
        let bridge = Arc::new(MockBridge::new(&[ALICE], CHAIN_SEPOLIA).knows_chain(CHAIN_POLYGON_MUMBAI));
        let session = session(bridge.clone());
        session.connect().await;

        session.switch_network(ChainId(CHAIN_POLYGON_MUMBAI)).await;

        let s = session.snapshot();
        assert_eq!(s.chain_id, Some(ChainId(CHAIN_POLYGON_MUMBAI)));
        assert_eq!(s.phase, SessionPhase::Connected);
        assert!(!bridge.calls().iter().any(|c| c.starts_with("add_chain")));
        assert_settled(&s);
    }

    #[tokio::test]
    async fn unknown_chain_is_added_then_retried() {
        let bridge = Arc::new(MockBridge::new(&[ALICE], CHAIN_SEPOLIA));
        let session = session(bridge.clone());
        session.connect().await;

        session.switch_network(ChainId(CHAIN_POLYGON_MUMBAI)).await;

        assert_eq!(session.snapshot().chain_id, Some(ChainId(CHAIN_POLYGON_MUMBAI)));
        let calls = bridge.calls();
        let tail: Vec<&str> = calls.iter().rev().take(4).rev().map(String::as_str).collect();
        assert_eq!(
            tail,
            ["switch_chain:80001", "add_chain:80001", "switch_chain:80001", "chain_id"]
        );
    }

    #[tokio::test]
    async fn unknown_chain_without_params_fails() {
        let bridge = Arc::new(MockBridge::new(&[ALICE], CHAIN_SEPOLIA));
        let session = session(bridge);
        session.connect().await;

        session.switch_network(ChainId(424242)).await;

        let s = session.snapshot();
        assert_eq!(s.error.as_deref(), Some(MSG_SWITCH_FAILED));
        assert_eq!(s.chain_id, Some(ChainId(CHAIN_SEPOLIA)));
        assert!(s.is_connected);
        assert_settled(&s);
    }

    #[tokio::test]
    async fn other_switch_failure_is_generic() {
        let bridge = Arc::new(MockBridge::new(&[ALICE], CHAIN_SEPOLIA));
        bridge.fail_switch(BridgeError::user_rejected());
        let session = session(bridge);
        session.connect().await;

        session.switch_network(ChainId(CHAIN_POLYGON_MUMBAI)).await;

        let s = session.snapshot();
        assert_eq!(s.error.as_deref(), Some(MSG_SWITCH_FAILED));
        assert_settled(&s);
    }

    #[tokio::test]
    async fn switching_to_active_chain_is_harmless() {
        let bridge = Arc::new(MockBridge::new(&[ALICE], CHAIN_SEPOLIA));
        let session = session(bridge);
        session.connect().await;
        let before = session.snapshot();

        session.switch_network(ChainId(CHAIN_SEPOLIA)).await;

        assert_eq!(session.snapshot(), before);
    }

    #[tokio::test]
    async fn preferred_chain_applied_after_connect() {
        let bridge = Arc::new(MockBridge::new(&[ALICE], CHAIN_SEPOLIA));
        let session = session_with(
            bridge,
            SessionConfig {
                preferred_chain: Some(ChainId(CHAIN_POLYGON_MUMBAI)),
                ..Default::default()
            },
        );

        session.connect().await;

        let s = session.snapshot();
        assert_eq!(s.chain_id, Some(ChainId(CHAIN_POLYGON_MUMBAI)));
        assert_settled(&s);
    }

    #[tokio::test]
    async fn refused_preferred_switch_keeps_connection() {
        let bridge = Arc::new(MockBridge::new(&[ALICE], CHAIN_SEPOLIA));
        bridge.fail_add(BridgeError::user_rejected());
        let session = session_with(
            bridge,
            SessionConfig {
                preferred_chain: Some(ChainId(CHAIN_POLYGON_MUMBAI)),
                ..Default::default()
            },
        );

        session.connect().await;

        let s = session.snapshot();
        assert!(s.is_connected);
        assert_eq!(s.chain_id, Some(ChainId(CHAIN_SEPOLIA)));
        assert_eq!(s.error, None);
        assert_settled(&s);
    }

    #[tokio::test]
    async fn refresh_reconnects_silently() {
        let bridge = Arc::new(MockBridge::new(&[ALICE], CHAIN_SEPOLIA).authorized());
        let session = session(bridge.clone());

        session.refresh().await;

        let s = session.snapshot();
        assert!(s.is_connected);
        assert!(!bridge.calls().contains(&"request_accounts".to_string()));
    }

    #[tokio::test]
    async fn refresh_without_authorization_stays_disconnected() {
        let bridge = Arc::new(MockBridge::new(&[ALICE], CHAIN_SEPOLIA));
        let session = session(bridge);

        session.refresh().await;

        assert_eq!(session.snapshot().phase, SessionPhase::Disconnected);
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn refresh_failure_is_not_an_error() {
        let bridge = Arc::new(MockBridge::new(&[ALICE], CHAIN_SEPOLIA).authorized());
        bridge.fail_chain_id(Some(BridgeError::other("rpc down")));
        let session = session(bridge);

        session.refresh().await;

        let s = session.snapshot();
        assert_eq!(s.error, None);
        assert!(!s.is_connected);
    }

    #[tokio::test]
    async fn empty_accounts_event_disconnects() {
        let bridge = Arc::new(MockBridge::new(&[ALICE], CHAIN_SEPOLIA));
        let session = session(bridge);
        session.connect().await;

        session.handle_event(WalletEvent::AccountsChanged(vec![])).await;
        assert!(!session.is_connected());

        // idempotent
        session.handle_event(WalletEvent::AccountsChanged(vec![])).await;
        assert_eq!(session.snapshot().phase, SessionPhase::Disconnected);
    }

    #[tokio::test]
    async fn account_switch_is_picked_up() {
        let bridge = Arc::new(MockBridge::new(&[ALICE], CHAIN_SEPOLIA));
        let session = session(bridge.clone());
        session.connect().await;

        bridge.set_accounts(&[BOB]);
        session
            .handle_event(WalletEvent::AccountsChanged(vec![Address::new(BOB)]))
            .await;

        assert!(session.snapshot().address.unwrap().matches(BOB));
    }

    #[tokio::test]
    async fn chain_change_updates_chain() {
        let bridge = Arc::new(MockBridge::new(&[ALICE], CHAIN_SEPOLIA));
        let session = session(bridge.clone());
        session.connect().await;

        bridge.set_chain(CHAIN_POLYGON_MUMBAI);
        session
            .handle_event(WalletEvent::ChainChanged(ChainId(CHAIN_POLYGON_MUMBAI)))
            .await;

        let s = session.snapshot();
        assert_eq!(s.chain_id, Some(ChainId(CHAIN_POLYGON_MUMBAI)));
        assert!(s.is_connected);
    }

    #[tokio::test]
    async fn clear_pending_request_keeps_connection_state() {
        let bridge = Arc::new(MockBridge::new(&[ALICE], CHAIN_SEPOLIA));
        bridge.fail_request(BridgeError::request_pending());
        let session = session(bridge);
        session.connect().await;
        assert_eq!(session.snapshot().error.as_deref(), Some(MSG_REQUEST_PENDING));

        session.clear_pending_request();

        let s = session.snapshot();
        assert_eq!(s.error, None);
        assert!(!s.is_connected);
    }

    #[tokio::test]
    async fn concurrent_connect_is_a_no_op() {
        let bridge = Arc::new(MockBridge::new(&[ALICE], CHAIN_SEPOLIA));
        let session = session(bridge.clone());

        let _held = session.begin(SessionPhase::Connecting).unwrap();
        session.connect().await;
        assert!(bridge.calls().is_empty());
        drop(_held);

        assert!(!session.snapshot().loading);
    }

    #[tokio::test]
    async fn state_changes_are_published() {
        let bridge = Arc::new(MockBridge::new(&[ALICE], CHAIN_SEPOLIA));
        let session = session(bridge);
        let mut rx = session.subscribe();

        session.connect().await;
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_connected);

        session.set_demo_mode(false);
        assert!(rx.has_changed().unwrap());
        assert!(!rx.borrow_and_update().demo_mode);

        assert!(session.toggle_demo_mode());
        assert!(session.snapshot().demo_mode);
    }
}
