//! Wallet session commands.

use securex_shared::ChainId;
use securex_wallet::SessionState;

use crate::state::AppState;

pub async fn connect_wallet(state: &AppState) -> SessionState {
    state.session.connect().await;
    state.session.snapshot()
}

pub fn disconnect_wallet(state: &AppState) -> SessionState {
    state.session.disconnect();
    state.session.snapshot()
}

pub async fn switch_network(state: &AppState, chain_id: ChainId) -> SessionState {
    state.session.switch_network(chain_id).await;
    state.session.snapshot()
}

pub fn clear_pending_request(state: &AppState) -> SessionState {
    state.session.clear_pending_request();
    state.session.snapshot()
}

pub fn session_state(state: &AppState) -> SessionState {
    state.session.snapshot()
}
