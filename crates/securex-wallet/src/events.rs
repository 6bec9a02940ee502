//! Notifications pushed by the wallet extension.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use securex_shared::{Address, ChainId};

use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    AccountsChanged(Vec<Address>),
    ChainChanged(ChainId),
}

/// Apply notifications to `session` in arrival order until the sender side
/// closes.
pub async fn run_event_loop(session: Arc<Session>, mut events: mpsc::Receiver<WalletEvent>) {
    info!("wallet event loop started");

    while let Some(event) = events.recv().await {
        debug!(?event, "wallet event");
        session.handle_event(event).await;
    }

    info!("wallet event loop terminated");
}

pub fn spawn_event_loop(
    session: Arc<Session>,
    events: mpsc::Receiver<WalletEvent>,
) -> JoinHandle<()> {
    tokio::spawn(run_event_loop(session, events))
}
