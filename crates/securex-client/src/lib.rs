//! # securex-client
//!
//! Application layer of the SecureX dashboard: configuration, the
//! demo/contract mode selector, the contract and content-gateway seams and
//! the commands the views call.

pub mod commands;
pub mod config;
pub mod contract;
pub mod error;
pub mod gateway;
pub mod state;

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, EnvFilter};

use securex_store::DocumentStore;
use securex_wallet::{Session, SessionConfig, WalletBridge};

pub use config::AppConfig;
pub use error::{ClientError, Result};
pub use state::{AppState, StorageMode};

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the
/// default filter. Calling it again is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("securex_client=debug,securex_wallet=debug,securex_store=info,warn")
    });

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

/// Open the store, build the session and attempt a silent reconnect.
///
/// `bridge` is `None` when no wallet extension is available; `contract` is
/// ignored unless `config` names a deployed contract.
pub async fn bootstrap(
    config: AppConfig,
    bridge: Option<Arc<dyn WalletBridge>>,
    contract: Option<Arc<dyn contract::ContractClient>>,
) -> anyhow::Result<AppState> {
    tracing::info!("Starting SecureX client");

    let store = match &config.db_path {
        Some(path) => DocumentStore::open_at(path)
            .with_context(|| format!("failed to open document store at {}", path.display()))?,
        None => DocumentStore::open_default().context("failed to open document store")?,
    };

    let session = Arc::new(Session::new(
        bridge,
        SessionConfig {
            preferred_chain: config.preferred_chain,
            demo_mode: config.initial_demo_mode(),
            ..Default::default()
        },
    ));
    session.refresh().await;

    let state = AppState::new(config, Arc::new(store), session, contract);
    tracing::info!(
        mode = ?state.mode(),
        connected = state.session.is_connected(),
        "client ready"
    );
    Ok(state)
}
