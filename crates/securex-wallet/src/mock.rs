//! In-memory [`WalletBridge`] whose behaviour tests script up front.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use securex_shared::networks::NetworkParams;
use securex_shared::{Address, ChainId};

use crate::bridge::{BridgeError, WalletBridge};

#[derive(Default)]
struct Inner {
    accounts: Vec<Address>,
    authorized: bool,
    chain_id: u64,
    known_chains: HashSet<u64>,
    request_error: Option<BridgeError>,
    switch_error: Option<BridgeError>,
    add_error: Option<BridgeError>,
    chain_error: Option<BridgeError>,
    calls: Vec<String>,
}

pub struct MockBridge {
    inner: Mutex<Inner>,
}

impl MockBridge {
    /// A wallet holding `accounts`, on `chain_id`, not yet authorized.
    pub fn new(accounts: &[&str], chain_id: u64) -> Self {
        Self {
            inner: Mutex::new(Inner {
                accounts: accounts.iter().map(|a| Address::new(*a)).collect(),
                chain_id,
                known_chains: HashSet::from([chain_id]),
                ..Default::default()
            }),
        }
    }

    fn with<T>(&self, f: impl FnOnce(&mut Inner) -> T) -> T {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut inner)
    }

    /// Mark the accounts as already authorized, as after a previous session.
    pub fn authorized(self) -> Self {
        self.with(|i| i.authorized = true);
        self
    }

    pub fn knows_chain(self, chain_id: u64) -> Self {
        self.with(|i| i.known_chains.insert(chain_id));
        self
    }

    pub fn fail_request(&self, error: BridgeError) {
        self.with(|i| i.request_error = Some(error));
    }

    pub fn fail_switch(&self, error: BridgeError) {
        self.with(|i| i.switch_error = Some(error));
    }

    pub fn fail_add(&self, error: BridgeError) {
        self.with(|i| i.add_error = Some(error));
    }

    pub fn fail_chain_id(&self, error: Option<BridgeError>) {
        self.with(|i| i.chain_error = error);
    }

    pub fn set_accounts(&self, accounts: &[&str]) {
        self.with(|i| i.accounts = accounts.iter().map(|a| Address::new(*a)).collect());
    }

    pub fn set_chain(&self, chain_id: u64) {
        self.with(|i| {
            i.chain_id = chain_id;
            i.known_chains.insert(chain_id);
        });
    }

    /// Names of the bridge methods called so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.with(|i| i.calls.clone())
    }
}

#[async_trait]
impl WalletBridge for MockBridge {
    async fn request_accounts(&self) -> Result<Vec<Address>, BridgeError> {
        self.with(|i| {
            i.calls.push("request_accounts".into());
            if let Some(e) = i.request_error.take() {
                return Err(e);
            }
            i.authorized = true;
            Ok(i.accounts.clone())
        })
    }

    async fn list_accounts(&self) -> Result<Vec<Address>, BridgeError> {
        self.with(|i| {
            i.calls.push("list_accounts".into());
            Ok(if i.authorized { i.accounts.clone() } else { Vec::new() })
        })
    }

    async fn chain_id(&self) -> Result<ChainId, BridgeError> {
        self.with(|i| {
            i.calls.push("chain_id".into());
            match &i.chain_error {
                Some(e) => Err(e.clone()),
                None => Ok(ChainId(i.chain_id)),
            }
        })
    }

    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), BridgeError> {
        self.with(|i| {
            i.calls.push(format!("switch_chain:{}", chain_id.0));
            if let Some(e) = i.switch_error.take() {
                return Err(e);
            }
            if !i.known_chains.contains(&chain_id.0) {
                return Err(BridgeError::unrecognized_chain(chain_id));
            }
            i.chain_id = chain_id.0;
            Ok(())
        })
    }

    async fn add_chain(&self, params: &NetworkParams) -> Result<(), BridgeError> {
        self.with(|i| {
            i.calls.push(format!("add_chain:{}", params.chain_id.0));
            if let Some(e) = i.add_error.take() {
                return Err(e);
            }
            i.known_chains.insert(params.chain_id.0);
            Ok(())
        })
    }
}
