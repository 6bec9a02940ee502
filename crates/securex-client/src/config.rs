//! Client configuration loaded from environment variables.
//!
//! Every setting has a default, so the dashboard starts in demo mode with
//! no configuration at all.

use std::path::PathBuf;

use securex_shared::constants::{DEFAULT_IPFS_GATEWAYS, EXAMPLE_CONTRACT_ADDRESS};
use securex_shared::{Address, ChainId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinataCredentials {
    pub api_key: String,
    pub secret: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Database file.
    /// Env: `SECUREX_DB_PATH`
    /// Default: `securex.db` in the platform data directory.
    pub db_path: Option<PathBuf>,

    /// Explicit storage mode.
    /// Env: `SECUREX_DEMO_MODE` (true/false)
    /// Default: demo mode unless a contract is configured.
    pub demo_mode: Option<bool>,

    /// Deployed document contract.
    /// Env: `SECUREX_CONTRACT_ADDRESS`
    pub contract_address: Option<Address>,

    /// Network the session moves to after connecting.
    /// Env: `SECUREX_PREFERRED_CHAIN` (hex `0x13881` or decimal `80001`)
    pub preferred_chain: Option<ChainId>,

    /// Gateway base URLs, tried in order.
    /// Env: `SECUREX_IPFS_GATEWAYS` (comma separated)
    pub ipfs_gateways: Vec<String>,

    /// Env: `PINATA_API_KEY` and `PINATA_SECRET`, both required.
    pub pinata: Option<PinataCredentials>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            demo_mode: None,
            contract_address: None,
            preferred_chain: None,
            ipfs_gateways: DEFAULT_IPFS_GATEWAYS.iter().map(|g| g.to_string()).collect(),
            pinata: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(path) = var("SECUREX_DB_PATH") {
            config.db_path = Some(PathBuf::from(path));
        }

        if let Some(val) = var("SECUREX_DEMO_MODE") {
            match parse_bool(&val) {
                Some(b) => config.demo_mode = Some(b),
                None => tracing::warn!(value = %val, "Invalid SECUREX_DEMO_MODE, ignoring"),
            }
        }

        if let Some(addr) = var("SECUREX_CONTRACT_ADDRESS") {
            config.contract_address = Some(Address::new(addr));
        }

        if let Some(val) = var("SECUREX_PREFERRED_CHAIN") {
            match val.parse::<ChainId>() {
                Ok(id) => config.preferred_chain = Some(id),
                Err(e) => tracing::warn!(error = %e, "Invalid SECUREX_PREFERRED_CHAIN, ignoring"),
            }
        }

        if let Some(list) = var("SECUREX_IPFS_GATEWAYS") {
            let gateways: Vec<String> = list
                .split(',')
                .map(|g| g.trim().trim_end_matches('/').to_string())
                .filter(|g| !g.is_empty())
                .collect();
            if gateways.is_empty() {
                tracing::warn!("SECUREX_IPFS_GATEWAYS is empty, using defaults");
            } else {
                config.ipfs_gateways = gateways;
            }
        }

        match (var("PINATA_API_KEY"), var("PINATA_SECRET")) {
            (Some(api_key), Some(secret)) => {
                config.pinata = Some(PinataCredentials { api_key, secret })
            }
            (None, None) => {}
            _ => tracing::warn!("Pinata needs both PINATA_API_KEY and PINATA_SECRET, ignoring"),
        }

        config
    }

    /// True when the contract address is a real deployment rather than
    /// missing, malformed, or the placeholder.
    pub fn contract_configured(&self) -> bool {
        self.contract_address
            .as_ref()
            .is_some_and(is_deployed_contract)
    }

    pub fn initial_demo_mode(&self) -> bool {
        self.demo_mode.unwrap_or(!self.contract_configured())
    }
}

pub fn is_deployed_contract(address: &Address) -> bool {
    address.is_well_formed() && !address.matches(EXAMPLE_CONTRACT_ADDRESS)
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
