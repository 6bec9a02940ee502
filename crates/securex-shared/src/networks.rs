//! Parameters of the networks a wallet can be asked to register.

use serde::{Deserialize, Serialize};

use crate::constants::{CHAIN_POLYGON_MUMBAI, CHAIN_SEPOLIA};
use crate::types::ChainId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Everything a wallet needs to add a network it does not know yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkParams {
    pub chain_id: ChainId,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
}

pub fn polygon_mumbai() -> NetworkParams {
    NetworkParams {
        chain_id: ChainId(CHAIN_POLYGON_MUMBAI),
        chain_name: "Polygon Mumbai".to_string(),
        native_currency: NativeCurrency {
            name: "MATIC".to_string(),
            symbol: "MATIC".to_string(),
            decimals: 18,
        },
        rpc_urls: vec!["https://rpc-mumbai.maticvigil.com/".to_string()],
        block_explorer_urls: vec!["https://mumbai.polygonscan.com/".to_string()],
    }
}

pub fn sepolia() -> NetworkParams {
    NetworkParams {
        chain_id: ChainId(CHAIN_SEPOLIA),
        chain_name: "Sepolia".to_string(),
        native_currency: NativeCurrency {
            name: "Sepolia Ether".to_string(),
            symbol: "ETH".to_string(),
            decimals: 18,
        },
        rpc_urls: vec!["https://rpc.sepolia.org".to_string()],
        block_explorer_urls: vec!["https://sepolia.etherscan.io".to_string()],
    }
}

/// Built-in network registry.
pub fn known_networks() -> Vec<NetworkParams> {
    vec![polygon_mumbai(), sepolia()]
}
