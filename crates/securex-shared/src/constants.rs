/// Application name
pub const APP_NAME: &str = "SecureX";

/// Version string written into persisted storage settings
pub const STORAGE_VERSION: &str = "1.0.0";

/// Storage keys for the string-keyed local store
pub const STORAGE_KEY_DOCUMENTS: &str = "securex_documents";
pub const STORAGE_KEY_ACTIVITY_LOGS: &str = "securex_activity_logs";
pub const STORAGE_KEY_SETTINGS: &str = "securex_settings";

/// Maximum number of activity log entries kept (oldest evicted first)
pub const ACTIVITY_LOG_CAP: usize = 1000;

/// Free Edition quota: maximum file size in bytes (10 MiB)
pub const FREE_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Free Edition quota: maximum number of stored documents
pub const FREE_MAX_DOCUMENTS: usize = 50;

/// Public IPFS gateways, tried in order
pub const DEFAULT_IPFS_GATEWAYS: &[&str] = &[
    "https://ipfs.io/ipfs",
    "https://gateway.pinata.cloud/ipfs",
    "https://cloudflare-ipfs.com/ipfs",
];

/// Pinata pinning endpoint
pub const PINATA_PIN_FILE_URL: &str = "https://api.pinata.cloud/pinning/pinFileToIPFS";

/// Placeholder contract address shipped in sample configuration.
/// A deployment still pointing here is treated as unconfigured.
pub const EXAMPLE_CONTRACT_ADDRESS: &str = "0x742d35cc6506c4a9e6d29f0f9f5a8df07c9c31a5";

/// Wallet bridge error codes (EIP-1193 / EIP-3326)
pub const BRIDGE_ERR_USER_REJECTED: i64 = 4001;
pub const BRIDGE_ERR_REQUEST_PENDING: i64 = -32002;
pub const BRIDGE_ERR_UNRECOGNIZED_CHAIN: i64 = 4902;

/// Well-known chain ids
pub const CHAIN_POLYGON_MUMBAI: u64 = 80_001;
pub const CHAIN_SEPOLIA: u64 = 11_155_111;
