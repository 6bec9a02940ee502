//! # securex-wallet
//!
//! Wallet connection lifecycle for SecureX.
//!
//! - [`bridge`] -- the narrow interface to the browser wallet extension
//! - [`session`] -- the connect / switch-network state machine
//! - [`events`] -- the loop applying account and chain notifications

pub mod bridge;
pub mod events;
pub mod session;

#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use bridge::{BridgeError, WalletBridge};
pub use events::WalletEvent;
pub use session::{Session, SessionConfig, SessionPhase, SessionState};
