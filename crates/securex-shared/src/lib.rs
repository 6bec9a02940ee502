//! # securex-shared
//!
//! Types and constants shared by every SecureX crate: wallet addresses,
//! network identifiers, storage keys and quotas, MIME derivation and the
//! parameters of the networks the wallet session knows how to register.

pub mod constants;
pub mod error;
pub mod mime;
pub mod networks;
pub mod types;

pub use error::TypeError;
pub use types::{Address, ChainId};
