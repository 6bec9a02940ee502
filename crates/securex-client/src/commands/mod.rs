//! Command handlers consumed by the dashboard views.
//!
//! Each sub-module groups related commands. Document, activity and storage
//! commands require a connected wallet and follow the current storage mode.

pub mod activity;
pub mod documents;
pub mod storage;
pub mod wallet;
