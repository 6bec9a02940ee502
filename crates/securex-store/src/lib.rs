//! # securex-store
//!
//! Local persistence for SecureX: a string-keyed store (one JSON value per
//! key, mirroring browser local storage) backed by SQLite, plus a table of
//! base64-encoded file blobs for the Free Edition.
//!
//! [`Database`] offers typed, lock-free helpers over a single
//! `rusqlite::Connection`. [`DocumentStore`] wraps it in a mutex and exposes
//! the document and activity-log operations consumed by the application, so
//! every read-modify-write cycle is applied atomically with respect to other
//! callers.

pub mod activity;
pub mod blobs;
pub mod database;
pub mod documents;
pub mod export;
pub mod migrations;
pub mod models;
pub mod settings;
pub mod simulated;
pub mod store;

mod error;

pub use database::Database;
pub use error::{Result, StoreError};
pub use export::{ExportPayload, ImportStats};
pub use models::*;
pub use store::{ActivityLog, DocumentStore, StoreEvent};
