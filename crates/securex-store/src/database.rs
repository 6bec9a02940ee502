//! SQLite handle and the string-keyed storage surface.
//!
//! Each collection is one JSON value under a fixed key, the way a browser's
//! local storage holds it. Readers treat a missing or corrupt value as empty.
//! Writers encode the full value before touching the table, so a failed
//! encode leaves the stored value intact.

use std::path::{Path, PathBuf};

use chrono::Utc;
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, StoreError};
use crate::migrations;

const DB_FILE_NAME: &str = "securex.db";

/// An open, migrated SQLite connection.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// `securex.db` under the platform data directory, e.g.
    /// `~/.local/share/securex/` on Linux.
    pub fn new() -> Result<Self> {
        let dirs = ProjectDirs::from("com", "securex", "securex").ok_or(StoreError::NoDataDir)?;
        Self::open_at(&dirs.data_dir().join(DB_FILE_NAME))
    }

    /// Missing parent directories are created.
    pub fn open_at(path: &Path) -> Result<Self> {
        match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir)?,
            _ => {}
        }

        tracing::info!(path = %path.display(), "opening document database");
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::migrated(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::migrated(Connection::open_in_memory()?)
    }

    fn migrated(conn: Connection) -> Result<Self> {
        migrations::run_migrations(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// File backing the database; `None` for in-memory databases.
    pub fn path(&self) -> Option<PathBuf> {
        self.conn
            .path()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
    }

    // -----------------------------------------------------------------------
    // Raw key/value access
    // -----------------------------------------------------------------------

    pub fn get_item(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM storage WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO storage (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn remove_item(&self, key: &str) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM storage WHERE key = ?1", params![key])?;
        Ok(affected > 0)
    }

    // -----------------------------------------------------------------------
    // JSON values
    // -----------------------------------------------------------------------

    /// Decode the JSON value stored under `key`.
    ///
    /// Returns `None` when the key is missing, unreadable or holds JSON that
    /// does not decode as `T`. Never fails.
    pub fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.get_item(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to read storage key");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "corrupt JSON in storage, treating as empty");
                None
            }
        }
    }

    /// Decode a JSON array stored under `key`, empty when absent or corrupt.
    pub fn read_collection<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        self.read_json(key).unwrap_or_default()
    }

    /// Encode `value` and store it under `key`.
    ///
    /// Encoding happens first; on failure the previously stored value is
    /// left untouched.
    pub fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let encoded = serde_json::to_string(value)?;
        self.set_item(key, &encoded)
    }
}
