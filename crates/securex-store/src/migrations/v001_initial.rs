//! v001 -- Initial schema creation.
//!
//! Creates the string-keyed `storage` table and the `blobs` table.

use rusqlite::Connection;

const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Key/value storage: one JSON document per fixed key
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS storage (
    key        TEXT PRIMARY KEY NOT NULL,
    value      TEXT NOT NULL,
    updated_at TEXT NOT NULL                  -- RFC-3339
);

-- ----------------------------------------------------------------
-- Blobs (Free Edition file bytes, base64 encoded)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS blobs (
    content_hash TEXT PRIMARY KEY NOT NULL,
    file_name    TEXT NOT NULL,
    file_size    INTEGER NOT NULL,
    data         TEXT NOT NULL,               -- base64
    created_at   TEXT NOT NULL
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
