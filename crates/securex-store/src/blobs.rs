use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use crate::database::Database;
use crate::error::{Result, StoreError};

impl Database {
    /// Store file bytes for `content_hash`, replacing any previous copy.
    pub fn put_blob(&self, content_hash: &str, file_name: &str, data: &[u8]) -> Result<()> {
        let encoded = STANDARD.encode(data);
        self.conn().execute(
            "INSERT OR REPLACE INTO blobs (content_hash, file_name, file_size, data, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                content_hash,
                file_name,
                data.len() as i64,
                encoded,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_blob(&self, content_hash: &str) -> Result<Vec<u8>> {
        let encoded: Option<String> = self
            .conn()
            .query_row(
                "SELECT data FROM blobs WHERE content_hash = ?1",
                params![content_hash],
                |row| row.get(0),
            )
            .optional()?;

        let encoded = encoded.ok_or(StoreError::NotFound)?;
        Ok(STANDARD.decode(encoded)?)
    }

    pub fn has_blob(&self, content_hash: &str) -> Result<bool> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM blobs WHERE content_hash = ?1",
            params![content_hash],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn delete_blob(&self, content_hash: &str) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM blobs WHERE content_hash = ?1",
            params![content_hash],
        )?;
        Ok(affected > 0)
    }

    pub fn clear_blobs(&self) -> Result<usize> {
        Ok(self.conn().execute("DELETE FROM blobs", [])?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_delete() {
        let db = Database::open_in_memory().unwrap();
        let data = b"%PDF-1.7 binary\x00\xff";

        db.put_blob("QmHash", "a.pdf", data).unwrap();
        assert!(db.has_blob("QmHash").unwrap());
        assert_eq!(db.get_blob("QmHash").unwrap(), data);

        assert!(db.delete_blob("QmHash").unwrap());
        assert!(matches!(db.get_blob("QmHash"), Err(StoreError::NotFound)));
        assert!(!db.delete_blob("QmHash").unwrap());
    }

    #[test]
    fn bytes_are_stored_as_base64() {
        let db = Database::open_in_memory().unwrap();
        db.put_blob("QmHash", "a.txt", b"hello").unwrap();
        let raw: String = db
            .conn()
            .query_row("SELECT data FROM blobs", [], |row| row.get(0))
            .unwrap();
        assert_eq!(raw, "aGVsbG8=");
    }

    #[test]
    fn clear_removes_everything() {
        let db = Database::open_in_memory().unwrap();
        db.put_blob("a", "a", b"1").unwrap();
        db.put_blob("b", "b", b"2").unwrap();
        assert_eq!(db.clear_blobs().unwrap(), 2);
        assert!(!db.has_blob("a").unwrap());
    }
}
