//! Schema migrations, applied in order when a [`Database`](crate::Database)
//! opens. `PRAGMA user_version` records the last step applied.

pub mod v001_initial;

use rusqlite::Connection;

use crate::error::{Result, StoreError};

type Step = fn(&Connection) -> rusqlite::Result<()>;

/// `(version, name, step)`; versions are contiguous from 1.
const MIGRATIONS: &[(u32, &str, Step)] = &[(1, "v001_initial", v001_initial::up)];

pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    let target = MIGRATIONS.last().map_or(0, |(v, _, _)| *v);

    if current > target {
        return Err(StoreError::Migration(format!(
            "database schema v{current} is newer than supported v{target}"
        )));
    }

    for (version, name, step) in MIGRATIONS.iter().filter(|(v, _, _)| *v > current) {
        tracing::info!(version, name, "applying migration");
        let tx = conn.unchecked_transaction()?;
        step(&tx).map_err(|e| StoreError::Migration(format!("{name}: {e}")))?;
        tx.pragma_update(None, "user_version", version)?;
        tx.commit()?;
    }

    tracing::debug!(version = target, "schema up to date");
    Ok(())
}
