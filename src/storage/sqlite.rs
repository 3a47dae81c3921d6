//! SQLite-backed key-value store

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;

use crate::error::{GroveError, Result};
use crate::storage::kv::KeyValueStore;

pub const SCHEMA_VERSION: u32 = 1;

/// SQLite database wrapper holding the session state table
pub struct SqliteStore {
    conn: Connection,
    schema_version: u32,
}

impl SqliteStore {
    /// Open database at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::configure_pragmas(&conn)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        let schema_version = run_migrations(&conn)?;
        Ok(Self {
            conn,
            schema_version,
        })
    }

    pub const fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Current schema version after migrations.
    pub const fn schema_version(&self) -> u32 {
        self.schema_version
    }

    fn configure_pragmas(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA temp_store = MEMORY;",
        )?;
        Ok(())
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let raw: Option<String> = self
            .conn
            .query_row("SELECT value FROM state WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        raw.map(|raw| {
            serde_json::from_str(&raw)
                .map_err(|err| GroveError::Serialization(format!("state {key}: {err}")))
        })
        .transpose()
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        let raw = serde_json::to_string(&value)
            .map_err(|err| GroveError::Serialization(format!("state {key}: {err}")))?;
        self.conn.execute(
            "INSERT INTO state (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, raw],
        )?;
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM state WHERE key = ?1", [key])?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT key FROM state ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(keys)
    }
}

fn run_migrations(conn: &Connection) -> Result<u32> {
    let current: u32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if current < 1 {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS state (
                 key   TEXT PRIMARY KEY NOT NULL,
                 value TEXT NOT NULL
             );
             PRAGMA user_version = 1;",
        )?;
    }
    if current > SCHEMA_VERSION {
        tracing::warn!(
            found = current,
            supported = SCHEMA_VERSION,
            "state database was written by a newer grove"
        );
        return Ok(current);
    }
    Ok(SCHEMA_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_database_creation_and_schema_version() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("state/grove.db");
        let store = SqliteStore::open(&db_path).unwrap();
        assert!(db_path.exists());
        assert_eq!(store.schema_version(), SCHEMA_VERSION);
    }

    #[test]
    fn test_wal_mode_enabled() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("grove.db")).unwrap();
        let mode: String = store
            .conn()
            .query_row("PRAGMA journal_mode;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("grove.db");
        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.set("groupmap", json!({"a": {"id": "a"}})).unwrap();
            store.set("storeversion", json!(1)).unwrap();
            store.set("storeversion", json!(2)).unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.get("storeversion").unwrap(), Some(json!(2)));
        assert_eq!(store.keys().unwrap(), ["groupmap", "storeversion"]);
    }

    #[test]
    fn test_delete_missing_key_is_ok() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.delete("nothing").unwrap();
        assert_eq!(store.get("nothing").unwrap(), None);
    }
}
