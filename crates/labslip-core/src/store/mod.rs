//! Persistence layer for lab slips.

mod schema;
mod lab_slips;
mod labs;

pub use schema::*;
#[allow(unused_imports)]
pub use lab_slips::*;
#[allow(unused_imports)]
pub use labs::*;

use rusqlite::Connection;
use std::path::Path;
use thiserror::Error;

/// Store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Database connection wrapper.
pub struct SlipStore {
    conn: Connection,
}

impl SlipStore {
    /// Open store at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    /// Create in-memory store (for testing and the demo).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    /// Initialize schema.
    fn initialize(&self) -> StoreResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        tracing::debug!("Lab slip schema initialized");
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let store = SlipStore::open_in_memory();
        assert!(store.is_ok());
    }

    #[test]
    fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slips.db");

        let store = SlipStore::open(&path).unwrap();
        drop(store);

        // Reopening an existing file must not clobber it
        let store = SlipStore::open(&path);
        assert!(store.is_ok());
    }

    #[test]
    fn test_schema_initialized() {
        let store = SlipStore::open_in_memory().unwrap();

        // Check that tables exist
        let tables: Vec<String> = store
            .conn()
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(tables.contains(&"labs".to_string()));
        assert!(tables.contains(&"lab_slips".to_string()));
    }
}
