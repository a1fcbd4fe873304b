//! SQLite backing for the local key/value store.
//!
//! One table, `kv_store`, holds every persisted value (annotations and the
//! appointment list). Row operations live in [`kv`].

mod kv;
mod schema;

pub use schema::*;

use std::path::Path;
use std::time::Duration;

use rusqlite::Connection;
use thiserror::Error;
use tracing::debug;

/// How long a write waits on a lock held by another connection.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type DbResult<T> = Result<T, DbError>;

/// Connection to a `kv_store` database.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the store file at `path`, creating it and its table if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        debug!(path = %path.as_ref().display(), "opening kv database");
        Self::with_schema(Connection::open(path)?)
    }

    /// Create a store that lives only as long as this value (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        Self::with_schema(Connection::open_in_memory()?)
    }

    fn with_schema(conn: Connection) -> DbResult<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn test_schema_initialized() {
        let db = Database::open_in_memory().unwrap();

        let tables: Vec<String> = db
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(tables.contains(&"kv_store".to_string()));
    }

    #[test]
    fn test_reopen_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skintrack.db");

        {
            let db = Database::open(&path).unwrap();
            db.set_value("annotation:9", "moisturize").unwrap();
        }

        let db = Database::open(&path).unwrap();
        assert_eq!(
            db.get_value("annotation:9").unwrap(),
            Some("moisturize".to_string())
        );
    }
}
