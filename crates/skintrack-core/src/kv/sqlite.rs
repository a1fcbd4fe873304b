//! SQLite-backed key/value store.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{KeyValueStore, StoreError, StoreResult};
use crate::db::Database;

/// Durable [`KeyValueStore`] on top of the `kv_store` table.
///
/// SQLite calls are blocking, so each operation runs on tokio's blocking pool.
#[derive(Clone)]
pub struct SqliteStore {
    db: Arc<Mutex<Database>>,
}

impl SqliteStore {
    /// Open or create the store at a path.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        Ok(Self::from_database(Database::open(path)?))
    }

    /// Create an in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::from_database(Database::open_in_memory()?))
    }

    pub fn from_database(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    async fn with_db<T, F>(&self, op: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> StoreResult<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let guard = db
                .lock()
                .map_err(|e| StoreError::Poisoned(e.to_string()))?;
            op(&guard)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let key = key.to_string();
        self.with_db(move |db| Ok(db.get_value(&key)?)).await
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let key = key.to_string();
        let value = value.to_string();
        self.with_db(move |db| Ok(db.set_value(&key, &value)?)).await
    }

    async fn remove(&self, key: &str) -> StoreResult<bool> {
        let key = key.to_string();
        self.with_db(move |db| Ok(db.delete_value(&key)?)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_roundtrip() {
        let store = SqliteStore::open_in_memory().unwrap();

        assert_eq!(store.get("annotation:1").await.unwrap(), None);
        store.set("annotation:1", "use sunscreen").await.unwrap();
        assert_eq!(
            store.get("annotation:1").await.unwrap(),
            Some("use sunscreen".to_string())
        );
        assert!(store.remove("annotation:1").await.unwrap());
        assert_eq!(store.get("annotation:1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kv.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.set("appointments", r#"[{"id":"1"}]"#).await.unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(
            store.get("appointments").await.unwrap(),
            Some(r#"[{"id":"1"}]"#.to_string())
        );
    }
}
