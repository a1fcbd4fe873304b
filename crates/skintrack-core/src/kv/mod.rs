//! Local key/value persistence.
//!
//! Screens read their state once on mount and write it back on every change.
//! Reads go straight to a [`KeyValueStore`]; writes go through a
//! [`WriteQueue`] so the caller never waits on storage and writes still land
//! in the order they were issued.

mod memory;
mod sqlite;
mod writer;

pub use memory::*;
pub use sqlite::*;
pub use writer::*;

use async_trait::async_trait;
use thiserror::Error;

use crate::db::DbError;

/// Key/value store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Lock poisoned: {0}")]
    Poisoned(String),

    #[error("Background task failed: {0}")]
    Task(String),

    #[error("Write queue closed")]
    Closed,

    #[error("Store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable string-to-string mapping that survives process restarts.
///
/// Both operations are total in the happy path. Concurrent writers to the
/// same key are not arbitrated; the last applied write wins.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value. A missing key is `Ok(None)`, not an error.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Delete a key. Returns whether it existed.
    async fn remove(&self, key: &str) -> StoreResult<bool>;
}

/// Key under which a patient's annotation is stored.
pub fn annotation_key(prefix: &str, patient_id: &str) -> String {
    format!("{}{}", prefix, patient_id)
}
