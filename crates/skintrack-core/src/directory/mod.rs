//! Patient directory synchronization.
//!
//! ```text
//! RemoteRecordSource ──snapshot──▶ DirectorySyncEngine ──view──▶ UI
//!                                   │            ▲
//!                       AssetRequest│            │complete_asset (per id)
//!                                   ▼            │
//!                                 AssetResolver ─┘
//! ```
//!
//! Snapshots replace the baseline record set. Asset lookups run concurrently
//! and each completion touches only its own record, so a slow or failed
//! lookup never blocks, fails, or overwrites anything else.

mod counts;
mod engine;
mod gallery;
mod snapshot;
mod source;

pub use counts::*;
pub use engine::*;
pub use gallery::*;
pub use snapshot::*;
pub use source::*;

use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

/// Errors from the remote record source.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("Record source unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed snapshot: {0}")]
    Malformed(String),
}

/// Errors from a single asset lookup.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssetError {
    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("Asset transport error: {0}")]
    Transport(String),
}

/// Stream of directory snapshots, in delivery order.
pub type SnapshotStream = BoxStream<'static, Result<Snapshot, SourceError>>;

/// Subscription-based provider of `{id -> fields}` snapshots.
pub trait RemoteRecordSource: Send + Sync {
    /// Subscribe to the records under `path`. Each item is a complete listing.
    fn subscribe(&self, path: &str) -> SnapshotStream;
}

/// Resolves a storage path to a downloadable URL.
#[async_trait]
pub trait AssetResolver: Send + Sync {
    async fn resolve(&self, path: &str) -> Result<String, AssetError>;
}
