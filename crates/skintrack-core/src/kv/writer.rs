//! Ordered fire-and-forget writes.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error};

use super::{KeyValueStore, StoreError, StoreResult};

enum WriteCommand {
    Set { key: String, value: String },
    Flush(oneshot::Sender<()>),
}

/// Single-writer queue in front of a [`KeyValueStore`].
///
/// `enqueue` returns immediately; a background task applies writes one at a
/// time in enqueue order. Failed writes are logged and skipped, never retried.
/// With `coalesce` set, writes to the same key that are queued together
/// collapse into the newest value.
///
/// One queue serves every screen over a store. Clones share the writer task,
/// so writes from a closed screen still land before those of its successor.
#[derive(Clone)]
pub struct WriteQueue {
    store: Arc<dyn KeyValueStore>,
    tx: mpsc::UnboundedSender<WriteCommand>,
}

impl WriteQueue {
    /// Start the writer task. Must be called from within a tokio runtime.
    pub fn spawn(store: Arc<dyn KeyValueStore>, coalesce: bool) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(Arc::clone(&store), rx, coalesce));
        Self { store, tx }
    }

    /// Read `key` once every write queued before this call has been attempted.
    pub async fn read(&self, key: &str) -> StoreResult<Option<String>> {
        self.flush().await?;
        self.store.get(key).await
    }

    /// Queue a write of `value` under `key`.
    pub fn enqueue(&self, key: impl Into<String>, value: impl Into<String>) -> StoreResult<()> {
        self.tx
            .send(WriteCommand::Set {
                key: key.into(),
                value: value.into(),
            })
            .map_err(|_| StoreError::Closed)
    }

    /// Wait until every write queued before this call has been attempted.
    pub async fn flush(&self) -> StoreResult<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(WriteCommand::Flush(ack_tx))
            .map_err(|_| StoreError::Closed)?;
        ack_rx.await.map_err(|_| StoreError::Closed)
    }
}

async fn run_writer(
    store: Arc<dyn KeyValueStore>,
    mut rx: mpsc::UnboundedReceiver<WriteCommand>,
    coalesce: bool,
) {
    while let Some(first) = rx.recv().await {
        let mut batch = vec![first];
        if coalesce {
            while let Ok(next) = rx.try_recv() {
                batch.push(next);
            }
        }

        let mut pending: Vec<(String, String)> = Vec::new();
        for command in batch {
            match command {
                WriteCommand::Set { key, value } => {
                    let existing = if coalesce {
                        pending.iter_mut().find(|(k, _)| *k == key)
                    } else {
                        None
                    };
                    match existing {
                        Some(slot) => slot.1 = value,
                        None => pending.push((key, value)),
                    }
                }
                WriteCommand::Flush(ack) => {
                    apply(store.as_ref(), std::mem::take(&mut pending)).await;
                    let _ = ack.send(());
                }
            }
        }
        apply(store.as_ref(), pending).await;
    }
    debug!("write queue closed");
}

async fn apply(store: &dyn KeyValueStore, writes: Vec<(String, String)>) {
    for (key, value) in writes {
        match store.set(&key, &value).await {
            Ok(()) => debug!(key = %key, bytes = value.len(), "persisted"),
            Err(e) => error!(key = %key, error = %e, "failed to persist value"),
        }
    }
}
