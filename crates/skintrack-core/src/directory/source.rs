//! In-process record source for hosts that receive snapshots themselves.

use std::collections::HashMap;
use std::sync::Mutex;

use futures::channel::mpsc;
use futures::StreamExt;
use tracing::debug;

use super::{RemoteRecordSource, Snapshot, SnapshotStream, SourceError};

type SnapshotItem = Result<Snapshot, SourceError>;

#[derive(Default)]
struct Channel {
    latest: Option<SnapshotItem>,
    subscribers: Vec<mpsc::UnboundedSender<SnapshotItem>>,
}

/// [`RemoteRecordSource`] fed by [`ChannelSource::publish`].
///
/// Like a realtime database listener, a new subscriber immediately receives
/// the latest published value for its path, then every later one.
#[derive(Default)]
pub struct ChannelSource {
    channels: Mutex<HashMap<String, Channel>>,
}

impl ChannelSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a snapshot (or a source error) to every subscriber of `path`.
    pub fn publish(&self, path: &str, item: SnapshotItem) {
        let mut channels = self
            .channels
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let channel = channels.entry(path.to_string()).or_default();

        channel
            .subscribers
            .retain(|tx| tx.unbounded_send(item.clone()).is_ok());
        debug!(path, subscribers = channel.subscribers.len(), "published snapshot");
        channel.latest = Some(item);
    }

    /// Number of live subscribers on `path`.
    pub fn subscriber_count(&self, path: &str) -> usize {
        let channels = self
            .channels
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        channels
            .get(path)
            .map(|c| c.subscribers.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }
}

impl RemoteRecordSource for ChannelSource {
    fn subscribe(&self, path: &str) -> SnapshotStream {
        let (tx, rx) = mpsc::unbounded();
        let mut channels = self
            .channels
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let channel = channels.entry(path.to_string()).or_default();

        if let Some(latest) = &channel.latest {
            let _ = tx.unbounded_send(latest.clone());
        }
        channel.subscribers.push(tx);
        rx.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_subscriber_receives_published_snapshots() {
        let source = ChannelSource::new();
        let mut stream = source.subscribe("patientData");

        let snapshot = Snapshot::new().with_record("1", json!({"severity": "Mild"}));
        source.publish("patientData", Ok(snapshot.clone()));

        assert_eq!(stream.next().await, Some(Ok(snapshot)));
    }

    #[tokio::test]
    async fn test_late_subscriber_gets_latest() {
        let source = ChannelSource::new();
        source.publish("patientData", Ok(Snapshot::new()));

        let first = Snapshot::new().with_record("2", json!({}));
        source.publish("patientData", Ok(first.clone()));

        let mut stream = source.subscribe("patientData");
        assert_eq!(stream.next().await, Some(Ok(first)));
    }

    #[tokio::test]
    async fn test_paths_are_independent() {
        let source = ChannelSource::new();
        let _stream = source.subscribe("patientData");

        source.publish("otherData", Ok(Snapshot::new()));
        assert_eq!(source.subscriber_count("patientData"), 1);
        assert_eq!(source.subscriber_count("otherData"), 0);
    }

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        let source = ChannelSource::new();
        let stream = source.subscribe("patientData");
        drop(stream);

        source.publish("patientData", Ok(Snapshot::new()));
        assert_eq!(source.subscriber_count("patientData"), 0);
    }
}
