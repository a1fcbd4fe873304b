//! Per-patient free-text annotations.
//!
//! Each patient's annotation lives under `{prefix}{patient_id}` in the local
//! store. The text is read once when the screen mounts and written back in
//! full on every edit. There is no history: the last write wins.
//!
//! Reads and writes both go through the shared [`WriteQueue`], so a screen
//! mounted right after another one closed sees that screen's last edit.

use std::collections::HashMap;

use tracing::{debug, error, warn};

use crate::config::CoreConfig;
use crate::kv::{annotation_key, StoreResult, WriteQueue};
use crate::scope::ScreenScope;

/// Annotation state owned by one screen.
pub struct AnnotationStore {
    writes: WriteQueue,
    prefix: String,
    texts: HashMap<String, String>,
    scope: ScreenScope,
}

impl AnnotationStore {
    pub fn new(writes: WriteQueue, prefix: impl Into<String>) -> Self {
        Self {
            writes,
            prefix: prefix.into(),
            texts: HashMap::new(),
            scope: ScreenScope::new(),
        }
    }

    /// Create a store on `writes` using the configured key prefix.
    pub fn open(writes: WriteQueue, config: &CoreConfig) -> Self {
        Self::new(writes, config.annotation_prefix.clone())
    }

    pub fn scope(&self) -> &ScreenScope {
        &self.scope
    }

    /// Read the stored annotation for `patient_id`.
    ///
    /// When nothing is stored (or the read fails) the in-memory text becomes
    /// `default`, typically the server-provided recommendation.
    pub async fn load(&mut self, patient_id: &str, default: &str) -> String {
        let key = annotation_key(&self.prefix, patient_id);
        let stored = match self.writes.read(&key).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!(key = %key, error = %e, "failed to read annotation; using default");
                None
            }
        };

        let text = stored.unwrap_or_else(|| default.to_string());
        if self.scope.is_mounted() {
            self.texts.insert(patient_id.to_string(), text.clone());
        } else {
            debug!(key = %key, "annotation screen unmounted during load");
        }
        text
    }

    /// Replace the annotation for `patient_id` and queue the write.
    ///
    /// The in-memory text changes immediately. Writes for the same patient
    /// reach the store in the order they were saved.
    pub fn save(&mut self, patient_id: &str, text: &str) {
        if !self.scope.is_mounted() {
            debug!(patient_id, "ignoring save on unmounted annotation screen");
            return;
        }
        self.texts.insert(patient_id.to_string(), text.to_string());

        let key = annotation_key(&self.prefix, patient_id);
        if let Err(e) = self.writes.enqueue(key.as_str(), text) {
            error!(key = %key, error = %e, "failed to queue annotation write");
        }
    }

    /// Current in-memory text, if loaded or saved on this screen.
    pub fn text(&self, patient_id: &str) -> Option<&str> {
        self.texts.get(patient_id).map(String::as_str)
    }

    /// Wait for queued writes to be attempted.
    pub async fn flush(&self) -> StoreResult<()> {
        self.writes.flush().await
    }

    pub fn unmount(&self) {
        self.scope.unmount();
    }
}
