//! SkinTrack Core Library
//!
//! Local-first data layer behind the SkinTrack mobile screens.
//!
//! # Architecture
//!
//! ```text
//!   Remote record source            Remote asset storage
//!          │ snapshots                      ▲ lookups (concurrent, per id)
//!          ▼                                │
//!   ┌──────────────────────────────────────────────┐
//!   │            DirectorySyncEngine               │
//!   │  baseline ──filter──▶ visible   histogram    │
//!   └──────────────────────────────────────────────┘
//!
//!   AnnotationStore ─┐                  ┌─ ScheduleStore
//!                    ▼                  ▼
//!               WriteQueue (ordered, fire-and-forget)
//!                            │
//!                            ▼
//!               KeyValueStore (SQLite kv_store)
//! ```
//!
//! # Core Principle
//!
//! **Partial failure never blanks a screen.** A failed thumbnail becomes a
//! placeholder, a missing local value becomes its default, and a failed write
//! is logged while the in-memory state moves on.
//!
//! # Modules
//!
//! - [`directory`]: Snapshot merge, asset resolution, search, severity counts
//! - [`annotation`]: Per-patient annotation text
//! - [`schedule`]: Appointment list with id assignment
//! - [`kv`]: Key/value store seam, SQLite and in-memory backends, write queue
//! - [`db`]: SQLite database layer
//! - [`models`]: Domain types (PatientRecord, Appointment, AssetKind, ...)
//! - [`config`], [`logging`], [`scope`]

pub mod annotation;
pub mod config;
pub mod db;
pub mod directory;
pub mod kv;
pub mod logging;
pub mod models;
pub mod schedule;
pub mod scope;

// Re-export commonly used types
pub use annotation::AnnotationStore;
pub use config::CoreConfig;
pub use db::Database;
pub use directory::{
    AssetResolver, AssetRequest, DirectorySyncEngine, RemoteRecordSource, SeverityCounts, Snapshot,
};
pub use kv::{KeyValueStore, MemoryStore, SqliteStore, WriteQueue};
pub use models::{Appointment, AssetKind, AssetState, NewAppointment, PatientRecord, Severity};
pub use schedule::ScheduleStore;
pub use scope::ScreenScope;

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use tokio::runtime::Runtime;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum SkinTrackError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Sync error: {0}")]
    SyncError(String),

    #[error("State error: {0}")]
    StateError(String),
}

impl From<db::DbError> for SkinTrackError {
    fn from(e: db::DbError) -> Self {
        SkinTrackError::DatabaseError(e.to_string())
    }
}

impl From<kv::StoreError> for SkinTrackError {
    fn from(e: kv::StoreError) -> Self {
        SkinTrackError::DatabaseError(e.to_string())
    }
}

impl From<serde_json::Error> for SkinTrackError {
    fn from(e: serde_json::Error) -> Self {
        SkinTrackError::SerializationError(e.to_string())
    }
}

impl From<directory::SourceError> for SkinTrackError {
    fn from(e: directory::SourceError) -> Self {
        SkinTrackError::SyncError(e.to_string())
    }
}

impl From<schedule::ScheduleError> for SkinTrackError {
    fn from(e: schedule::ScheduleError) -> Self {
        SkinTrackError::StateError(e.to_string())
    }
}

impl From<std::io::Error> for SkinTrackError {
    fn from(e: std::io::Error) -> Self {
        SkinTrackError::StateError(format!("Runtime error: {}", e))
    }
}

impl<T> From<std::sync::PoisonError<T>> for SkinTrackError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        SkinTrackError::StateError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Install the log subscriber. Safe to call more than once.
#[uniffi::export]
pub fn init_logging(filter: String) -> bool {
    logging::init_logging(&filter)
}

/// Open the core with a JSON configuration (see [`CoreConfig`]).
#[uniffi::export]
pub fn open_core(config_json: String) -> Result<Arc<SkinTrackCore>, SkinTrackError> {
    let config = CoreConfig::from_json(&config_json)?;
    SkinTrackCore::open(config)
}

/// Open the core with all local state in memory (for testing).
#[uniffi::export]
pub fn open_core_in_memory() -> Result<Arc<SkinTrackCore>, SkinTrackError> {
    SkinTrackCore::open(CoreConfig::default())
}

// =========================================================================
// Main API Object
// =========================================================================

/// Shared runtime and write queue; opens one object per screen.
///
/// Every screen reads and writes through the same [`WriteQueue`], so a
/// remounted screen always sees the edits of the one it replaced.
#[derive(uniffi::Object)]
pub struct SkinTrackCore {
    runtime: Arc<Runtime>,
    writes: WriteQueue,
    config: CoreConfig,
}

impl SkinTrackCore {
    fn open(config: CoreConfig) -> Result<Arc<Self>, SkinTrackError> {
        logging::init_logging(&config.log_filter);

        let store: Arc<dyn KeyValueStore> = match &config.database_path {
            Some(path) => Arc::new(SqliteStore::open(path)?),
            None => Arc::new(MemoryStore::new()),
        };
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("skintrack-core")
            .enable_all()
            .build()?;
        let writes = {
            let _guard = runtime.enter();
            WriteQueue::spawn(store, config.coalesce_writes)
        };

        tracing::info!(
            "{} core v{} opened (database: {})",
            config::APP_NAME,
            config::APP_VERSION,
            config.database_path.as_deref().unwrap_or("in-memory")
        );

        Ok(Arc::new(Self {
            runtime: Arc::new(runtime),
            writes,
            config,
        }))
    }
}

#[uniffi::export]
impl SkinTrackCore {
    /// Mount the patient directory screen.
    pub fn open_directory(&self) -> Arc<DirectoryScreen> {
        Arc::new(DirectoryScreen {
            engine: DirectorySyncEngine::new(self.config.thumbnail_asset),
            gallery_assets: self.config.gallery_assets.clone(),
        })
    }

    /// Mount an annotation screen for one patient and load its text.
    pub fn open_annotation(
        &self,
        patient_id: String,
        default_text: String,
    ) -> Arc<AnnotationScreen> {
        let mut annotations = AnnotationStore::open(self.writes.clone(), &self.config);
        self.runtime.block_on(annotations.load(&patient_id, &default_text));

        Arc::new(AnnotationScreen {
            runtime: Arc::clone(&self.runtime),
            patient_id,
            inner: Mutex::new(annotations),
        })
    }

    /// Mount the schedule screen and load the stored appointments.
    pub fn open_schedule(&self) -> Arc<ScheduleScreen> {
        let mut schedule = ScheduleStore::open(self.writes.clone(), &self.config, Vec::new());
        self.runtime.block_on(schedule.load());

        Arc::new(ScheduleScreen {
            runtime: Arc::clone(&self.runtime),
            inner: Mutex::new(schedule),
        })
    }

    /// Remote path the host should subscribe to for directory snapshots.
    pub fn records_path(&self) -> String {
        self.config.records_path.clone()
    }
}

// =========================================================================
// Screen Objects
// =========================================================================

/// Patient directory. The host delivers snapshots and performs lookups.
#[derive(uniffi::Object)]
pub struct DirectoryScreen {
    engine: DirectorySyncEngine,
    gallery_assets: Vec<AssetKind>,
}

#[uniffi::export]
impl DirectoryScreen {
    /// Merge a snapshot; returns the thumbnail lookups to perform.
    pub fn apply_snapshot_json(&self, json: String) -> Result<Vec<FfiAssetRequest>, SkinTrackError> {
        let snapshot = Snapshot::from_json(&json)?;
        let requests = self.engine.apply_snapshot(&snapshot);
        Ok(requests.into_iter().map(Into::into).collect())
    }

    /// Lookups issued but not yet completed.
    pub fn pending_asset_requests(&self) -> Vec<FfiAssetRequest> {
        self.engine
            .pending_requests()
            .into_iter()
            .map(Into::into)
            .collect()
    }

    /// Report a successful lookup. Returns whether it was applied.
    pub fn asset_resolved(&self, request: FfiAssetRequest, url: String) -> bool {
        self.engine.complete_asset(&request.into(), Ok(url))
    }

    /// Report a failed lookup. Returns whether it was applied.
    pub fn asset_failed(&self, request: FfiAssetRequest, reason: String) -> bool {
        self.engine
            .complete_asset(&request.into(), Err(directory::AssetError::Transport(reason)))
    }

    pub fn search(&self, query: String) -> Vec<FfiPatientRecord> {
        self.engine.search(&query).into_iter().map(Into::into).collect()
    }

    pub fn set_filter(&self, query: String) -> Vec<FfiPatientRecord> {
        self.engine
            .set_filter(&query)
            .into_iter()
            .map(Into::into)
            .collect()
    }

    pub fn visible(&self) -> Vec<FfiPatientRecord> {
        self.engine.visible().into_iter().map(Into::into).collect()
    }

    pub fn severity_counts(&self) -> FfiSeverityCounts {
        self.engine.severity_counts().into()
    }

    /// Storage paths of a patient's gallery images.
    pub fn gallery_requests(&self, patient_id: String) -> Result<Vec<FfiGalleryRequest>, SkinTrackError> {
        let view = self.engine.view();
        let record = view
            .get(&patient_id)
            .ok_or_else(|| SkinTrackError::NotFound(format!("patient {}", patient_id)))?;

        Ok(directory::gallery_paths(&record.display_name, &self.gallery_assets)
            .into_iter()
            .map(|(kind, path)| FfiGalleryRequest {
                kind: kind.to_string(),
                path,
            })
            .collect())
    }
}

impl Drop for DirectoryScreen {
    fn drop(&mut self) {
        self.engine.unmount();
    }
}

/// Annotation editor for one patient.
#[derive(uniffi::Object)]
pub struct AnnotationScreen {
    runtime: Arc<Runtime>,
    patient_id: String,
    inner: Mutex<AnnotationStore>,
}

#[uniffi::export]
impl AnnotationScreen {
    pub fn text(&self) -> Result<String, SkinTrackError> {
        let inner = self.inner.lock()?;
        Ok(inner.text(&self.patient_id).unwrap_or_default().to_string())
    }

    /// Replace the text; the write is queued, not awaited.
    pub fn save(&self, text: String) -> Result<(), SkinTrackError> {
        let mut inner = self.inner.lock()?;
        inner.save(&self.patient_id, &text);
        Ok(())
    }

    /// Block until queued writes have been attempted.
    pub fn flush(&self) -> Result<(), SkinTrackError> {
        let inner = self.inner.lock()?;
        self.runtime.block_on(inner.flush())?;
        Ok(())
    }
}

impl Drop for AnnotationScreen {
    fn drop(&mut self) {
        if let Ok(inner) = self.inner.lock() {
            inner.unmount();
        }
    }
}

/// Appointment list screen.
#[derive(uniffi::Object)]
pub struct ScheduleScreen {
    runtime: Arc<Runtime>,
    inner: Mutex<ScheduleStore>,
}

#[uniffi::export]
impl ScheduleScreen {
    pub fn list(&self) -> Result<Vec<FfiAppointment>, SkinTrackError> {
        let inner = self.inner.lock()?;
        Ok(inner.entries()?.iter().cloned().map(Into::into).collect())
    }

    pub fn add(&self, entry: FfiNewAppointment) -> Result<FfiAppointment, SkinTrackError> {
        let mut inner = self.inner.lock()?;
        Ok(inner.add(entry.into())?.into())
    }

    pub fn remove(&self, id: String) -> Result<bool, SkinTrackError> {
        let mut inner = self.inner.lock()?;
        Ok(inner.remove(&id)?)
    }

    /// Appointments on or after `from` (`YYYY-MM-DD`), soonest first.
    pub fn upcoming(&self, from: String) -> Result<Vec<FfiAppointment>, SkinTrackError> {
        let from = NaiveDate::parse_from_str(&from, "%Y-%m-%d")
            .map_err(|e| SkinTrackError::InvalidInput(format!("{}: {}", from, e)))?;
        let inner = self.inner.lock()?;
        Ok(inner.upcoming(from)?.into_iter().map(Into::into).collect())
    }

    /// Block until queued writes have been attempted.
    pub fn flush(&self) -> Result<(), SkinTrackError> {
        let inner = self.inner.lock()?;
        self.runtime.block_on(inner.flush())?;
        Ok(())
    }
}

impl Drop for ScheduleScreen {
    fn drop(&mut self) {
        if let Ok(inner) = self.inner.lock() {
            inner.unmount();
        }
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe patient record.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientRecord {
    pub id: String,
    pub display_name: String,
    pub severity: String,
    /// Resolved URL or the placeholder URI
    pub image_uri: String,
    /// "pending", "resolved" or "unavailable"
    pub image_status: String,
}

impl From<PatientRecord> for FfiPatientRecord {
    fn from(record: PatientRecord) -> Self {
        let image_status = match record.asset {
            AssetState::Pending => "pending",
            AssetState::Resolved(_) => "resolved",
            AssetState::Unavailable => "unavailable",
        };
        Self {
            image_uri: record.asset.display_uri().to_string(),
            image_status: image_status.to_string(),
            severity: record.severity.label(),
            id: record.id,
            display_name: record.display_name,
        }
    }
}

/// FFI-safe asset lookup request.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAssetRequest {
    pub patient_id: String,
    pub path: String,
    pub ticket: u64,
}

impl From<AssetRequest> for FfiAssetRequest {
    fn from(request: AssetRequest) -> Self {
        Self {
            patient_id: request.patient_id,
            path: request.path,
            ticket: request.ticket,
        }
    }
}

impl From<FfiAssetRequest> for AssetRequest {
    fn from(request: FfiAssetRequest) -> Self {
        AssetRequest {
            patient_id: request.patient_id,
            path: request.path,
            ticket: request.ticket,
        }
    }
}

/// FFI-safe gallery image path.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiGalleryRequest {
    pub kind: String,
    pub path: String,
}

/// One bar of the dashboard severity chart.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSeverityCount {
    pub label: String,
    pub count: u32,
}

/// FFI-safe severity histogram.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSeverityCounts {
    pub mild: u32,
    pub moderate: u32,
    pub severe: u32,
    pub very_severe: u32,
    pub uncategorized: u32,
    pub total: u32,
    /// Categories in chart order, zero counts included
    pub chart: Vec<FfiSeverityCount>,
}

impl From<SeverityCounts> for FfiSeverityCounts {
    fn from(counts: SeverityCounts) -> Self {
        Self {
            total: counts.total(),
            chart: counts
                .labeled()
                .into_iter()
                .map(|(label, count)| FfiSeverityCount { label, count })
                .collect(),
            mild: counts.mild,
            moderate: counts.moderate,
            severe: counts.severe,
            very_severe: counts.very_severe,
            uncategorized: counts.uncategorized,
        }
    }
}

/// FFI-safe appointment.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAppointment {
    pub id: String,
    pub title: String,
    pub detail: String,
    pub date: String,
    pub time: String,
}

impl From<Appointment> for FfiAppointment {
    fn from(appointment: Appointment) -> Self {
        Self {
            id: appointment.id,
            title: appointment.title,
            detail: appointment.detail,
            date: appointment.date,
            time: appointment.time,
        }
    }
}

/// FFI-safe appointment input.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewAppointment {
    pub title: String,
    pub detail: String,
    pub date: String,
    pub time: String,
}

impl From<FfiNewAppointment> for NewAppointment {
    fn from(entry: FfiNewAppointment) -> Self {
        NewAppointment {
            title: entry.title,
            detail: entry.detail,
            date: entry.date,
            time: entry.time,
        }
    }
}
