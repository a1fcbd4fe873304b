//! Directory sync engine.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use futures::future::join_all;
use futures::StreamExt;
use tracing::{debug, info, warn};

use super::{AssetError, AssetResolver, RemoteRecordSource, SeverityCounts, Snapshot};
use crate::models::{asset_path, AssetKind, AssetState, PatientRecord};
use crate::scope::ScreenScope;

/// One outstanding asset lookup.
///
/// The ticket identifies this particular request. A completion is applied
/// only while its ticket is still the latest one issued for the record.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetRequest {
    pub patient_id: String,
    pub path: String,
    pub ticket: u64,
}

/// Immutable directory state. Replaced as a whole on every change.
#[derive(Debug, Clone, Default)]
pub struct DirectoryView {
    /// Snapshots applied so far
    pub epoch: u64,
    /// Unfiltered records in listing order
    pub baseline: Vec<PatientRecord>,
    /// Query retained by [`DirectorySyncEngine::set_filter`]
    pub filter: String,
    tickets: HashMap<String, u64>,
}

impl DirectoryView {
    /// Records matching the retained filter.
    pub fn visible(&self) -> Vec<PatientRecord> {
        filter_records(&self.baseline, &self.filter)
    }

    pub fn get(&self, id: &str) -> Option<&PatientRecord> {
        self.baseline.iter().find(|r| r.id == id)
    }

    /// Ids with a lookup still in flight.
    pub fn pending_ids(&self) -> Vec<String> {
        self.baseline
            .iter()
            .filter(|r| self.tickets.contains_key(&r.id))
            .map(|r| r.id.clone())
            .collect()
    }
}

/// Live, searchable patient directory with best-effort thumbnail resolution.
pub struct DirectorySyncEngine {
    state: RwLock<Arc<DirectoryView>>,
    next_ticket: AtomicU64,
    thumbnail: AssetKind,
    scope: ScreenScope,
}

impl DirectorySyncEngine {
    /// Create an empty directory resolving `thumbnail` images.
    pub fn new(thumbnail: AssetKind) -> Self {
        Self {
            state: RwLock::new(Arc::new(DirectoryView::default())),
            next_ticket: AtomicU64::new(1),
            thumbnail,
            scope: ScreenScope::new(),
        }
    }

    /// Lifetime guard shared with in-flight callbacks.
    pub fn scope(&self) -> &ScreenScope {
        &self.scope
    }

    /// Stop applying snapshots and asset results.
    pub fn unmount(&self) {
        info!("directory unmounted");
        self.scope.unmount();
    }

    /// Current state. Cheap: clones an `Arc`.
    pub fn view(&self) -> Arc<DirectoryView> {
        Arc::clone(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Full unfiltered record set.
    pub fn baseline(&self) -> Vec<PatientRecord> {
        self.view().baseline.clone()
    }

    /// Records whose display name contains `query`, ignoring case.
    ///
    /// Derived from the baseline; `search("")` always returns everything.
    pub fn search(&self, query: &str) -> Vec<PatientRecord> {
        filter_records(&self.view().baseline, query)
    }

    /// Retain a filter that [`DirectoryView::visible`] applies to every
    /// later baseline.
    pub fn set_filter(&self, query: &str) -> Vec<PatientRecord> {
        let view = self.update(|view| {
            view.filter = query.to_string();
        });
        view.visible()
    }

    /// Records matching the retained filter.
    pub fn visible(&self) -> Vec<PatientRecord> {
        self.view().visible()
    }

    /// Per-category severity histogram of the baseline.
    pub fn severity_counts(&self) -> SeverityCounts {
        SeverityCounts::from_records(&self.view().baseline)
    }

    /// Replace the baseline with the records of `snapshot`.
    ///
    /// Re-seen ids keep their resolved thumbnail; every record without one
    /// gets a fresh lookup ticket. Returns the lookups to run.
    pub fn apply_snapshot(&self, snapshot: &Snapshot) -> Vec<AssetRequest> {
        if !self.scope.is_mounted() {
            debug!("dropping snapshot for unmounted directory");
            return Vec::new();
        }

        let mut requests = Vec::new();
        let view = self.update(|view| {
            let previous: HashMap<&str, &PatientRecord> =
                view.baseline.iter().map(|r| (r.id.as_str(), r)).collect();

            let mut baseline = Vec::with_capacity(snapshot.len());
            let mut tickets = HashMap::new();
            for (id, severity) in snapshot.severities() {
                let mut record = PatientRecord::new(id.to_string(), severity);
                if let Some(existing) = previous.get(id) {
                    if existing.asset.is_resolved() {
                        record.asset = existing.asset.clone();
                    }
                }
                if !record.asset.is_resolved() {
                    let request = self.new_request(&record);
                    tickets.insert(record.id.clone(), request.ticket);
                    requests.push(request);
                }
                baseline.push(record);
            }

            view.baseline = baseline;
            view.tickets = tickets;
            view.epoch += 1;
        });

        info!(
            epoch = view.epoch,
            records = view.baseline.len(),
            lookups = requests.len(),
            "applied directory snapshot"
        );
        requests
    }

    /// Issue fresh lookups for the given ids, superseding any in flight.
    /// Unknown ids are skipped.
    pub fn request_assets(&self, ids: &[String]) -> Vec<AssetRequest> {
        if !self.scope.is_mounted() {
            return Vec::new();
        }

        let mut requests = Vec::new();
        self.update(|view| {
            for id in ids {
                let Some(record) = view.baseline.iter_mut().find(|r| &r.id == id) else {
                    debug!(patient_id = %id, "asset requested for unknown record");
                    continue;
                };
                record.asset = AssetState::Pending;
                let request = self.new_request(record);
                view.tickets.insert(record.id.clone(), request.ticket);
                requests.push(request);
            }
        });
        requests
    }

    /// Lookups that have been issued but not yet completed.
    pub fn pending_requests(&self) -> Vec<AssetRequest> {
        let view = self.view();
        view.baseline
            .iter()
            .filter_map(|record| {
                view.tickets.get(&record.id).map(|ticket| AssetRequest {
                    patient_id: record.id.clone(),
                    path: asset_path(&record.display_name, self.thumbnail),
                    ticket: *ticket,
                })
            })
            .collect()
    }

    /// Apply the outcome of one lookup to its own record only.
    ///
    /// Failures become [`AssetState::Unavailable`] and are logged. Returns
    /// `false` when the result was dropped: the screen is gone, the record
    /// left the directory, or a newer lookup superseded this one.
    pub fn complete_asset(&self, request: &AssetRequest, result: Result<String, AssetError>) -> bool {
        if !self.scope.is_mounted() {
            debug!(patient_id = %request.patient_id, "dropping asset result for unmounted directory");
            return false;
        }

        let mut applied = false;
        self.update(|view| {
            if view.tickets.get(&request.patient_id) != Some(&request.ticket) {
                return;
            }
            let Some(record) = view
                .baseline
                .iter_mut()
                .find(|r| r.id == request.patient_id)
            else {
                return;
            };

            record.asset = match &result {
                Ok(url) => AssetState::Resolved(url.clone()),
                Err(_) => AssetState::Unavailable,
            };
            view.tickets.remove(&request.patient_id);
            applied = true;
        });

        match (&result, applied) {
            (Err(e), _) => warn!(
                patient_id = %request.patient_id,
                path = %request.path,
                error = %e,
                "thumbnail unavailable"
            ),
            (Ok(_), true) => debug!(patient_id = %request.patient_id, "thumbnail resolved"),
            (Ok(_), false) => debug!(patient_id = %request.patient_id, "stale thumbnail result dropped"),
        }
        applied
    }

    /// Run lookups concurrently. Each result is applied as soon as it arrives.
    pub async fn resolve_requests(&self, resolver: &dyn AssetResolver, requests: Vec<AssetRequest>) {
        let lookups = requests.into_iter().map(|request| async move {
            let result = resolver.resolve(&request.path).await;
            self.complete_asset(&request, result);
        });
        join_all(lookups).await;
    }

    /// Look up thumbnails for `ids`, independently of each other.
    pub async fn resolve_assets(&self, resolver: &dyn AssetResolver, ids: &[String]) {
        let requests = self.request_assets(ids);
        self.resolve_requests(resolver, requests).await;
    }

    /// Follow `source` until it ends or the directory unmounts.
    ///
    /// Each snapshot is applied in delivery order; its lookups run on a
    /// separate task so newer snapshots are not held back by slow lookups.
    pub async fn run(
        self: Arc<Self>,
        source: Arc<dyn RemoteRecordSource>,
        resolver: Arc<dyn AssetResolver>,
        path: &str,
    ) {
        info!(path, "subscribing to directory");
        let mut snapshots = source.subscribe(path);

        while let Some(item) = snapshots.next().await {
            if !self.scope.is_mounted() {
                break;
            }
            match item {
                Ok(snapshot) => {
                    let requests = self.apply_snapshot(&snapshot);
                    if requests.is_empty() {
                        continue;
                    }
                    let engine = Arc::clone(&self);
                    let resolver = Arc::clone(&resolver);
                    tokio::spawn(async move {
                        engine.resolve_requests(resolver.as_ref(), requests).await;
                    });
                }
                Err(e) => warn!(path, error = %e, "directory snapshot rejected; keeping last baseline"),
            }
        }
        info!(path, "directory subscription ended");
    }

    fn new_request(&self, record: &PatientRecord) -> AssetRequest {
        AssetRequest {
            patient_id: record.id.clone(),
            path: asset_path(&record.display_name, self.thumbnail),
            ticket: self.next_ticket.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Copy-modify-swap the state slot, returning the new view.
    fn update<F>(&self, f: F) -> Arc<DirectoryView>
    where
        F: FnOnce(&mut DirectoryView),
    {
        let mut slot = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = DirectoryView::clone(&slot);
        f(&mut next);
        let next = Arc::new(next);
        *slot = Arc::clone(&next);
        next
    }
}

fn filter_records(records: &[PatientRecord], query: &str) -> Vec<PatientRecord> {
    records.iter().filter(|r| r.matches(query)).cloned().collect()
}
