//! Appointment schedule.
//!
//! The whole list is stored as one JSON array under a fixed key and rewritten
//! after every add or remove. Mutations are visible in memory immediately;
//! the write happens in the background on the shared [`WriteQueue`].

use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::CoreConfig;
use crate::kv::{StoreResult, WriteQueue};
use crate::models::{next_appointment_id, Appointment, NewAppointment};
use crate::scope::ScreenScope;

/// Schedule errors.
#[derive(Error, Debug, PartialEq)]
pub enum ScheduleError {
    #[error("Schedule has not been loaded")]
    NotLoaded,
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;

#[derive(Debug, Clone, PartialEq)]
enum ScheduleState {
    Uninitialized,
    Loaded(Arc<Vec<Appointment>>),
}

/// Ordered, durable list of appointments owned by one screen.
pub struct ScheduleStore {
    writes: WriteQueue,
    key: String,
    seed: Vec<Appointment>,
    state: ScheduleState,
    scope: ScreenScope,
}

impl ScheduleStore {
    /// `seed` is the list used when nothing has been stored yet.
    pub fn new(writes: WriteQueue, key: impl Into<String>, seed: Vec<Appointment>) -> Self {
        Self {
            writes,
            key: key.into(),
            seed,
            state: ScheduleState::Uninitialized,
            scope: ScreenScope::new(),
        }
    }

    /// Create a store on `writes` under the configured key.
    pub fn open(writes: WriteQueue, config: &CoreConfig, seed: Vec<Appointment>) -> Self {
        Self::new(writes, config.appointments_key.clone(), seed)
    }

    pub fn scope(&self) -> &ScreenScope {
        &self.scope
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, ScheduleState::Loaded(_))
    }

    /// Read the stored list once earlier queued writes have landed. Missing,
    /// unreadable, or malformed data falls back to the seed; this never fails.
    pub async fn load(&mut self) -> Arc<Vec<Appointment>> {
        let entries = match self.writes.read(&self.key).await {
            Ok(Some(json)) => match serde_json::from_str::<Vec<Appointment>>(&json) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(key = %self.key, error = %e, "stored appointments are malformed; using seed");
                    self.seed.clone()
                }
            },
            Ok(None) => self.seed.clone(),
            Err(e) => {
                warn!(key = %self.key, error = %e, "failed to read appointments; using seed");
                self.seed.clone()
            }
        };

        let entries = Arc::new(entries);
        if self.scope.is_mounted() {
            info!(count = entries.len(), "schedule loaded");
            self.state = ScheduleState::Loaded(Arc::clone(&entries));
        } else {
            debug!("schedule screen unmounted during load");
        }
        entries
    }

    /// Current entries in insertion order.
    pub fn entries(&self) -> ScheduleResult<Arc<Vec<Appointment>>> {
        match &self.state {
            ScheduleState::Loaded(entries) => Ok(Arc::clone(entries)),
            ScheduleState::Uninitialized => Err(ScheduleError::NotLoaded),
        }
    }

    pub fn get(&self, id: &str) -> ScheduleResult<Option<Appointment>> {
        Ok(self.entries()?.iter().find(|a| a.id == id).cloned())
    }

    /// Append an appointment with the next id (highest numeric id + 1).
    pub fn add(&mut self, entry: NewAppointment) -> ScheduleResult<Appointment> {
        let current = self.entries()?;
        let appointment = entry.with_id(next_appointment_id(&current));

        let mut next = Vec::clone(&current);
        next.push(appointment.clone());
        self.replace(next);

        debug!(id = %appointment.id, "appointment added");
        Ok(appointment)
    }

    /// Remove the appointment with `id`. Returns whether one was removed.
    pub fn remove(&mut self, id: &str) -> ScheduleResult<bool> {
        let current = self.entries()?;
        let next: Vec<Appointment> = current.iter().filter(|a| a.id != id).cloned().collect();
        let removed = next.len() != current.len();

        self.replace(next);
        debug!(id, removed, "appointment removed");
        Ok(removed)
    }

    /// Appointments dated on or after `from`, soonest first. Entries whose
    /// date is not `YYYY-MM-DD` are skipped.
    pub fn upcoming(&self, from: NaiveDate) -> ScheduleResult<Vec<Appointment>> {
        let mut dated: Vec<(NaiveDate, Appointment)> = self
            .entries()?
            .iter()
            .filter_map(|a| a.parsed_date().map(|date| (date, a.clone())))
            .filter(|(date, _)| *date >= from)
            .collect();
        dated.sort_by(|(da, a), (db, b)| da.cmp(db).then_with(|| a.time.cmp(&b.time)));
        Ok(dated.into_iter().map(|(_, a)| a).collect())
    }

    /// Wait for queued writes to be attempted.
    pub async fn flush(&self) -> StoreResult<()> {
        self.writes.flush().await
    }

    pub fn unmount(&self) {
        self.scope.unmount();
    }

    /// Swap in the new list and queue a full rewrite of it.
    fn replace(&mut self, entries: Vec<Appointment>) {
        if !self.scope.is_mounted() {
            debug!("ignoring schedule change on unmounted screen");
            return;
        }

        let json = match serde_json::to_string(&entries) {
            Ok(json) => Some(json),
            Err(e) => {
                error!(error = %e, "failed to serialize appointments");
                None
            }
        };
        self.state = ScheduleState::Loaded(Arc::new(entries));

        if let Some(json) = json {
            if let Err(e) = self.writes.enqueue(self.key.as_str(), json) {
                error!(key = %self.key, error = %e, "failed to queue appointments write");
            }
        }
    }
}
