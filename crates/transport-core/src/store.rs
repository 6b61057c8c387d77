//! Record Store: the authoritative in-memory copy of the transport records.
//!
//! Local state only changes after the gateway confirms a call, so a failed
//! call never needs a rollback. Reads hand out copies; the record set itself
//! is only mutated here.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};
use transport_gateway::{NewRecord, Record, RecordGateway, RecordId, RecordPatch};

use crate::error::{Result, StateError};
use crate::validation::{validate_new_record, validate_patch, validate_record};

/// Loading state of the record set.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    /// Nothing requested yet
    Idle,
    /// A load is in flight
    Loading,
    /// The last load succeeded
    Loaded { at: DateTime<Utc>, count: usize },
    /// The last load failed; previously loaded records are still served
    Failed { message: String },
}

impl LoadStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadStatus::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            LoadStatus::Failed { message } => Some(message),
            _ => None,
        }
    }
}

/// What happened to a load response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The response replaced the record set
    Applied { count: usize },
    /// A later load was issued before this one returned; response dropped
    Superseded,
}

#[derive(Debug)]
struct StoreState {
    records: Vec<Record>,
    status: LoadStatus,
    /// Sequence number of the most recently issued load
    latest_load: u64,
    revision: u64,
    detached: bool,
}

/// Store of transport records backed by a [`RecordGateway`].
pub struct RecordStore {
    gateway: Arc<dyn RecordGateway>,
    state: Mutex<StoreState>,
    changes: watch::Sender<u64>,
}

impl RecordStore {
    pub fn new(gateway: Arc<dyn RecordGateway>) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            gateway,
            state: Mutex::new(StoreState {
                records: Vec::new(),
                status: LoadStatus::Idle,
                latest_load: 0,
                revision: 0,
                detached: false,
            }),
            changes,
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_attached(&self) -> Result<()> {
        if self.lock().detached {
            return Err(StateError::Detached.into());
        }
        Ok(())
    }

    fn commit(&self, state: &mut StoreState) {
        state.revision += 1;
        self.changes.send_replace(state.revision);
    }

    /// Copy of the current record set.
    pub fn records(&self) -> Vec<Record> {
        self.lock().records.clone()
    }

    pub fn get(&self, id: &RecordId) -> Option<Record> {
        self.lock().records.iter().find(|r| &r.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().records.is_empty()
    }

    pub fn status(&self) -> LoadStatus {
        self.lock().status.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().status.is_loading()
    }

    /// Monotonic counter bumped on every change to the record set.
    pub fn revision(&self) -> u64 {
        self.lock().revision
    }

    /// Watch the revision counter.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    /// Stop accepting results. Calls still in flight are discarded when
    /// they return.
    pub fn detach(&self) {
        let mut state = self.lock();
        if !state.detached {
            debug!("Record store detached");
            state.detached = true;
        }
        if state.status.is_loading() {
            state.status = LoadStatus::Idle;
        }
    }

    pub fn is_detached(&self) -> bool {
        self.lock().detached
    }

    /// Fetch the full collection and replace the local record set.
    ///
    /// On failure the status becomes `Failed` and the previous records are
    /// kept. A response that returns after a later load was issued is
    /// discarded. Records with a blank name or a non-positive capacity are
    /// skipped with a warning.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<LoadOutcome> {
        let seq = {
            let mut state = self.lock();
            if state.detached {
                return Err(StateError::Detached.into());
            }
            state.latest_load += 1;
            state.status = LoadStatus::Loading;
            state.latest_load
        };

        let result = self.gateway.list().await;

        let mut state = self.lock();
        if state.detached {
            debug!(seq, "Discarding load result for detached store");
            if state.status.is_loading() {
                state.status = LoadStatus::Idle;
            }
            return Err(StateError::Detached.into());
        }
        if seq != state.latest_load {
            debug!(seq, latest = state.latest_load, "Discarding superseded load");
            return Ok(LoadOutcome::Superseded);
        }

        match result {
            Ok(records) => {
                let (records, rejected): (Vec<Record>, Vec<Record>) = records
                    .into_iter()
                    .partition(|r| validate_record(r).is_empty());
                for record in &rejected {
                    warn!(id = %record.id, errors = %validate_record(record), "Skipping invalid record");
                }
                let count = records.len();
                state.records = records;
                state.status = LoadStatus::Loaded {
                    at: Utc::now(),
                    count,
                };
                self.commit(&mut state);
                info!(count, "Records loaded");
                Ok(LoadOutcome::Applied { count })
            }
            Err(e) => {
                warn!(error = %e, kept = state.records.len(), "Load failed, keeping previous records");
                state.status = LoadStatus::Failed { message: e.message() };
                Err(e.into())
            }
        }
    }

    /// Create a record remotely and append the returned record locally.
    ///
    /// A record with a blank name or a non-positive capacity is rejected
    /// with the validation errors and never sent.
    #[instrument(skip_all, fields(name = %record.name))]
    pub async fn create(&self, record: NewRecord) -> Result<Record> {
        let errors = validate_new_record(&record);
        if !errors.is_empty() {
            warn!(%errors, "Create rejected before sending");
            return Err(errors.into());
        }
        self.ensure_attached()?;

        let created = self.gateway.create(&record).await.map_err(|e| {
            warn!(error = %e, "Create failed");
            e
        })?;

        let mut state = self.lock();
        if state.detached {
            return Err(StateError::Detached.into());
        }
        state.records.push(created.clone());
        self.commit(&mut state);
        info!(id = %created.id, "Record added");
        Ok(created)
    }

    /// Update a record remotely and merge the patch into the local copy.
    ///
    /// Fails before touching the gateway when `id` is `None`
    /// ([`StateError::MissingId`]) or when a field the patch sets is
    /// invalid. Returns the merged local record, if it was loaded.
    #[instrument(skip_all, fields(id = ?id))]
    pub async fn update(&self, id: Option<&RecordId>, patch: RecordPatch) -> Result<Option<Record>> {
        let id = id.ok_or(StateError::MissingId)?;
        let errors = validate_patch(&patch);
        if !errors.is_empty() {
            warn!(%errors, "Update rejected before sending");
            return Err(errors.into());
        }
        self.ensure_attached()?;

        self.gateway.update(id, &patch).await.map_err(|e| {
            warn!(error = %e, "Update failed");
            e
        })?;

        let mut state = self.lock();
        if state.detached {
            return Err(StateError::Detached.into());
        }
        let merged = state.records.iter_mut().find(|r| &r.id == id).map(|record| {
            patch.apply(record);
            record.clone()
        });
        if merged.is_none() {
            debug!("Updated record is not in the local set");
        }
        self.commit(&mut state);
        info!("Record updated");
        Ok(merged)
    }

    /// Delete a record remotely and remove it locally.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &RecordId) -> Result<()> {
        self.ensure_attached()?;

        self.gateway.delete(id).await.map_err(|e| {
            warn!(error = %e, "Delete failed");
            e
        })?;

        let mut state = self.lock();
        if state.detached {
            return Err(StateError::Detached.into());
        }
        state.records.retain(|r| &r.id != id);
        self.commit(&mut state);
        info!("Record removed");
        Ok(())
    }
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("RecordStore")
            .field("records", &state.records.len())
            .field("status", &state.status)
            .field("revision", &state.revision)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use transport_gateway::fakes::MemoryGateway;
    use transport_gateway::TransportType;

    #[tokio::test]
    async fn test_new_store_is_idle_and_empty() {
        let store = RecordStore::new(Arc::new(MemoryGateway::new()));
        assert_eq!(store.status(), LoadStatus::Idle);
        assert!(store.is_empty());
        assert_eq!(store.revision(), 0);
    }

    #[tokio::test]
    async fn test_mutations_bump_revision() {
        let store = RecordStore::new(Arc::new(MemoryGateway::new()));
        let mut changes = store.subscribe();

        let created = store
            .create(NewRecord::new("Van", 900.0, TransportType::Land))
            .await
            .unwrap();
        assert_eq!(store.revision(), 1);
        assert!(changes.has_changed().unwrap());
        assert_eq!(*changes.borrow_and_update(), 1);

        store.delete(&created.id).await.unwrap();
        assert_eq!(store.revision(), 2);
    }

    #[tokio::test]
    async fn test_calls_after_detach_are_rejected() {
        let store = RecordStore::new(Arc::new(MemoryGateway::new()));
        store.detach();

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, crate::DashboardError::State(StateError::Detached)));
        assert!(store.is_detached());
    }
}
