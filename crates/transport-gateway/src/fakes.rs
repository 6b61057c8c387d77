//! In-memory fakes for the gateway trait (testing only)
//!
//! Provides `MemoryGateway`, which satisfies the `RecordGateway` contract
//! without any network, records how often each operation was invoked, and
//! can be told to fail upcoming calls.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::ApiError;
use crate::gateway::{ApiResult, RecordGateway};
use crate::record::{NewRecord, Record, RecordId, RecordPatch};

/// Gateway operation, used to address call counters and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOp {
    List,
    Create,
    Update,
    Delete,
}

#[derive(Debug, Default)]
struct MemoryState {
    records: Vec<Record>,
    next_id: u64,
    calls: HashMap<GatewayOp, usize>,
    failures: HashMap<GatewayOp, VecDeque<ApiError>>,
}

impl MemoryState {
    /// Count the call and pop an injected failure, if any.
    fn enter(&mut self, op: GatewayOp) -> ApiResult<()> {
        *self.calls.entry(op).or_default() += 1;
        match self.failures.get_mut(&op).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn assign_id(&mut self) -> RecordId {
        self.next_id += 1;
        RecordId(self.next_id.to_string())
    }
}

/// In-memory gateway backed by a `Vec<Record>` with sequential ids.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    state: Mutex<MemoryState>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the remote collection, assigning ids in order.
    pub fn with_records(records: impl IntoIterator<Item = NewRecord>) -> Self {
        let gateway = Self::new();
        {
            let mut state = gateway.state.lock().unwrap();
            for record in records {
                let id = state.assign_id();
                state.records.push(record.with_id(id));
            }
        }
        gateway
    }

    /// Make the next call to `op` fail with `err`. Failures queue up.
    pub fn fail_next(&self, op: GatewayOp, err: ApiError) {
        let mut state = self.state.lock().unwrap();
        state.failures.entry(op).or_default().push_back(err);
    }

    /// Number of times `op` has been invoked (including failed calls).
    pub fn calls(&self, op: GatewayOp) -> usize {
        let state = self.state.lock().unwrap();
        state.calls.get(&op).copied().unwrap_or(0)
    }

    /// Copy of the remote collection.
    pub fn snapshot(&self) -> Vec<Record> {
        self.state.lock().unwrap().records.clone()
    }
}

#[async_trait]
impl RecordGateway for MemoryGateway {
    async fn list(&self) -> ApiResult<Vec<Record>> {
        let mut state = self.state.lock().unwrap();
        state.enter(GatewayOp::List)?;
        Ok(state.records.clone())
    }

    async fn create(&self, record: &NewRecord) -> ApiResult<Record> {
        let mut state = self.state.lock().unwrap();
        state.enter(GatewayOp::Create)?;
        let id = state.assign_id();
        let created = record.clone().with_id(id);
        state.records.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: &RecordId, patch: &RecordPatch) -> ApiResult<Option<Record>> {
        let mut state = self.state.lock().unwrap();
        state.enter(GatewayOp::Update)?;
        let record = state
            .records
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| ApiError::NotFound { id: id.to_string() })?;
        patch.apply(record);
        Ok(Some(record.clone()))
    }

    async fn delete(&self, id: &RecordId) -> ApiResult<()> {
        let mut state = self.state.lock().unwrap();
        state.enter(GatewayOp::Delete)?;
        let before = state.records.len();
        state.records.retain(|r| &r.id != id);
        if state.records.len() == before {
            return Err(ApiError::NotFound { id: id.to_string() });
        }
        Ok(())
    }
}
