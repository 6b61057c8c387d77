//! Record store behaviour against in-memory and gated gateways.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::oneshot;
use transport_core::{DashboardError, Field, LoadOutcome, LoadStatus, RecordStore, StateError};
use transport_gateway::fakes::{GatewayOp, MemoryGateway};
use transport_gateway::{
    ApiError, ApiResult, NewRecord, Record, RecordGateway, RecordId, RecordPatch, TransportType,
};

fn fleet() -> Vec<NewRecord> {
    vec![
        NewRecord::new("Truck", 500.0, TransportType::Land),
        NewRecord::new("Ferry", 12000.0, TransportType::Sea),
    ]
}

fn record(id: &str, name: &str) -> Record {
    NewRecord::new(name, 100.0, TransportType::Air).with_id(RecordId::new(id))
}

/// Gateway whose list calls block until the test releases them, in the
/// order the calls were made.
#[derive(Default)]
struct GatedGateway {
    gates: Mutex<VecDeque<oneshot::Receiver<Vec<Record>>>>,
    started: AtomicUsize,
}

impl GatedGateway {
    fn gate(&self) -> oneshot::Sender<Vec<Record>> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().push_back(rx);
        tx
    }

    async fn wait_started(&self, n: usize) {
        while self.started.load(Ordering::SeqCst) < n {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl RecordGateway for GatedGateway {
    async fn list(&self) -> ApiResult<Vec<Record>> {
        let gate = self.gates.lock().unwrap().pop_front();
        self.started.fetch_add(1, Ordering::SeqCst);
        match gate {
            Some(rx) => rx
                .await
                .map_err(|_| ApiError::Network("gate dropped".to_string())),
            None => Ok(Vec::new()),
        }
    }

    async fn create(&self, _record: &NewRecord) -> ApiResult<Record> {
        Err(ApiError::Network("not supported".to_string()))
    }

    async fn update(&self, _id: &RecordId, _patch: &RecordPatch) -> ApiResult<Option<Record>> {
        Err(ApiError::Network("not supported".to_string()))
    }

    async fn delete(&self, _id: &RecordId) -> ApiResult<()> {
        Err(ApiError::Network("not supported".to_string()))
    }
}

#[tokio::test]
async fn load_replaces_records_and_reports_count() {
    let store = RecordStore::new(Arc::new(MemoryGateway::with_records(fleet())));

    let outcome = store.load().await.unwrap();

    assert_eq!(outcome, LoadOutcome::Applied { count: 2 });
    assert_eq!(store.len(), 2);
    assert!(matches!(store.status(), LoadStatus::Loaded { count: 2, .. }));
    assert!(!store.is_loading());
}

#[tokio::test]
async fn failed_create_leaves_records_unchanged() {
    let gateway = Arc::new(MemoryGateway::with_records(fleet()));
    let store = RecordStore::new(gateway.clone());
    store.load().await.unwrap();
    let before = store.records();
    let revision = store.revision();

    gateway.fail_next(GatewayOp::Create, ApiError::Network("connection reset".to_string()));
    let err = store
        .create(NewRecord::new("Jet", 8000.0, TransportType::Air))
        .await
        .unwrap_err();

    assert!(matches!(err, DashboardError::Api(ApiError::Network(_))));
    assert_eq!(store.records(), before);
    assert_eq!(store.revision(), revision);
    assert_eq!(gateway.calls(GatewayOp::Create), 1);
}

#[tokio::test]
async fn load_skips_invalid_records() {
    let gateway = Arc::new(MemoryGateway::with_records(vec![
        NewRecord::new("Truck", 500.0, TransportType::Land),
        NewRecord::new("  ", 80.0, TransportType::Air),
        NewRecord::new("Barge", -1.0, TransportType::Sea),
        NewRecord::new("Ferry", 12000.0, TransportType::Sea),
    ]));
    let store = RecordStore::new(gateway);

    let outcome = store.load().await.unwrap();

    assert_eq!(outcome, LoadOutcome::Applied { count: 2 });
    let names: Vec<_> = store.records().into_iter().map(|r| r.name).collect();
    assert_eq!(names, vec!["Truck", "Ferry"]);
}

#[tokio::test]
async fn invalid_create_never_reaches_gateway() {
    let gateway = Arc::new(MemoryGateway::with_records(fleet()));
    let store = RecordStore::new(gateway.clone());
    store.load().await.unwrap();

    let err = store
        .create(NewRecord::new("   ", f64::NAN, TransportType::Air))
        .await
        .unwrap_err();

    match err {
        DashboardError::Validation(errors) => {
            assert!(errors.get(Field::Name).is_some());
            assert!(errors.get(Field::Capacity).is_some());
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(gateway.calls(GatewayOp::Create), 0);
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn invalid_patch_never_reaches_gateway() {
    let gateway = Arc::new(MemoryGateway::with_records(fleet()));
    let store = RecordStore::new(gateway.clone());
    store.load().await.unwrap();
    let before = store.records();

    let patch = RecordPatch {
        name: Some("   ".to_string()),
        capacity: Some(-5.0),
        ..Default::default()
    };
    let err = store
        .update(Some(&RecordId::new("1")), patch)
        .await
        .unwrap_err();

    assert!(matches!(err, DashboardError::Validation(ref e) if e.len() == 2));
    assert_eq!(gateway.calls(GatewayOp::Update), 0);
    assert_eq!(store.records(), before);
}

#[tokio::test]
async fn failed_update_leaves_record_unchanged() {
    let gateway = Arc::new(MemoryGateway::with_records(fleet()));
    let store = RecordStore::new(gateway.clone());
    store.load().await.unwrap();
    let before = store.records();
    let revision = store.revision();

    gateway.fail_next(
        GatewayOp::Update,
        ApiError::Server {
            status: 503,
            message: "maintenance".to_string(),
        },
    );
    let patch = RecordPatch {
        capacity: Some(750.0),
        ..Default::default()
    };
    let err = store
        .update(Some(&RecordId::new("1")), patch)
        .await
        .unwrap_err();

    assert!(matches!(err, DashboardError::Api(ApiError::Server { status: 503, .. })));
    assert_eq!(store.records(), before);
    assert_eq!(store.revision(), revision);
    assert_eq!(gateway.calls(GatewayOp::Update), 1);
}

#[tokio::test]
async fn update_without_id_never_reaches_gateway() {
    let gateway = Arc::new(MemoryGateway::with_records(fleet()));
    let store = RecordStore::new(gateway.clone());
    store.load().await.unwrap();

    let patch = RecordPatch {
        name: Some("Renamed".to_string()),
        ..Default::default()
    };
    let err = store.update(None, patch).await.unwrap_err();

    assert!(matches!(err, DashboardError::State(StateError::MissingId)));
    assert_eq!(gateway.calls(GatewayOp::Update), 0);
}

#[tokio::test]
async fn update_merges_patch_into_local_record() {
    let gateway = Arc::new(MemoryGateway::with_records(fleet()));
    let store = RecordStore::new(gateway.clone());
    store.load().await.unwrap();

    let id = RecordId::new("1");
    let patch = RecordPatch {
        capacity: Some(750.0),
        ..Default::default()
    };
    let merged = store.update(Some(&id), patch).await.unwrap().unwrap();

    assert_eq!(merged.name, "Truck");
    assert_eq!(merged.capacity, 750.0);
    assert_eq!(store.get(&id).unwrap().capacity, 750.0);
}

#[tokio::test]
async fn delete_removes_record_locally() {
    let gateway = Arc::new(MemoryGateway::with_records(fleet()));
    let store = RecordStore::new(gateway.clone());
    store.load().await.unwrap();

    store.delete(&RecordId::new("2")).await.unwrap();

    assert_eq!(store.len(), 1);
    assert!(store.get(&RecordId::new("2")).is_none());
    assert_eq!(gateway.snapshot().len(), 1);
}

#[tokio::test]
async fn failed_load_keeps_stale_records() {
    let gateway = Arc::new(MemoryGateway::with_records(fleet()));
    let store = RecordStore::new(gateway.clone());
    store.load().await.unwrap();

    gateway.fail_next(
        GatewayOp::List,
        ApiError::Server {
            status: 500,
            message: "database unavailable".to_string(),
        },
    );
    let err = store.load().await.unwrap_err();

    assert!(matches!(err, DashboardError::Api(ApiError::Server { status: 500, .. })));
    assert_eq!(store.len(), 2);
    assert_eq!(store.status().error(), Some("database unavailable"));
    assert!(!store.is_loading());
}

#[tokio::test]
async fn superseded_load_response_is_discarded() {
    let gateway = Arc::new(GatedGateway::default());
    let first_gate = gateway.gate();
    let second_gate = gateway.gate();
    let store = Arc::new(RecordStore::new(gateway.clone()));

    let first = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.load().await }
    });
    gateway.wait_started(1).await;
    let second = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.load().await }
    });
    gateway.wait_started(2).await;
    assert!(store.is_loading());

    second_gate.send(vec![record("7", "Newer")]).unwrap();
    let second = second.await.unwrap().unwrap();
    assert_eq!(second, LoadOutcome::Applied { count: 1 });

    first_gate
        .send(vec![record("1", "Older"), record("2", "Stale")])
        .unwrap();
    let first = first.await.unwrap().unwrap();
    assert_eq!(first, LoadOutcome::Superseded);

    let names: Vec<_> = store.records().into_iter().map(|r| r.name).collect();
    assert_eq!(names, vec!["Newer"]);
}

#[tokio::test]
async fn detached_store_discards_in_flight_load() {
    let gateway = Arc::new(GatedGateway::default());
    let gate = gateway.gate();
    let store = Arc::new(RecordStore::new(gateway.clone()));

    let pending = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.load().await }
    });
    gateway.wait_started(1).await;

    store.detach();
    gate.send(vec![record("1", "Late")]).unwrap();

    let err = pending.await.unwrap().unwrap_err();
    assert!(matches!(err, DashboardError::State(StateError::Detached)));
    assert!(store.is_empty());
    assert_eq!(store.revision(), 0);
    assert!(!store.is_loading());
}

#[tokio::test]
async fn detached_store_rejects_new_calls() {
    let gateway = Arc::new(MemoryGateway::with_records(fleet()));
    let store = RecordStore::new(gateway.clone());
    store.detach();

    assert!(store.is_detached());
    assert!(store.load().await.is_err());
    assert!(store.delete(&RecordId::new("1")).await.is_err());
    assert_eq!(gateway.calls(GatewayOp::List), 0);
    assert_eq!(gateway.calls(GatewayOp::Delete), 0);
}
