//! Debounced recomputation of the list view.
//!
//! Every change to the records or the query schedules a recompute. A new
//! schedule cancels the pending one, so a burst of keystrokes results in a
//! single [`derive_view`] call over the final state once the delay elapses.
//!
//! Scheduling spawns onto the current tokio runtime.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::trace;
use transport_gateway::Record;

use crate::query::{derive_view, Query, View};

/// Cancellable delayed task. Only the most recently scheduled task runs.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `task` after the delay unless another task is scheduled first.
    pub fn schedule<F>(&mut self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        }));
    }

    /// Drop the pending task, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[derive(Debug)]
struct Shared {
    query: Mutex<Query>,
    view: watch::Sender<View>,
    recomputes: AtomicU64,
}

impl Shared {
    fn query(&self) -> MutexGuard<'_, Query> {
        self.query.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Derive and publish the view for `snapshot`. When the query has not
    /// changed since the snapshot, the clamped page is written back to it.
    fn publish(&self, records: &[Record], snapshot: &Query) -> View {
        let derived = derive_view(records, snapshot);
        let n = self.recomputes.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut query = self.query();
            if *query == *snapshot && query.page != derived.page {
                trace!(from = query.page, to = derived.page, "Page clamped");
                query.page = derived.page;
            }
        }
        trace!(recompute = n, matches = derived.total_matches, "View recomputed");
        self.view.send_replace(derived.clone());
        derived
    }
}

/// The current query and the view derived from it, recomputed on a
/// debounce timer.
#[derive(Debug)]
pub struct LiveView {
    debouncer: Mutex<Debouncer>,
    shared: Arc<Shared>,
}

impl LiveView {
    pub fn new(delay: Duration, page_size: usize) -> Self {
        let (view, _) = watch::channel(View::empty(page_size));
        Self {
            debouncer: Mutex::new(Debouncer::new(delay)),
            shared: Arc::new(Shared {
                query: Mutex::new(Query::with_page_size(page_size)),
                view,
                recomputes: AtomicU64::new(0),
            }),
        }
    }

    fn debouncer(&self) -> MutexGuard<'_, Debouncer> {
        self.debouncer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The current query. Its page is kept within the last derived range.
    pub fn query(&self) -> Query {
        self.shared.query().clone()
    }

    /// Replace the query and schedule a recompute over `records`.
    pub fn set_query(&self, records: Vec<Record>, query: Query) {
        *self.shared.query() = query;
        self.schedule(records);
    }

    /// Schedule a recompute over a snapshot of `records` and the current
    /// query.
    pub fn schedule(&self, records: Vec<Record>) {
        let snapshot = self.query();
        let shared = Arc::clone(&self.shared);
        self.debouncer().schedule(move || {
            shared.publish(&records, &snapshot);
        });
    }

    /// Cancel any pending recompute and derive the view immediately.
    pub fn flush(&self, records: &[Record]) -> View {
        self.debouncer().cancel();
        let snapshot = self.query();
        self.shared.publish(records, &snapshot)
    }

    /// Latest published view.
    pub fn current(&self) -> View {
        self.shared.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<View> {
        self.shared.view.subscribe()
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer().is_pending()
    }

    /// Number of times the view has been derived.
    pub fn recompute_count(&self) -> u64 {
        self.shared.recomputes.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use transport_gateway::{NewRecord, RecordId, TransportType};

    fn records() -> Vec<Record> {
        vec![
            NewRecord::new("Truck", 500.0, TransportType::Land).with_id(RecordId::new("1")),
            NewRecord::new("Tanker", 90000.0, TransportType::Sea).with_id(RecordId::new("2")),
            NewRecord::new("Glider", 200.0, TransportType::Air).with_id(RecordId::new("3")),
        ]
    }

    #[tokio::test(start_paused = true)]
    async fn test_debouncer_runs_only_last_task() {
        let hits = Arc::new(AtomicUsize::new(0));
        let last = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::new(Duration::from_millis(100));

        for i in 1..=3 {
            let hits = Arc::clone(&hits);
            let last = Arc::clone(&last);
            debouncer.schedule(move || {
                hits.fetch_add(1, Ordering::SeqCst);
                last.store(i, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_millis(30)).await;
        }
        assert!(debouncer.is_pending());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(last.load(Ordering::SeqCst), 3);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_of_query_changes_derives_once() {
        let live = LiveView::new(Duration::from_millis(300), 6);

        live.set_query(records(), Query::default().text("t"));
        live.set_query(records(), Query::default().text("ta"));
        live.set_query(records(), Query::default().text("tan"));
        assert_eq!(live.recompute_count(), 0);

        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(live.recompute_count(), 1);
        let view = live.current();
        assert_eq!(view.total_matches, 1);
        assert_eq!(view.items[0].name, "Tanker");
    }

    #[tokio::test(start_paused = true)]
    async fn test_changes_spaced_beyond_delay_each_recompute() {
        let live = LiveView::new(Duration::from_millis(50), 6);

        live.schedule(records());
        tokio::time::sleep(Duration::from_millis(100)).await;
        live.set_query(records(), Query::default().of_type(Some(TransportType::Air)));
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(live.recompute_count(), 2);
        assert_eq!(live.current().items[0].name, "Glider");
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_cancels_pending_recompute() {
        let live = LiveView::new(Duration::from_millis(300), 6);
        live.set_query(records(), Query::default().text("truck"));
        live.set_query(records(), Query::default());

        let view = live.flush(&records());
        assert_eq!(view.total_matches, 3);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(live.recompute_count(), 1);
        assert_eq!(live.current().total_matches, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clamped_page_is_written_back_to_query() {
        let live = LiveView::new(Duration::from_millis(100), 2);
        live.set_query(records(), Query::with_page_size(2).page(2));
        assert_eq!(live.flush(&records()).page, 2);

        live.set_query(records(), Query::with_page_size(2).page(2).text("glider"));
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(live.current().page, 1);
        assert_eq!(live.query().page, 1);

        // Clearing the filter stays on the clamped page.
        let mut query = live.query();
        query.text_filter.clear();
        live.set_query(records(), query);
        assert_eq!(live.flush(&records()).page, 1);
    }

    #[tokio::test]
    async fn test_initial_view_is_empty() {
        let live = LiveView::new(Duration::from_millis(10), 4);
        let view = live.current();
        assert!(view.items.is_empty());
        assert_eq!(view.page_size, 4);
        assert_eq!(live.query().page_size, 4);
        assert!(!live.is_pending());
    }
}
