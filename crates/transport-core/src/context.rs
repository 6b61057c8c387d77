//! Application context shared by the presentation layer.
//!
//! [`AppContext`] owns one of each piece of dashboard state: the record
//! store, the signed-in session, the confirmation flow, the form editor, the
//! current query with its debounced view, and the display preferences.
//!
//! The view follows the store: every committed change to the record set
//! schedules a debounced recompute, whichever path made the change. That
//! watcher, the recompute timer and the optional poller all run on the
//! tokio runtime current when the context is built.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};
use transport_gateway::{Record, RecordGateway, RecordId};

use crate::config::Config;
use crate::confirmation::{ConfirmationFlow, Confirmed, Pending, UpdateRequest};
use crate::draft::{DraftEditor, Submission};
use crate::error::{DashboardError, Result, StateError};
use crate::live_view::LiveView;
use crate::prefs::{DisplayOrder, PreferenceError, PreferenceFile};
use crate::query::{Query, View};
use crate::session::{Session, User};
use crate::store::{LoadOutcome, RecordStore};
use crate::summary::FleetSummary;
use crate::validation::Field;

/// What happened to a submitted draft.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Created(Record),
    Updated(Option<Record>),
    /// The update is parked until [`AppContext::confirm`] is called
    AwaitingConfirmation,
}

#[derive(Debug)]
pub struct AppContext {
    config: Config,
    store: Arc<RecordStore>,
    session: Session,
    confirmation: ConfirmationFlow,
    editor: DraftEditor,
    live_view: Arc<LiveView>,
    prefs: PreferenceFile,
    display_order: DisplayOrder,
    store_watcher: Option<JoinHandle<()>>,
    poller: Option<JoinHandle<()>>,
}

/// Recompute the view whenever the store commits a change.
fn watch_store(store: Arc<RecordStore>, live_view: Arc<LiveView>) -> Option<JoinHandle<()>> {
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        warn!("No tokio runtime; the view will only refresh on explicit calls");
        return None;
    };
    let mut changes = store.subscribe();
    Some(runtime.spawn(async move {
        while changes.changed().await.is_ok() {
            let revision = *changes.borrow_and_update();
            debug!(revision, "Records changed, scheduling recompute");
            live_view.schedule(store.records());
        }
    }))
}

impl AppContext {
    /// Build the context. The display order is read from disk once here.
    pub fn new(config: Config, gateway: Arc<dyn RecordGateway>) -> Self {
        let prefs = PreferenceFile::new(config.prefs_path.clone());
        let display_order = prefs.load_display_order_or_default();
        let store = Arc::new(RecordStore::new(gateway));
        let live_view = Arc::new(LiveView::new(config.debounce, config.page_size));
        let store_watcher = watch_store(Arc::clone(&store), Arc::clone(&live_view));

        Self {
            store,
            session: Session::new(config.admin_emails.clone()),
            confirmation: ConfirmationFlow::new(config.update_policy),
            editor: DraftEditor::new(),
            live_view,
            prefs,
            display_order,
            store_watcher,
            poller: None,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn editor(&self) -> &DraftEditor {
        &self.editor
    }

    pub fn pending(&self) -> &Pending {
        self.confirmation.pending()
    }

    /// The current query. Its page stays within the last derived range.
    pub fn query(&self) -> Query {
        self.live_view.query()
    }

    pub fn display_order(&self) -> &DisplayOrder {
        &self.display_order
    }

    /// Latest published page of the list.
    pub fn view(&self) -> View {
        self.live_view.current()
    }

    pub fn subscribe_view(&self) -> watch::Receiver<View> {
        self.live_view.subscribe()
    }

    pub fn live_view(&self) -> &LiveView {
        &self.live_view
    }

    /// Fetch the records. A kept result refreshes the view through the
    /// store watcher.
    #[instrument(skip_all)]
    pub async fn load(&mut self) -> Result<LoadOutcome> {
        self.store.load().await
    }

    /// Reload the records every `every`, starting one period from now.
    ///
    /// Replaces an earlier poller. Polling ends on [`detach`](Self::detach).
    /// A failed poll is logged and the next tick tries again.
    pub fn start_polling(&mut self, every: Duration) {
        self.stop_polling();
        let store = Arc::clone(&self.store);
        info!(every_ms = every.as_millis() as u64, "Polling records");
        self.poller = Some(tokio::spawn(async move {
            let mut ticks = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                match store.load().await {
                    Ok(outcome) => debug!(?outcome, "Poll finished"),
                    Err(DashboardError::State(StateError::Detached)) => break,
                    Err(e) => warn!(error = %e, "Poll failed"),
                }
            }
            debug!("Poller stopped");
        }));
    }

    pub fn stop_polling(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
    }

    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(|p| !p.is_finished())
    }

    pub fn set_query(&mut self, query: Query) {
        self.live_view.set_query(self.store.records(), query);
    }

    /// Change the query in place and schedule a view refresh.
    pub fn update_query(&mut self, change: impl FnOnce(&mut Query)) {
        let mut query = self.live_view.query();
        change(&mut query);
        self.set_query(query);
    }

    /// Skip the debounce and derive the view now.
    pub fn render_now(&mut self) -> View {
        self.live_view.flush(&self.store.records())
    }

    pub fn start_create(&mut self) {
        self.editor.start_create();
    }

    /// Open the editor on a loaded record.
    pub fn start_edit(&mut self, id: &RecordId) -> std::result::Result<(), StateError> {
        let record = self
            .store
            .get(id)
            .ok_or_else(|| StateError::UnknownRecord(id.clone()))?;
        self.editor.start_edit(&record);
        Ok(())
    }

    pub fn set_field(&mut self, field: Field, value: impl Into<String>) -> Option<&str> {
        self.editor.set_field(field, value)
    }

    /// Validate the draft and send it to the store.
    ///
    /// The draft is kept when validation or the store call fails, and while
    /// an update awaits confirmation.
    #[instrument(skip_all)]
    pub async fn submit(&mut self) -> Result<SubmitOutcome> {
        match self.editor.prepare()? {
            Submission::Create(new_record) => {
                let record = self.store.create(new_record).await?;
                self.editor.clear();
                Ok(SubmitOutcome::Created(record))
            }
            Submission::Update { id, patch } => {
                match self
                    .confirmation
                    .submit_update(&self.store, Some(id), patch)
                    .await?
                {
                    UpdateRequest::Applied(record) => {
                        self.editor.clear();
                        Ok(SubmitOutcome::Updated(record))
                    }
                    UpdateRequest::AwaitingConfirmation => Ok(SubmitOutcome::AwaitingConfirmation),
                }
            }
        }
    }

    /// Close the editor, dropping a parked update along with it.
    pub fn cancel_edit(&mut self) {
        if let Pending::Update { .. } = self.confirmation.pending() {
            self.confirmation.cancel();
        }
        self.editor.clear();
    }

    /// Ask for confirmation before deleting a loaded record. Admins only.
    pub fn request_delete(&mut self, id: &RecordId) -> std::result::Result<(), StateError> {
        let role = self.session.role();
        if !role.can_delete() {
            return Err(StateError::Forbidden {
                role: role.to_string(),
                action: "delete",
            });
        }
        let record = self
            .store
            .get(id)
            .ok_or_else(|| StateError::UnknownRecord(id.clone()))?;
        self.confirmation.request_delete(&record)
    }

    /// Run the pending delete or update.
    ///
    /// The editor is closed after a confirmed update, and after a delete of
    /// the record it was editing.
    #[instrument(skip_all)]
    pub async fn confirm(&mut self) -> Result<Confirmed> {
        let confirmed = self.confirmation.confirm(&self.store).await?;
        let close_editor = match &confirmed {
            Confirmed::Updated(_) => true,
            Confirmed::Deleted(id) => self.editor.target().is_some_and(|t| &t.id == id),
        };
        if close_editor {
            self.editor.clear();
        }
        Ok(confirmed)
    }

    pub fn cancel_confirmation(&mut self) -> Pending {
        self.confirmation.cancel()
    }

    pub fn login(&mut self, email: &str, password: &str) -> std::result::Result<&User, StateError> {
        self.session.login(email, password)
    }

    pub fn logout(&mut self) {
        self.confirmation.cancel();
        self.session.logout();
    }

    /// Reorder the dashboard panels and persist the new order.
    pub fn move_panel(&mut self, from: usize, to: usize) -> std::result::Result<(), PreferenceError> {
        let mut reordered = self.display_order.clone();
        reordered.move_item(from, to)?;
        self.prefs.save_display_order(&reordered)?;
        self.display_order = reordered;
        debug!(from, to, "Panel moved");
        Ok(())
    }

    pub fn summary(&self) -> FleetSummary {
        FleetSummary::from_records(&self.store.records())
    }

    /// Stop polling and stop accepting results from requests still in
    /// flight.
    pub fn detach(&mut self) {
        self.stop_polling();
        self.store.detach();
    }
}

impl Drop for AppContext {
    fn drop(&mut self) {
        self.stop_polling();
        if let Some(watcher) = self.store_watcher.take() {
            watcher.abort();
        }
    }
}
