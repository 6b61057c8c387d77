//! Transport-Core: State and Logic for the Transport Dashboard
//!
//! Everything the presentation layer needs short of drawing: the record
//! store, the query engine, form validation, confirmation flows and the
//! signed-in session. Also a simple capacity scenario projection.

pub mod config;
pub mod confirmation;
pub mod context;
pub mod draft;
pub mod error;
pub mod intent;
pub mod live_view;
pub mod prefs;
pub mod query;
pub mod session;
pub mod simulation;
pub mod store;
pub mod summary;
pub mod telemetry;
pub mod validation;

pub use config::{Config, ConfigError};
pub use confirmation::{ConfirmationFlow, Confirmed, Pending, UpdatePolicy, UpdateRequest};
pub use context::{AppContext, SubmitOutcome};
pub use draft::{DraftEditor, Submission};
pub use error::{DashboardError, Result, StateError};
pub use intent::QueryIntent;
pub use live_view::{Debouncer, LiveView};
pub use prefs::{DisplayOrder, PreferenceError, PreferenceFile};
pub use query::{derive_view, Query, SortKey, View, DEFAULT_PAGE_SIZE};
pub use session::{Role, Session, User};
pub use simulation::{CapacityScenario, ScenarioPoint, BASE_CAPACITY};
pub use store::{LoadOutcome, LoadStatus, RecordStore};
pub use summary::FleetSummary;
pub use telemetry::init_tracing;
pub use validation::{
    validate_all, validate_field, validate_new_record, validate_patch, validate_record, Field,
    RecordDraft, ValidationErrors,
};

pub use transport_gateway::{
    ApiError, NewRecord, Record, RecordGateway, RecordId, RecordPatch, TransportType,
};
