//! Gateway trait definition
//!
//! `RecordGateway` is the single seam between the dashboard core and the
//! remote collection endpoint. It is async and backend-agnostic; an
//! in-memory fake is provided in the `fakes` module.

use async_trait::async_trait;

use crate::error::ApiError;
use crate::record::{NewRecord, Record, RecordId, RecordPatch};

/// Result type for gateway operations
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Remote CRUD over the transport collection.
///
/// Guarantees:
/// - `create` returns the record carrying its server-assigned id.
/// - `update` may return the updated record or nothing, depending on the
///   server.
/// - Every failure is reported as an [`ApiError`]; nothing is retried.
#[async_trait]
pub trait RecordGateway: Send + Sync {
    /// Fetch the whole collection.
    async fn list(&self) -> ApiResult<Vec<Record>>;

    /// Create a record and return it with its assigned id.
    async fn create(&self, record: &NewRecord) -> ApiResult<Record>;

    /// Apply a patch to the record with the given id.
    async fn update(&self, id: &RecordId, patch: &RecordPatch) -> ApiResult<Option<Record>>;

    /// Delete the record with the given id.
    async fn delete(&self, id: &RecordId) -> ApiResult<()>;
}
