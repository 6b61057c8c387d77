//! Error taxonomy for the dashboard core.

use transport_gateway::{ApiError, RecordId};

use crate::validation::ValidationErrors;

/// Caller or programmer errors. These fail fast and are never ignored.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    #[error("update requested without a record id")]
    MissingId,

    #[error("store detached; late result discarded")]
    Detached,

    #[error("a {0} confirmation is already pending")]
    ConfirmationBusy(&'static str),

    #[error("nothing pending to confirm")]
    NothingPending,

    #[error("record not loaded: {0}")]
    UnknownRecord(RecordId),

    #[error("role {role} may not {action}")]
    Forbidden { role: String, action: &'static str },

    #[error("not authenticated: {0}")]
    NotAuthenticated(String),
}

/// Dashboard core errors.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("api error: {0}")]
    Api(#[from] ApiError),

    #[error("state error: {0}")]
    State(#[from] StateError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationErrors),
}

/// Result type for dashboard core operations.
pub type Result<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_error_display() {
        let err = DashboardError::from(StateError::MissingId);
        assert!(err.to_string().contains("without a record id"));

        let err = StateError::Forbidden {
            role: "guest".to_string(),
            action: "delete records",
        };
        assert_eq!(err.to_string(), "role guest may not delete records");
    }

    #[test]
    fn test_api_error_wraps_message() {
        let err = DashboardError::from(ApiError::Network("connection refused".to_string()));
        assert!(err.to_string().contains("api error"));
        assert!(err.to_string().contains("connection refused"));
    }
}
