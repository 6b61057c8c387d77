//! Error types for transport-gateway

use thiserror::Error;

/// Uniform failure of a remote gateway call.
///
/// Whatever went wrong on the wire, callers only ever see one of these and
/// can always render it through [`ApiError::message`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request never produced an HTTP response
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a status >= 400
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The addressed record does not exist remotely
    #[error("record not found: {id}")]
    NotFound { id: String },

    /// The response body could not be decoded
    #[error("invalid response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Human-readable message suitable for a transient notification.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Whether the failure happened before any response was received.
    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::Server {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

/// A transport type label outside the closed enumeration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown transport type: {0:?}")]
pub struct ParseTransportTypeError(pub String);
