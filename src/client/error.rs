//! Error taxonomy surfaced by the client.

use thiserror::Error;

/// Errors returned by [`MemosClient`](super::MemosClient) and
/// [`SyncMemosClient`](super::SyncMemosClient).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemosError {
    /// Transport failure: refused connection, timeout, DNS, unreadable body or failed probe.
    #[error("Connection error: {0}")]
    Connection(String),
    /// An operation was attempted on a session that is not connected.
    #[error("Client not connected")]
    NotConnected,
    /// The server answered 401.
    #[error("{message}")]
    Authentication {
        /// Human-readable reason.
        message: String,
    },
    /// The server answered 404 for a resolvable resource path.
    #[error("{resource} '{resource_id}' not found")]
    NotFound {
        /// Resource type, e.g. `memo`.
        resource: String,
        /// Identifier taken from the request path.
        resource_id: String,
    },
    /// The server answered 400.
    #[error("{message}")]
    Validation {
        /// `detail` field of the response, or a generic message.
        message: String,
    },
    /// The server answered with a 5xx status.
    #[error("Server error: {message}")]
    Server {
        /// HTTP status.
        status: u16,
        /// Response body.
        message: String,
    },
    /// Any other non-success status.
    #[error("HTTP {status}: {message}")]
    Api {
        /// HTTP status.
        status: u16,
        /// Response body.
        message: String,
    },
    /// A success response whose body did not decode into the expected type.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    /// The blocking wrapper could not start its runtime.
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl MemosError {
    /// HTTP status behind the error, for variants derived from a response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            MemosError::Authentication { .. } => Some(401),
            MemosError::NotFound { .. } => Some(404),
            MemosError::Validation { .. } => Some(400),
            MemosError::Server { status, .. } | MemosError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether another attempt may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, MemosError::Connection(_) | MemosError::Server { .. })
    }
}

impl From<reqwest::Error> for MemosError {
    fn from(err: reqwest::Error) -> Self {
        MemosError::Connection(err.to_string())
    }
}

/// Result alias used throughout the client.
pub type Result<T, E = MemosError> = std::result::Result<T, E>;
