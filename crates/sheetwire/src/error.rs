//! Error types for credential handling and remote calls

use serde_json::Value;

/// Errors from loading, refreshing, acquiring or persisting a credential.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Failed to access credential storage: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed credential: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Credential source '{0}' is read-only")]
    ReadOnly(String),

    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("Credential acquisition failed: {0}")]
    AcquisitionFailed(String),
}

/// Failure of a single remote call attempt.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CallError {
    /// The service answered with a non-success status
    #[error("Remote error {status}: {message}")]
    Remote {
        status: u16,
        message: String,
        /// Canonical status name from the error body, e.g. `NOT_FOUND`
        reason: Option<String>,
        details: Option<Value>,
    },

    /// The request never produced a response (DNS, TLS, connection reset, ...)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The request could not be built or the response could not be read
    #[error("Malformed payload: {0}")]
    Malformed(String),
}

impl CallError {
    /// Remote error with just a status and message
    pub fn remote(status: u16, message: impl Into<String>) -> Self {
        CallError::Remote {
            status,
            message: message.into(),
            reason: None,
            details: None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            CallError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for CallError {
    fn from(err: serde_json::Error) -> Self {
        CallError::Malformed(err.to_string())
    }
}

/// Errors from building a client out of a [`ClientConfig`](crate::ClientConfig).
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error(transparent)]
    Credential(#[from] CredentialError),
}
