//! Uniform success/failure container returned by every public operation

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Structured diagnostic metadata attached to an [`Envelope`]
pub type Context = Map<String, Value>;

/// Classification of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad range syntax, reversed bounds, bad option, malformed grid object.
    /// Resolved locally; never reaches the remote service.
    Validation,
    /// Rate limiting or temporary unavailability that outlived the retry budget
    TransientRemote,
    /// Any other failure reported by the remote service
    PermanentRemote,
    /// Credential refresh or acquisition failed
    Credential,
    /// Unexpected fault (transport, malformed payload, ...)
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::TransientRemote => "transient_remote",
            ErrorKind::PermanentRemote => "permanent_remote",
            ErrorKind::Credential => "credential",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Details of a failed operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Human-readable description
    pub message: String,
    pub kind: ErrorKind,
    /// HTTP status when the remote reported one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    /// Remote or local reason string (e.g. `NOT_FOUND`, `invalid_grant`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Operation that produced the error (e.g. `Sheet::append`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    /// Raw error payload or extra diagnostics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorInfo {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
            code: None,
            reason: None,
            operation: None,
            details: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn with_code(mut self, code: u16) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(op) = &self.operation {
            write!(f, "{op}: ")?;
        }
        write!(f, "{}", self.message)?;
        if let Some(code) = self.code {
            write!(f, " (HTTP {code})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorInfo {}

impl From<crate::Error> for ErrorInfo {
    fn from(err: crate::Error) -> Self {
        ErrorInfo::validation(err.to_string())
    }
}

/// Result of a public operation.
///
/// `ok` is the single source of truth callers branch on. A failed envelope
/// always has `error` set and `data` empty. A successful one carries `data`
/// when the operation has a payload; mutation-only calls leave it empty and
/// report what changed through `context`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T> {
    pub ok: bool,
    pub data: Option<T>,
    pub error: Option<ErrorInfo>,
    /// When the envelope was created
    pub timestamp: DateTime<Utc>,
    /// Caller parameters plus derived facts, present on success and failure
    pub context: Context,
}

impl<T> Envelope<T> {
    /// Successful envelope carrying `data`
    pub fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
            context: Context::new(),
        }
    }

    /// Successful envelope with no payload
    pub fn done() -> Self {
        Self {
            ok: true,
            data: None,
            error: None,
            timestamp: Utc::now(),
            context: Context::new(),
        }
    }

    /// Failed envelope
    pub fn failure(error: ErrorInfo) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error),
            timestamp: Utc::now(),
            context: Context::new(),
        }
    }

    /// Replace the context
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// Tag the error (if any) with the operation that produced it
    pub fn with_operation(mut self, operation: &str) -> Self {
        if let Some(error) = self.error.as_mut() {
            error.operation = Some(operation.to_string());
        }
        self
    }

    pub fn is_ok(&self) -> bool {
        self.ok
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        self.error.as_ref()
    }

    /// Look up a context entry
    pub fn context_value(&self, key: &str) -> Option<&Value> {
        self.context.get(key)
    }

    /// Transform the payload, keeping status, timestamp and context
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Envelope<U> {
        Envelope {
            ok: self.ok,
            data: self.data.map(f),
            error: self.error,
            timestamp: self.timestamp,
            context: self.context,
        }
    }

    /// Drop the payload, keeping everything else
    pub fn discard<U>(self) -> Envelope<U> {
        Envelope {
            ok: self.ok,
            data: None,
            error: self.error,
            timestamp: self.timestamp,
            context: self.context,
        }
    }

    /// Convert into a `Result`, for callers that prefer `?`
    pub fn into_result(self) -> Result<Option<T>, ErrorInfo> {
        match (self.ok, self.error) {
            (true, _) => Ok(self.data),
            (false, Some(error)) => Err(error),
            (false, None) => Err(ErrorInfo::internal("failed envelope without error")),
        }
    }
}
