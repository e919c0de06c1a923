//! Error types for sheetwire-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while validating or converting addresses and options.
///
/// Every variant is a local validation failure: nothing here is ever the
/// result of talking to the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Column letters are empty, contain non A-Z characters, or overflow
    #[error("Invalid column letters: {0}")]
    InvalidColumn(String),

    /// Text does not match any accepted A1 shape
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// First endpoint is past the second along some axis
    #[error("Reversed range: {0}")]
    ReversedRange(String),

    /// Grid range has the wrong field set, a bad index, or empty bounds
    #[error("Invalid grid range: {0}")]
    InvalidGridRange(String),

    /// Enumerated option outside its closed set of legal values
    #[error("Invalid {kind} option: {value}")]
    InvalidOption { kind: &'static str, value: String },

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }
}
