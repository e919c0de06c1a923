//! The seam between request descriptors and the network.

use serde_json::Value;
use sheetwire_protocol::ApiRequest;

use crate::error::CallError;
use crate::executor::RemoteCall;

/// Sends one [`ApiRequest`] and returns the raw JSON response.
///
/// Implementations report non-success statuses as [`CallError::Remote`] so the
/// executor can classify them.
pub trait Transport: Send + Sync {
    fn send(&self, request: &ApiRequest, access_token: &str) -> Result<Value, CallError>;
}

/// An [`ApiRequest`] bound to the transport that will carry it.
pub struct PreparedCall<'a> {
    transport: &'a dyn Transport,
    request: &'a ApiRequest,
}

impl<'a> PreparedCall<'a> {
    pub fn new(transport: &'a dyn Transport, request: &'a ApiRequest) -> Self {
        Self { transport, request }
    }
}

impl RemoteCall for PreparedCall<'_> {
    fn operation(&self) -> &str {
        self.request.name()
    }

    fn execute(&self, access_token: &str) -> Result<Value, CallError> {
        self.transport.send(self.request, access_token)
    }
}
