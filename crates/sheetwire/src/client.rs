//! Shared client handle: executor plus transport.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use sheetwire_core::{Envelope, ErrorInfo};
use sheetwire_protocol::ApiRequest;

use crate::executor::ResilientExecutor;
use crate::spreadsheet::Spreadsheet;
use crate::transport::{PreparedCall, Transport};

struct Inner {
    executor: ResilientExecutor,
    transport: Box<dyn Transport>,
}

/// Cheap-to-clone handle used by [`Spreadsheet`] and [`Sheet`](crate::Sheet).
#[derive(Clone)]
pub struct SheetsClient {
    inner: Arc<Inner>,
}

impl SheetsClient {
    pub fn new(executor: ResilientExecutor, transport: impl Transport + 'static) -> Self {
        Self {
            inner: Arc::new(Inner {
                executor,
                transport: Box::new(transport),
            }),
        }
    }

    /// Client talking HTTPS, with credentials and retries taken from `config`.
    ///
    /// Missing or unreadable client secrets are logged and skipped; they are
    /// only needed when a stored credential lacks its own client id, or by
    /// the acquisition flow.
    #[cfg(feature = "http")]
    pub fn from_config(config: crate::ClientConfig) -> Result<Self, crate::ClientError> {
        use crate::credential::{store_for, ClientSecrets, CredentialSession, NoAcquisition};
        use crate::http::{HttpTransport, OAuthRefresher};

        let secrets = match config.client_secrets.as_ref().map(ClientSecrets::load) {
            Some(Ok(secrets)) => secrets,
            Some(Err(err)) => {
                tracing::warn!("Ignoring unreadable client secrets: {err}");
                None
            }
            None => None,
        };

        let session = CredentialSession::new(
            store_for(&config.credential_source),
            Box::new(OAuthRefresher::new(config.timeout, secrets.clone())),
            Box::new(NoAcquisition),
            config.scopes.clone(),
        )
        .with_client_secrets(secrets);
        let executor = ResilientExecutor::new(Arc::new(session), config.retry.clone());
        let transport = HttpTransport::new(&config.base_url, config.timeout)?;

        Ok(Self::new(executor, transport))
    }

    pub fn executor(&self) -> &ResilientExecutor {
        &self.inner.executor
    }

    /// Run a request through the executor, returning the raw payload
    pub fn execute(&self, request: &ApiRequest) -> Envelope<Value> {
        let call = PreparedCall::new(self.inner.transport.as_ref(), request);
        self.inner.executor.execute(&call)
    }

    /// Run a request and decode the payload into `R`
    pub fn call<R: DeserializeOwned>(&self, request: &ApiRequest) -> Result<R, ErrorInfo> {
        match self.execute(request).into_result()? {
            Some(payload) => serde_json::from_value(payload).map_err(|e| {
                ErrorInfo::internal(format!("Unexpected {} response: {e}", request.name()))
            }),
            None => Err(ErrorInfo::internal(format!(
                "Empty {} response",
                request.name()
            ))),
        }
    }

    /// Fetch spreadsheet metadata and return a handle to it
    pub fn open(&self, spreadsheet_id: &str) -> Envelope<Spreadsheet> {
        Spreadsheet::open(self.clone(), spreadsheet_id)
    }
}
