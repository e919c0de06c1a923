//! Test doubles shared by the client tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};
use sheetwire::{
    ApiRequest, CallError, ClientSecrets, Credential, CredentialAcquirer, CredentialError, CredentialStore,
    RemoteCall, ResilientExecutor, RetryPolicy, SheetsClient, Sleeper, StaticToken,
    TokenRefresher, Transport,
};

/// Remote call that replays a script of results, then keeps repeating the last one.
pub struct ScriptedCall {
    script: Mutex<VecDeque<Result<Value, CallError>>>,
    last: Result<Value, CallError>,
    calls: AtomicUsize,
}

impl ScriptedCall {
    pub fn new(script: Vec<Result<Value, CallError>>) -> Self {
        let last = script
            .last()
            .cloned()
            .unwrap_or_else(|| Ok(Value::Null));
        Self {
            script: Mutex::new(script.into()),
            last,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn always(result: Result<Value, CallError>) -> Self {
        Self::new(vec![result])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RemoteCall for ScriptedCall {
    fn operation(&self) -> &str {
        "scripted"
    }

    fn execute(&self, _access_token: &str) -> Result<Value, CallError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.last.clone())
    }
}

/// Records requested delays instead of sleeping.
#[derive(Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, delay: Duration) {
        self.delays.lock().unwrap().push(delay);
    }
}

pub fn transient(status: u16) -> CallError {
    CallError::remote(status, "Service unavailable")
}

pub fn executor_with(policy: RetryPolicy) -> (ResilientExecutor, Arc<RecordingSleeper>) {
    let sleeper = Arc::new(RecordingSleeper::default());
    let executor = ResilientExecutor::new(Arc::new(StaticToken::new("test-token")), policy)
        .with_sleeper(sleeper.clone());
    (executor, sleeper)
}

#[derive(Default)]
struct TransportState {
    responses: Mutex<VecDeque<Result<Value, CallError>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

/// Transport that answers from a queue and records every request.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<TransportState>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, response: Result<Value, CallError>) -> &Self {
        self.state.responses.lock().unwrap().push_back(response);
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> ApiRequest {
        self.requests().pop().expect("no request was sent")
    }
}

impl Transport for MockTransport {
    fn send(&self, request: &ApiRequest, _access_token: &str) -> Result<Value, CallError> {
        self.state.requests.lock().unwrap().push(request.clone());
        self.state
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CallError::Malformed("no scripted response".into())))
    }
}

pub fn client_with(transport: &MockTransport) -> (SheetsClient, Arc<RecordingSleeper>) {
    let (executor, sleeper) = executor_with(RetryPolicy::default());
    (SheetsClient::new(executor, transport.clone()), sleeper)
}

/// Metadata for a spreadsheet with two tabs
pub fn metadata() -> Value {
    json!({
        "spreadsheetId": "sheet-123",
        "properties": {"title": "Budget", "locale": "en_US", "timeZone": "America/Sao_Paulo"},
        "sheets": [
            {"properties": {"sheetId": 0, "title": "Sheet1", "index": 0,
                "gridProperties": {"rowCount": 1000, "columnCount": 26}}},
            {"properties": {"sheetId": 42, "title": "My Data", "index": 1,
                "gridProperties": {"rowCount": 50, "columnCount": 5}}}
        ]
    })
}

#[derive(Default)]
struct StoreState {
    credential: Mutex<Option<Credential>>,
    saves: AtomicUsize,
}

/// In-memory credential store that counts saves.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<StoreState>,
    fail_saves: bool,
    fail_loads: bool,
}

impl MemoryStore {
    pub fn holding(credential: Credential) -> Self {
        let store = Self::default();
        *store.state.credential.lock().unwrap() = Some(credential);
        store
    }

    pub fn failing_saves(mut self) -> Self {
        self.fail_saves = true;
        self
    }

    pub fn failing_loads(mut self) -> Self {
        self.fail_loads = true;
        self
    }

    pub fn saves(&self) -> usize {
        self.state.saves.load(Ordering::SeqCst)
    }

    pub fn stored(&self) -> Option<Credential> {
        self.state.credential.lock().unwrap().clone()
    }
}

impl CredentialStore for MemoryStore {
    fn load(&self) -> Result<Option<Credential>, CredentialError> {
        if self.fail_loads {
            return Err(CredentialError::Malformed(
                serde_json::from_str::<Value>("{").unwrap_err(),
            ));
        }
        Ok(self.stored())
    }

    fn save(&self, credential: &Credential) -> Result<(), CredentialError> {
        self.state.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves {
            return Err(CredentialError::ReadOnly("memory".into()));
        }
        *self.state.credential.lock().unwrap() = Some(credential.clone());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".into()
    }
}

/// Refresher that hands out `refreshed-N` tokens valid for an hour.
#[derive(Clone, Default)]
pub struct CountingRefresher {
    calls: Arc<AtomicUsize>,
    fail: bool,
}

impl CountingRefresher {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TokenRefresher for CountingRefresher {
    fn refresh(&self, credential: &Credential) -> Result<Credential, CredentialError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        // Widen the race window for the concurrency test.
        std::thread::sleep(Duration::from_millis(20));
        if self.fail {
            return Err(CredentialError::RefreshFailed("invalid_grant".into()));
        }
        Ok(credential.refreshed(format!("refreshed-{n}"), Some(3600), None))
    }
}

/// Acquirer that hands out `acquired-N` tokens and remembers the client id
/// it was given.
#[derive(Clone, Default)]
pub struct CountingAcquirer {
    calls: Arc<AtomicUsize>,
    client_id: Arc<Mutex<Option<String>>>,
}

impl CountingAcquirer {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn client_id(&self) -> Option<String> {
        self.client_id.lock().unwrap().clone()
    }
}

impl CredentialAcquirer for CountingAcquirer {
    fn acquire(
        &self,
        scopes: &[String],
        secrets: Option<&ClientSecrets>,
    ) -> Result<Credential, CredentialError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        *self.client_id.lock().unwrap() = secrets.map(|s| s.client_id.clone());
        let mut credential = Credential::new(format!("acquired-{n}")).with_refresh_token("fresh");
        credential.scopes = scopes.to_vec();
        Ok(credential)
    }
}
