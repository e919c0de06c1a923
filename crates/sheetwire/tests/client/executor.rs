//! Retry and classification behaviour of the executor.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use sheetwire::{
    CallError, CredentialError, ErrorKind, ResilientExecutor, RetryPolicy, TokenSource,
};

use crate::common::*;

#[test]
fn succeeds_after_two_transient_failures() {
    let (executor, sleeper) = executor_with(RetryPolicy::default());
    let call = ScriptedCall::new(vec![
        Err(transient(503)),
        Err(transient(429)),
        Ok(json!({"values": [[1]]})),
    ]);

    let envelope = executor.execute(&call);

    assert!(envelope.ok);
    assert_eq!(envelope.data, Some(json!({"values": [[1]]})));
    assert_eq!(call.calls(), 3);
    assert_eq!(
        sleeper.delays(),
        vec![Duration::from_secs(1), Duration::from_secs(2)]
    );
}

#[test]
fn permanent_failure_is_not_retried() {
    let (executor, sleeper) = executor_with(RetryPolicy::default());
    let call = ScriptedCall::always(Err(CallError::Remote {
        status: 404,
        message: "Requested entity was not found.".into(),
        reason: Some("NOT_FOUND".into()),
        details: None,
    }));

    let envelope = executor.execute(&call);

    assert!(!envelope.ok);
    assert_eq!(call.calls(), 1);
    assert!(sleeper.delays().is_empty());

    let error = envelope.error.unwrap();
    assert_eq!(error.kind, ErrorKind::PermanentRemote);
    assert_eq!(error.code, Some(404));
    assert_eq!(error.reason.as_deref(), Some("NOT_FOUND"));
    assert_eq!(error.operation.as_deref(), Some("scripted"));
}

#[test]
fn always_transient_exhausts_the_budget() {
    let (executor, sleeper) = executor_with(RetryPolicy::default());
    let call = ScriptedCall::always(Err(transient(503)));

    let envelope = executor.execute(&call);

    assert!(!envelope.ok);
    assert!(envelope.data.is_none());
    assert_eq!(call.calls(), 3);
    assert_eq!(
        sleeper.delays(),
        vec![Duration::from_secs(1), Duration::from_secs(2)]
    );

    let error = envelope.error.unwrap();
    assert_eq!(error.kind, ErrorKind::TransientRemote);
    assert_eq!(error.code, Some(503));
}

#[test]
fn explicit_attempt_budget_grows_delays_exponentially() {
    let (executor, sleeper) = executor_with(RetryPolicy::default());
    let call = ScriptedCall::always(Err(transient(500)));

    let envelope = executor.execute_with(&call, 5);

    assert!(!envelope.ok);
    assert_eq!(call.calls(), 5);
    assert_eq!(
        sleeper.delays(),
        [1, 2, 4, 8].map(Duration::from_secs).to_vec()
    );
}

#[test]
fn zero_attempt_budget_still_tries_once() {
    let (executor, _sleeper) = executor_with(RetryPolicy::default());
    let call = ScriptedCall::always(Ok(json!({})));

    assert!(executor.execute_with(&call, 0).ok);
    assert_eq!(call.calls(), 1);
}

#[test]
fn unexpected_errors_get_generic_classification() {
    let (executor, sleeper) = executor_with(RetryPolicy::default());
    let call = ScriptedCall::always(Err(CallError::Malformed("expected value at line 1".into())));

    let envelope = executor.execute(&call);

    assert_eq!(call.calls(), 1);
    assert!(sleeper.delays().is_empty());
    let error = envelope.error.unwrap();
    assert_eq!(error.kind, ErrorKind::Internal);
    assert_eq!(error.code, None);
}

#[test]
fn transport_errors_only_retried_when_enabled() {
    let (executor, _sleeper) = executor_with(RetryPolicy::default());
    let call = ScriptedCall::always(Err(CallError::Transport("connection reset".into())));
    let envelope = executor.execute(&call);
    assert_eq!(call.calls(), 1);
    assert_eq!(envelope.error.unwrap().kind, ErrorKind::Internal);

    let (executor, sleeper) = executor_with(
        RetryPolicy::default()
            .with_transport_retries(true)
            .with_base_delay(Duration::from_millis(10)),
    );
    let call = ScriptedCall::new(vec![
        Err(CallError::Transport("connection reset".into())),
        Ok(json!({"ok": true})),
    ]);
    assert!(executor.execute(&call).ok);
    assert_eq!(call.calls(), 2);
    assert_eq!(sleeper.delays(), vec![Duration::from_millis(10)]);
}

struct NoToken;

impl TokenSource for NoToken {
    fn access_token(&self) -> Result<String, CredentialError> {
        Err(CredentialError::RefreshFailed("invalid_grant".into()))
    }
}

#[test]
fn credential_failure_stops_before_any_call() {
    let executor = ResilientExecutor::new(Arc::new(NoToken), RetryPolicy::default());
    let call = ScriptedCall::always(Ok(json!({})));

    let envelope = executor.execute(&call);

    assert!(!envelope.ok);
    assert_eq!(call.calls(), 0);
    let error = envelope.error.unwrap();
    assert_eq!(error.kind, ErrorKind::Credential);
    assert_eq!(error.message, "Token refresh failed: invalid_grant");
}
