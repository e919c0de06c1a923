//! Credential session state machine.

use std::sync::Arc;
use std::thread;

use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use sheetwire::{
    ClientSecrets, Credential, CredentialError, CredentialSession, CredentialStore, ErrorKind,
    FileCredentialStore, ResilientExecutor, RetryPolicy, SessionState,
};

use crate::common::*;

fn valid() -> Credential {
    Credential::new("live").with_expiry(Utc::now() + Duration::hours(1))
}

fn expired() -> Credential {
    Credential::new("stale").with_expiry(Utc::now() - Duration::minutes(5))
}

fn session(
    store: &MemoryStore,
    refresher: &CountingRefresher,
    acquirer: &CountingAcquirer,
) -> CredentialSession {
    CredentialSession::new(
        Box::new(store.clone()),
        Box::new(refresher.clone()),
        Box::new(acquirer.clone()),
        vec!["scope-a".into()],
    )
}

#[test]
fn valid_credential_needs_no_refresh() {
    let store = MemoryStore::holding(valid());
    let refresher = CountingRefresher::default();
    let acquirer = CountingAcquirer::default();
    let session = session(&store, &refresher, &acquirer);

    assert_eq!(session.state(), SessionState::Unloaded);
    assert_eq!(session.ensure_valid().unwrap(), "live");
    assert_eq!(session.ensure_valid().unwrap(), "live");

    assert_eq!(session.state(), SessionState::Valid);
    assert_eq!(refresher.calls(), 0);
    assert_eq!(acquirer.calls(), 0);
    assert_eq!(store.saves(), 0);
}

#[test]
fn expired_credential_is_refreshed_and_persisted_once() {
    let store = MemoryStore::holding(expired().with_refresh_token("r"));
    let refresher = CountingRefresher::default();
    let acquirer = CountingAcquirer::default();
    let session = session(&store, &refresher, &acquirer);

    assert_eq!(session.ensure_valid().unwrap(), "refreshed-1");
    assert_eq!(session.ensure_valid().unwrap(), "refreshed-1");

    assert_eq!(refresher.calls(), 1);
    assert_eq!(store.saves(), 1);
    assert_eq!(acquirer.calls(), 0);

    let stored = store.stored().unwrap();
    assert_eq!(stored.token, "refreshed-1");
    assert_eq!(stored.refresh_token.as_deref(), Some("r"));
}

#[test]
fn expired_credential_without_refresh_token_is_reacquired() {
    let store = MemoryStore::holding(expired());
    let refresher = CountingRefresher::default();
    let acquirer = CountingAcquirer::default();
    let session = session(&store, &refresher, &acquirer);

    assert_eq!(session.state(), SessionState::Unloaded);
    assert_eq!(session.ensure_valid().unwrap(), "acquired-1");

    assert_eq!(refresher.calls(), 0);
    assert_eq!(acquirer.calls(), 1);
    assert_eq!(store.saves(), 1);
    assert_eq!(store.stored().unwrap().scopes, vec!["scope-a".to_string()]);
}

#[test]
fn absent_credential_is_acquired() {
    let store = MemoryStore::default();
    let refresher = CountingRefresher::default();
    let acquirer = CountingAcquirer::default();
    let session = session(&store, &refresher, &acquirer);

    assert_eq!(session.ensure_valid().unwrap(), "acquired-1");
    assert_eq!(acquirer.calls(), 1);
    assert_eq!(session.state(), SessionState::Valid);
}

#[test]
fn acquisition_receives_configured_client_secrets() {
    let store = MemoryStore::default();
    let refresher = CountingRefresher::default();
    let acquirer = CountingAcquirer::default();
    let secrets = ClientSecrets::from_json(
        r#"{"installed": {"client_id": "app.example", "client_secret": "s3cret"}}"#,
    )
    .unwrap();
    let session = session(&store, &refresher, &acquirer).with_client_secrets(Some(secrets));

    assert_eq!(session.ensure_valid().unwrap(), "acquired-1");
    assert_eq!(acquirer.client_id().as_deref(), Some("app.example"));
}

#[test]
fn acquisition_without_client_secrets_gets_none() {
    let store = MemoryStore::default();
    let refresher = CountingRefresher::default();
    let acquirer = CountingAcquirer::default();
    let session = session(&store, &refresher, &acquirer);

    assert_eq!(session.ensure_valid().unwrap(), "acquired-1");
    assert_eq!(acquirer.calls(), 1);
    assert_eq!(acquirer.client_id(), None);
}

#[test]
fn unreadable_credential_is_treated_as_absent() {
    let store = MemoryStore::default().failing_loads();
    let refresher = CountingRefresher::default();
    let acquirer = CountingAcquirer::default();
    let session = session(&store, &refresher, &acquirer);

    assert_eq!(session.ensure_valid().unwrap(), "acquired-1");
    assert_eq!(acquirer.calls(), 1);
}

#[test]
fn persist_failure_is_not_fatal() {
    let store = MemoryStore::holding(expired().with_refresh_token("r")).failing_saves();
    let refresher = CountingRefresher::default();
    let acquirer = CountingAcquirer::default();
    let session = session(&store, &refresher, &acquirer);

    assert_eq!(session.ensure_valid().unwrap(), "refreshed-1");
    assert_eq!(store.saves(), 1);
    assert_eq!(session.credential().unwrap().token, "refreshed-1");
}

#[test]
fn refresh_failure_surfaces_without_acquisition() {
    let store = MemoryStore::holding(expired().with_refresh_token("revoked"));
    let refresher = CountingRefresher::failing();
    let acquirer = CountingAcquirer::default();
    let session = session(&store, &refresher, &acquirer);

    assert!(matches!(
        session.ensure_valid(),
        Err(CredentialError::RefreshFailed(_))
    ));
    assert_eq!(acquirer.calls(), 0);
    assert_eq!(store.saves(), 0);
    assert_eq!(session.state(), SessionState::Expired);
}

#[test]
fn concurrent_callers_refresh_once() {
    let store = MemoryStore::holding(expired().with_refresh_token("r"));
    let refresher = CountingRefresher::default();
    let acquirer = CountingAcquirer::default();
    let session = Arc::new(session(&store, &refresher, &acquirer));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let session = Arc::clone(&session);
            thread::spawn(move || session.ensure_valid().unwrap())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), "refreshed-1");
    }
    assert_eq!(refresher.calls(), 1);
    assert_eq!(store.saves(), 1);
}

#[test]
fn refreshed_credential_is_written_back_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("auth").join("token.json");
    let file_store = FileCredentialStore::new(&path);
    file_store
        .save(&expired().with_refresh_token("r"))
        .unwrap();

    let refresher = CountingRefresher::default();
    let session = CredentialSession::new(
        Box::new(file_store.clone()),
        Box::new(refresher.clone()),
        Box::new(CountingAcquirer::default()),
        Vec::new(),
    );

    assert_eq!(session.ensure_valid().unwrap(), "refreshed-1");
    let on_disk = file_store.load().unwrap().unwrap();
    assert_eq!(on_disk.token, "refreshed-1");
    assert_eq!(on_disk.refresh_token.as_deref(), Some("r"));
    assert!(on_disk.expiry.unwrap() > Utc::now());
}

#[test]
fn executor_surfaces_credential_errors() {
    let store = MemoryStore::default();
    let session = CredentialSession::new(
        Box::new(store),
        Box::new(CountingRefresher::default()),
        Box::new(sheetwire::NoAcquisition),
        Vec::new(),
    );
    let executor = ResilientExecutor::new(Arc::new(session), RetryPolicy::default());
    let call = ScriptedCall::always(Ok(json!({})));

    let envelope = executor.execute(&call);

    assert_eq!(call.calls(), 0);
    assert_eq!(envelope.error.unwrap().kind, ErrorKind::Credential);
}
