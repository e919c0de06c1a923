//! Credential lifecycle: load, detect expiry, refresh or re-acquire, persist.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{ClientSecretsSource, CredentialSource};
use crate::error::CredentialError;
use crate::executor::TokenSource;

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Tokens are treated as expired this long before their stated expiry.
const EXPIRY_SKEW_SECS: i64 = 10;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// OAuth user credential, in the `authorized_user` JSON layout.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    /// Access token
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Absent means the token never expires
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            refresh_token: None,
            token_uri: default_token_uri(),
            client_id: None,
            client_secret: None,
            scopes: Vec::new(),
            expiry: None,
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    pub fn with_expiry(mut self, expiry: DateTime<Utc>) -> Self {
        self.expiry = Some(expiry);
        self
    }

    pub fn from_json(text: &str) -> Result<Self, CredentialError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, CredentialError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => now + Duration::seconds(EXPIRY_SKEW_SECS) >= expiry,
            None => false,
        }
    }

    /// Present, non-empty and not expired
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.token.is_empty() && !self.is_expired_at(now)
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Copy with a new access token. The refresh token is kept unless the
    /// token endpoint rotated it.
    pub fn refreshed(
        &self,
        token: impl Into<String>,
        expires_in_secs: Option<i64>,
        rotated_refresh_token: Option<String>,
    ) -> Self {
        Self {
            token: token.into(),
            refresh_token: rotated_refresh_token.or_else(|| self.refresh_token.clone()),
            expiry: expires_in_secs.map(|secs| Utc::now() + Duration::seconds(secs)),
            ..self.clone()
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("token_uri", &self.token_uri)
            .field("client_id", &self.client_id)
            .field("scopes", &self.scopes)
            .field("expiry", &self.expiry)
            .finish()
    }
}

/// OAuth client id and secret.
#[derive(Clone, PartialEq, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl fmt::Debug for ClientSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSecrets")
            .field("client_id", &self.client_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

/// Downloaded secrets files wrap the fields in `installed` or `web`.
#[derive(Deserialize)]
#[serde(untagged)]
enum SecretsFile {
    Installed { installed: ClientSecrets },
    Web { web: ClientSecrets },
    Bare(ClientSecrets),
}

impl ClientSecrets {
    pub fn from_json(text: &str) -> Result<Self, CredentialError> {
        Ok(match serde_json::from_str(text)? {
            SecretsFile::Installed { installed } => installed,
            SecretsFile::Web { web } => web,
            SecretsFile::Bare(secrets) => secrets,
        })
    }

    /// Load from the configured source. `Ok(None)` when nothing is there.
    pub fn load(source: &ClientSecretsSource) -> Result<Option<Self>, CredentialError> {
        let text = match source {
            ClientSecretsSource::File(path) => read_optional(path)?,
            ClientSecretsSource::Env(var) => std::env::var(var).ok(),
        };
        text.map(|t| Self::from_json(&t)).transpose()
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, CredentialError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Storage collaborator for credentials.
pub trait CredentialStore: Send + Sync {
    /// `Ok(None)` when the store holds nothing
    fn load(&self) -> Result<Option<Credential>, CredentialError>;

    fn save(&self, credential: &Credential) -> Result<(), CredentialError>;

    /// Short description for log lines
    fn describe(&self) -> String;
}

/// Exchanges a refresh token for a new access token.
pub trait TokenRefresher: Send + Sync {
    fn refresh(&self, credential: &Credential) -> Result<Credential, CredentialError>;
}

/// Full acquisition flow used when no refreshable credential exists.
///
/// Receives the requested scopes and the client secrets the session was
/// configured with, if any.
pub trait CredentialAcquirer: Send + Sync {
    fn acquire(
        &self,
        scopes: &[String],
        secrets: Option<&ClientSecrets>,
    ) -> Result<Credential, CredentialError>;
}

/// Credential stored as a JSON file.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<Credential>, CredentialError> {
        read_optional(&self.path)?
            .map(|text| Credential::from_json(&text))
            .transpose()
    }

    fn save(&self, credential: &Credential) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, credential.to_json()?)?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

/// Credential read from an environment variable. Cannot be written back.
#[derive(Debug, Clone)]
pub struct EnvCredentialStore {
    var: String,
}

impl EnvCredentialStore {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialStore for EnvCredentialStore {
    fn load(&self) -> Result<Option<Credential>, CredentialError> {
        match std::env::var(&self.var) {
            Ok(text) if !text.trim().is_empty() => Credential::from_json(&text).map(Some),
            _ => Ok(None),
        }
    }

    fn save(&self, _credential: &Credential) -> Result<(), CredentialError> {
        Err(CredentialError::ReadOnly(self.describe()))
    }

    fn describe(&self) -> String {
        format!("env ${}", self.var)
    }
}

/// Credential handed in as a serialized blob. Cannot be written back.
#[derive(Clone)]
pub struct BlobCredentialStore {
    blob: String,
}

impl BlobCredentialStore {
    pub fn new(blob: impl Into<String>) -> Self {
        Self { blob: blob.into() }
    }
}

impl CredentialStore for BlobCredentialStore {
    fn load(&self) -> Result<Option<Credential>, CredentialError> {
        Credential::from_json(&self.blob).map(Some)
    }

    fn save(&self, _credential: &Credential) -> Result<(), CredentialError> {
        Err(CredentialError::ReadOnly(self.describe()))
    }

    fn describe(&self) -> String {
        "injected blob".to_string()
    }
}

/// Store matching a configured source
pub fn store_for(source: &CredentialSource) -> Box<dyn CredentialStore> {
    match source {
        CredentialSource::File(path) => Box::new(FileCredentialStore::new(path)),
        CredentialSource::Blob(blob) => Box::new(BlobCredentialStore::new(blob.clone())),
        CredentialSource::Env(var) => Box::new(EnvCredentialStore::new(var.clone())),
    }
}

/// Acquirer for contexts with no interactive flow available.
#[derive(Debug, Clone, Default)]
pub struct NoAcquisition;

impl CredentialAcquirer for NoAcquisition {
    fn acquire(
        &self,
        _scopes: &[String],
        _secrets: Option<&ClientSecrets>,
    ) -> Result<Credential, CredentialError> {
        Err(CredentialError::AcquisitionFailed(
            "no usable credential and no authorization flow configured; \
             provide a token file or set the token environment variable"
                .to_string(),
        ))
    }
}

/// Observable lifecycle state of a [`CredentialSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Storage has not been consulted yet
    Unloaded,
    /// Storage held nothing usable
    Absent,
    Valid,
    Expired,
}

enum Slot {
    Unloaded,
    Loaded(Option<Credential>),
}

/// Owns a credential and keeps it valid.
///
/// The check-then-refresh-then-persist sequence runs under one lock, so a
/// session shared between threads refreshes at most once per expiry.
pub struct CredentialSession {
    store: Box<dyn CredentialStore>,
    refresher: Box<dyn TokenRefresher>,
    acquirer: Box<dyn CredentialAcquirer>,
    scopes: Vec<String>,
    secrets: Option<ClientSecrets>,
    slot: Mutex<Slot>,
}

impl CredentialSession {
    pub fn new(
        store: Box<dyn CredentialStore>,
        refresher: Box<dyn TokenRefresher>,
        acquirer: Box<dyn CredentialAcquirer>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            store,
            refresher,
            acquirer,
            scopes,
            secrets: None,
            slot: Mutex::new(Slot::Unloaded),
        }
    }

    /// Client secrets handed to the acquisition flow
    pub fn with_client_secrets(mut self, secrets: Option<ClientSecrets>) -> Self {
        self.secrets = secrets;
        self
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> SessionState {
        match &*self.lock() {
            Slot::Unloaded => SessionState::Unloaded,
            Slot::Loaded(None) => SessionState::Absent,
            Slot::Loaded(Some(c)) if c.is_valid_at(Utc::now()) => SessionState::Valid,
            Slot::Loaded(Some(_)) => SessionState::Expired,
        }
    }

    /// Snapshot of the current credential, if one is loaded
    pub fn credential(&self) -> Option<Credential> {
        match &*self.lock() {
            Slot::Loaded(credential) => credential.clone(),
            Slot::Unloaded => None,
        }
    }

    /// Make sure a valid credential is held and return its access token.
    ///
    /// No-op when already valid. An expired credential with a refresh token is
    /// refreshed; otherwise the acquisition flow runs. Either way the new
    /// credential is persisted on a best-effort basis.
    pub fn ensure_valid(&self) -> Result<String, CredentialError> {
        let mut slot = self.lock();

        if let Slot::Unloaded = *slot {
            let loaded = match self.store.load() {
                Ok(credential) => credential,
                Err(err) => {
                    tracing::warn!(
                        source = %self.store.describe(),
                        "Ignoring unreadable credential: {err}"
                    );
                    None
                }
            };
            *slot = Slot::Loaded(loaded);
        }

        let current = match &*slot {
            Slot::Loaded(credential) => credential.as_ref(),
            Slot::Unloaded => None,
        };

        let fresh = match current {
            Some(credential) if credential.is_valid_at(Utc::now()) => {
                return Ok(credential.token.clone());
            }
            Some(credential) if credential.can_refresh() => {
                tracing::info!("Access token expired, refreshing");
                self.refresher.refresh(credential)?
            }
            _ => {
                tracing::info!("No refreshable credential, running acquisition flow");
                self.acquirer.acquire(&self.scopes, self.secrets.as_ref())?
            }
        };

        self.persist(&fresh);
        let token = fresh.token.clone();
        *slot = Slot::Loaded(Some(fresh));
        Ok(token)
    }

    fn persist(&self, credential: &Credential) {
        match self.store.save(credential) {
            Ok(()) => tracing::debug!(store = %self.store.describe(), "Persisted credential"),
            Err(err) => tracing::warn!(
                store = %self.store.describe(),
                "Could not persist credential, continuing in memory: {err}"
            ),
        }
    }
}

impl TokenSource for CredentialSession {
    fn access_token(&self) -> Result<String, CredentialError> {
        self.ensure_valid()
    }
}
