//! Client configuration
//!
//! Every path, scope and retry knob is an explicit field of [`ClientConfig`].
//! The only function that looks at the process environment is
//! [`ClientConfig::from_env`].

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::CallError;

/// Default location of the persisted credential
pub const DEFAULT_TOKEN_PATH: &str = "auth/token.json";
/// Default location of the OAuth client secrets
pub const DEFAULT_CLIENT_SECRETS_PATH: &str = "auth/cred.json";
/// Environment variable holding a serialized credential
pub const TOKEN_ENV: &str = "GOOGLE_SERVICE_TOKEN";
/// Environment variable holding serialized client secrets
pub const CLIENT_SECRETS_ENV: &str = "GOOGLE_SERVICE_CREDS";
/// Read/write access to spreadsheets
pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
pub const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com/";

/// Where the credential is loaded from (and, for files, persisted to).
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// JSON file on disk. Refreshed credentials are written back here.
    File(PathBuf),
    /// Serialized credential handed in directly
    Blob(String),
    /// Name of an environment variable holding a serialized credential
    Env(String),
}

impl Default for CredentialSource {
    fn default() -> Self {
        CredentialSource::File(PathBuf::from(DEFAULT_TOKEN_PATH))
    }
}

impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::File(path) => f.debug_tuple("File").field(path).finish(),
            CredentialSource::Blob(_) => f.write_str("Blob(<redacted>)"),
            CredentialSource::Env(var) => f.debug_tuple("Env").field(var).finish(),
        }
    }
}

/// Where OAuth client secrets (client id/secret) are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientSecretsSource {
    File(PathBuf),
    Env(String),
}

impl Default for ClientSecretsSource {
    fn default() -> Self {
        ClientSecretsSource::File(PathBuf::from(DEFAULT_CLIENT_SECRETS_PATH))
    }
}

/// Bounded exponential-backoff retry policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry. Doubles for every further retry.
    pub base_delay: Duration,
    /// Remote statuses considered temporary
    pub transient_statuses: Vec<u16>,
    /// Also retry failures that never reached the service
    pub retry_transport_errors: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            transient_statuses: vec![429, 500, 502, 503, 504],
            retry_transport_errors: false,
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_transport_retries(mut self, enabled: bool) -> Self {
        self.retry_transport_errors = enabled;
        self
    }

    /// Whether a failed attempt may succeed if repeated
    pub fn is_transient(&self, err: &CallError) -> bool {
        match err {
            CallError::Remote { status, .. } => self.transient_statuses.contains(status),
            CallError::Transport(_) => self.retry_transport_errors,
            CallError::Malformed(_) => false,
        }
    }

    /// Delay after the zero-based `attempt` failed: `base_delay * 2^attempt`
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

/// Configuration for [`SheetsClient`](crate::SheetsClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub credential_source: CredentialSource,
    /// Client secrets used when a credential lacks its own client id/secret
    pub client_secrets: Option<ClientSecretsSource>,
    pub scopes: Vec<String>,
    pub retry: RetryPolicy,
    /// API root; overridable for tests and proxies
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            credential_source: CredentialSource::default(),
            client_secrets: Some(ClientSecretsSource::default()),
            scopes: vec![SPREADSHEETS_SCOPE.to_string()],
            retry: RetryPolicy::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    /// Defaults, with env-var sources preferred when those variables are set.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env) but with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let is_set = |name: &str| lookup(name).is_some_and(|v| !v.trim().is_empty());

        let mut config = Self::default();
        if is_set(TOKEN_ENV) {
            config.credential_source = CredentialSource::Env(TOKEN_ENV.to_string());
        }
        if is_set(CLIENT_SECRETS_ENV) {
            config.client_secrets = Some(ClientSecretsSource::Env(CLIENT_SECRETS_ENV.to_string()));
        }
        config
    }

    pub fn with_credential_source(mut self, source: CredentialSource) -> Self {
        self.credential_source = source;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}
