//! Credential pre-flight plus bounded exponential-backoff retries.
//!
//! [`ResilientExecutor::execute`] never panics and never returns a bare
//! error: every outcome is folded into an [`Envelope`].

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use sheetwire_core::{Envelope, ErrorInfo, ErrorKind};

use crate::config::RetryPolicy;
use crate::error::{CallError, CredentialError};

/// A prepared remote call. The executor only invokes it and inspects the
/// error classification.
pub trait RemoteCall {
    /// Name used in logs and error info
    fn operation(&self) -> &str;

    fn execute(&self, access_token: &str) -> Result<Value, CallError>;
}

/// Something that can hand out a currently valid access token.
pub trait TokenSource: Send + Sync {
    fn access_token(&self) -> Result<String, CredentialError>;
}

/// Fixed access token, for callers that manage credentials themselves.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl TokenSource for StaticToken {
    fn access_token(&self) -> Result<String, CredentialError> {
        Ok(self.0.clone())
    }
}

/// Blocking pause between attempts.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, delay: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, delay: Duration) {
        std::thread::sleep(delay);
    }
}

/// Runs remote calls with a credential check and retries.
#[derive(Clone)]
pub struct ResilientExecutor {
    tokens: Arc<dyn TokenSource>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl ResilientExecutor {
    pub fn new(tokens: Arc<dyn TokenSource>, policy: RetryPolicy) -> Self {
        Self {
            tokens,
            policy,
            sleeper: Arc::new(ThreadSleeper),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute with the policy's attempt budget
    pub fn execute(&self, call: &dyn RemoteCall) -> Envelope<Value> {
        self.execute_with(call, self.policy.max_attempts)
    }

    /// Execute with an explicit attempt budget (at least one attempt is made)
    pub fn execute_with(&self, call: &dyn RemoteCall, max_attempts: u32) -> Envelope<Value> {
        let operation = call.operation().to_string();

        let token = match self.tokens.access_token() {
            Ok(token) => token,
            Err(err) => {
                tracing::warn!(operation = %operation, "Credential unavailable: {err}");
                return Envelope::failure(
                    ErrorInfo::new(ErrorKind::Credential, err.to_string())
                        .with_operation(operation),
                );
            }
        };

        let max_attempts = max_attempts.max(1);
        let mut attempt = 0;
        loop {
            match call.execute(&token) {
                Ok(payload) => {
                    tracing::debug!(operation = %operation, attempt, "Remote call succeeded");
                    return Envelope::success(payload);
                }
                Err(err) => {
                    let transient = self.policy.is_transient(&err);
                    attempt += 1;

                    if !transient || attempt >= max_attempts {
                        tracing::debug!(operation = %operation, attempt, "Remote call failed: {err}");
                        return Envelope::failure(classify(err, transient).with_operation(operation));
                    }

                    let delay = self.policy.backoff(attempt - 1);
                    tracing::warn!(
                        operation = %operation,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Transient failure, retrying: {err}"
                    );
                    self.sleeper.sleep(delay);
                }
            }
        }
    }
}

/// Map a final call error onto the envelope taxonomy
fn classify(err: CallError, transient: bool) -> ErrorInfo {
    match err {
        CallError::Remote {
            status,
            message,
            reason,
            details,
        } => {
            let kind = if transient {
                ErrorKind::TransientRemote
            } else {
                ErrorKind::PermanentRemote
            };
            let mut info = ErrorInfo::new(kind, message).with_code(status);
            if let Some(reason) = reason {
                info = info.with_reason(reason);
            }
            if let Some(details) = details {
                info = info.with_details(details);
            }
            info
        }
        CallError::Transport(message) if transient => {
            ErrorInfo::new(ErrorKind::TransientRemote, message).with_reason("transport")
        }
        other => ErrorInfo::internal(format!("Unexpected error: {other}"))
            .with_details(json!({ "cause": other.to_string() })),
    }
}
