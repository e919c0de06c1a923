//! Blocking HTTP transport and OAuth refresh over `ureq`.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use sheetwire_protocol::{ApiErrorBody, ApiRequest};
use url::Url;

use crate::credential::{ClientSecrets, Credential, TokenRefresher};
use crate::error::{CallError, ClientError, CredentialError};
use crate::transport::Transport;

/// Sends requests to the values API over HTTPS.
pub struct HttpTransport {
    agent: ureq::Agent,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url).map_err(|e| ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "not a hierarchical URL".to_string(),
            });
        }

        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Ok(Self { agent, base_url })
    }

    /// Full URL for a request, with each path segment percent-encoded
    pub fn url_for(&self, request: &ApiRequest) -> Result<Url, CallError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CallError::Malformed("base URL cannot carry a path".into()))?
            .pop_if_empty()
            .extend(request.path_segments());

        let query = request.query();
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &ApiRequest, access_token: &str) -> Result<Value, CallError> {
        let url = self.url_for(request)?;
        tracing::trace!(method = request.method().as_str(), %url, "Sending request");

        let call = self
            .agent
            .request_url(request.method().as_str(), &url)
            .set("Authorization", &format!("Bearer {access_token}"));

        let result = match request.body()? {
            Some(body) => call.send_json(body),
            None => call.call(),
        };

        match result {
            Ok(response) => response
                .into_json::<Value>()
                .map_err(|e| CallError::Malformed(format!("unreadable response body: {e}"))),
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                Err(remote_error(status, &body))
            }
            Err(ureq::Error::Transport(transport)) => Err(CallError::Transport(transport.to_string())),
        }
    }
}

/// Build a [`CallError::Remote`] from a status and (possibly non-JSON) body
fn remote_error(status: u16, body: &str) -> CallError {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => CallError::Remote {
            status,
            message: parsed.error.message,
            reason: parsed.error.status,
            details: parsed.error.details,
        },
        Err(_) if body.trim().is_empty() => CallError::remote(status, format!("HTTP {status}")),
        Err(_) => CallError::remote(status, body.trim().to_string()),
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Refreshes access tokens with the OAuth `refresh_token` grant.
pub struct OAuthRefresher {
    agent: ureq::Agent,
    /// Fallback when the credential carries no client id/secret
    secrets: Option<ClientSecrets>,
}

impl OAuthRefresher {
    pub fn new(timeout: Duration, secrets: Option<ClientSecrets>) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            secrets,
        }
    }
}

impl TokenRefresher for OAuthRefresher {
    fn refresh(&self, credential: &Credential) -> Result<Credential, CredentialError> {
        let refresh_token = credential
            .refresh_token
            .as_deref()
            .ok_or_else(|| CredentialError::RefreshFailed("credential has no refresh token".into()))?;

        let client_id = credential
            .client_id
            .as_deref()
            .or(self.secrets.as_ref().map(|s| s.client_id.as_str()))
            .unwrap_or_default();
        let client_secret = credential
            .client_secret
            .as_deref()
            .or(self.secrets.as_ref().map(|s| s.client_secret.as_str()))
            .unwrap_or_default();

        let response = self.agent.post(&credential.token_uri).send_form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", client_id),
            ("client_secret", client_secret),
        ]);

        match response {
            Ok(response) => {
                let body: TokenResponse = response
                    .into_json()
                    .map_err(|e| CredentialError::RefreshFailed(format!("bad token response: {e}")))?;
                tracing::info!(expires_in = ?body.expires_in, "Access token refreshed");
                Ok(credential.refreshed(body.access_token, body.expires_in, body.refresh_token))
            }
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                Err(CredentialError::RefreshFailed(format!(
                    "token endpoint returned {status}: {}",
                    body.trim()
                )))
            }
            Err(ureq::Error::Transport(transport)) => {
                Err(CredentialError::RefreshFailed(transport.to_string()))
            }
        }
    }
}
