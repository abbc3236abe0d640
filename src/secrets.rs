//! Credential resolution from Secret Manager.
//!
//! Always resolves `versions/latest` and never caches: every stage
//! invocation sees the store's current value, so token rotation needs no
//! process restart. Resolved values are wrapped in [`SecretString`] so a
//! stray `Debug` format cannot leak them into logs.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use secrecy::SecretString;
use serde::Deserialize;

use crate::error::SecretError;
use crate::gcp::GcpTokenSource;

/// Fetches named credentials from a secret store.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Resolve the current value of `name` within `project_id`.
    async fn resolve(&self, project_id: &str, name: &str) -> Result<SecretString, SecretError>;
}

/// Secret Manager REST client.
pub struct SecretManagerClient {
    client: reqwest::Client,
    api_base: String,
    tokens: Arc<GcpTokenSource>,
}

#[derive(Debug, Deserialize)]
struct AccessSecretVersionResponse {
    payload: SecretPayload,
}

#[derive(Debug, Deserialize)]
struct SecretPayload {
    #[serde(default)]
    data: String,
}

impl SecretManagerClient {
    pub fn new(client: reqwest::Client, api_base: String, tokens: Arc<GcpTokenSource>) -> Self {
        Self {
            client,
            api_base,
            tokens,
        }
    }

    fn access_url(&self, project_id: &str, name: &str) -> String {
        format!(
            "{}/v1/projects/{}/secrets/{}/versions/latest:access",
            self.api_base, project_id, name
        )
    }
}

#[async_trait]
impl SecretStore for SecretManagerClient {
    async fn resolve(&self, project_id: &str, name: &str) -> Result<SecretString, SecretError> {
        let token = self.tokens.access_token().await?;

        let resp = self
            .client
            .get(self.access_url(project_id, name))
            .bearer_auth(secrecy::ExposeSecret::expose_secret(&token))
            .send()
            .await
            .map_err(|e| SecretError::Transport {
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SecretError::Status {
                name: name.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let body: AccessSecretVersionResponse =
            resp.json().await.map_err(|e| SecretError::InvalidPayload {
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        let raw = BASE64
            .decode(&body.payload.data)
            .map_err(|e| SecretError::InvalidPayload {
                name: name.to_string(),
                reason: format!("payload is not valid base64: {e}"),
            })?;
        let value = String::from_utf8(raw).map_err(|e| SecretError::InvalidPayload {
            name: name.to_string(),
            reason: format!("payload is not valid UTF-8: {e}"),
        })?;

        tracing::debug!(secret = name, "resolved secret version");
        Ok(SecretString::from(value))
    }
}

// ── Tests ───────────────────────────────────────────────────────────
