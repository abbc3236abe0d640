//! Bearer-token acquisition for Google REST APIs.
//!
//! On a managed runtime the instance metadata server hands out short-lived
//! service-account tokens. A static token from configuration short-circuits
//! the metadata call for local runs. Tokens are fetched per call and never
//! cached, matching the rest of the pipeline's fetch-fresh credential policy.

use secrecy::SecretString;
use serde::Deserialize;

use crate::config::PipelineConfig;
use crate::error::GcpAuthError;

/// Source of Google API bearer tokens.
pub struct GcpTokenSource {
    client: reqwest::Client,
    metadata_base: String,
    static_token: Option<SecretString>,
}

#[derive(Debug, Deserialize)]
struct MetadataTokenResponse {
    #[serde(default)]
    access_token: String,
}

impl GcpTokenSource {
    pub fn new(client: reqwest::Client, config: &PipelineConfig) -> Self {
        Self {
            client,
            metadata_base: config.metadata_api_base.clone(),
            static_token: config.gcp_access_token.clone(),
        }
    }

    /// Fetch a bearer token for the default service account.
    pub async fn access_token(&self) -> Result<SecretString, GcpAuthError> {
        if let Some(token) = &self.static_token {
            return Ok(token.clone());
        }

        let url = format!(
            "{}/computeMetadata/v1/instance/service-accounts/default/token",
            self.metadata_base
        );
        let resp = self
            .client
            .get(&url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| GcpAuthError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GcpAuthError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let token: MetadataTokenResponse = resp
            .json()
            .await
            .map_err(|e| GcpAuthError::InvalidResponse(e.to_string()))?;
        if token.access_token.is_empty() {
            return Err(GcpAuthError::InvalidResponse(
                "missing access_token".into(),
            ));
        }
        Ok(SecretString::from(token.access_token))
    }
}

// ── Tests ───────────────────────────────────────────────────────────
