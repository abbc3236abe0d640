//! Process-wide pipeline configuration.
//!
//! Built once in `main` from environment variables and passed by reference
//! into every stage invocation. Stage bodies never read the environment,
//! which keeps them deterministic under test.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Name of the secret holding the messaging channel's access token.
/// Fixed by the deployment contract, not configurable.
pub const CHANNEL_ACCESS_TOKEN_SECRET: &str = "channel-access-token";

/// Which broker backs the two hand-off topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerMode {
    /// Cloud Pub/Sub over REST; stages are invoked by push subscriptions.
    PubSub,
    /// In-process broker; published payloads are delivered to local
    /// consumer tasks. For development and integration tests.
    Memory,
}

/// Immutable configuration for one pipeline process.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Cloud project that scopes topics and secrets.
    pub project_id: String,
    /// Topic carrying ProcessMessages (receive → process).
    pub process_topic: String,
    /// Topic carrying SendMessages (process → send).
    pub send_topic: String,
    /// Maximum labels requested per classification.
    pub max_labels: u32,
    /// HTTP listen port.
    pub port: u16,
    /// Timeout applied to every outbound request.
    pub request_timeout: Duration,
    /// When set, push deliveries that fail permanently are acknowledged
    /// (dropped with a warning) instead of signalling redelivery.
    pub ack_permanent_failures: bool,
    /// Broker backend for topic hand-off.
    pub broker_mode: BrokerMode,
    /// Static Google API bearer token; when unset the metadata server is
    /// queried per call.
    pub gcp_access_token: Option<SecretString>,
    /// Base URL for the messaging platform's content-download API.
    pub line_content_api_base: String,
    /// Base URL for the messaging platform's reply API.
    pub line_api_base: String,
    /// Base URL for the Vision annotate API.
    pub vision_api_base: String,
    /// Base URL for the Secret Manager API.
    pub secrets_api_base: String,
    /// Base URL for the Pub/Sub API.
    pub pubsub_api_base: String,
    /// Base URL for the instance metadata server.
    pub metadata_api_base: String,
}

impl PipelineConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup. Tests pass a map
    /// here instead of mutating the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &str| -> Result<String, ConfigError> {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
        };
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.into());

        let max_labels: u32 = parse_value(&lookup, "MAX_LABELS", 10)?;
        let port: u16 = parse_value(&lookup, "PORT", 8080)?;
        let timeout_secs: u64 = parse_value(&lookup, "REQUEST_TIMEOUT_SECS", 10)?;

        let broker_mode = match or_default("BROKER", "pubsub").as_str() {
            "pubsub" => BrokerMode::PubSub,
            "memory" => BrokerMode::Memory,
            other => {
                return Err(ConfigError::InvalidValue {
                    key: "BROKER".into(),
                    message: format!("expected \"pubsub\" or \"memory\", got {other:?}"),
                });
            }
        };

        Ok(Self {
            project_id: required("PROJECT_ID")?,
            process_topic: required("WAIT_PROCESS_TOPIC")?,
            send_topic: required("WAIT_SEND_TOPIC")?,
            max_labels,
            port,
            request_timeout: Duration::from_secs(timeout_secs),
            ack_permanent_failures: or_default("ACK_PERMANENT_FAILURES", "false") == "true",
            broker_mode,
            gcp_access_token: lookup("GCP_ACCESS_TOKEN")
                .filter(|v| !v.is_empty())
                .map(SecretString::from),
            line_content_api_base: or_default("LINE_CONTENT_API_BASE", "https://api-data.line.me"),
            line_api_base: or_default("LINE_API_BASE", "https://api.line.me"),
            vision_api_base: or_default("VISION_API_BASE", "https://vision.googleapis.com"),
            secrets_api_base: or_default(
                "SECRETMANAGER_API_BASE",
                "https://secretmanager.googleapis.com",
            ),
            pubsub_api_base: or_default("PUBSUB_API_BASE", "https://pubsub.googleapis.com"),
            metadata_api_base: or_default("METADATA_API_BASE", "http://metadata.google.internal"),
        })
    }
}

fn parse_value<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.parse().map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{e}"),
        }),
        None => Ok(default),
    }
}

// ── Tests ───────────────────────────────────────────────────────────
