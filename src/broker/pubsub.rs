//! Pub/Sub REST publisher.
//!
//! One `topics/{topic}:publish` call per message. The returned message id
//! is the durable-acceptance acknowledgment; a missing id is treated as a
//! failed publish even on a 2xx status.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use super::Publisher;
use crate::error::BrokerError;
use crate::gcp::GcpTokenSource;

pub struct PubSubPublisher {
    client: reqwest::Client,
    api_base: String,
    project_id: String,
    tokens: Arc<GcpTokenSource>,
}

#[derive(Debug, Serialize)]
struct PublishRequest {
    messages: Vec<OutboundMessage>,
}

#[derive(Debug, Serialize)]
struct OutboundMessage {
    data: String,
}

#[derive(Debug, Deserialize)]
struct PublishResponse {
    #[serde(rename = "messageIds", default)]
    message_ids: Vec<String>,
}

impl PubSubPublisher {
    pub fn new(
        client: reqwest::Client,
        api_base: String,
        project_id: String,
        tokens: Arc<GcpTokenSource>,
    ) -> Self {
        Self {
            client,
            api_base,
            project_id,
            tokens,
        }
    }

    fn publish_url(&self, topic: &str) -> String {
        format!(
            "{}/v1/projects/{}/topics/{}:publish",
            self.api_base, self.project_id, topic
        )
    }
}

#[async_trait]
impl Publisher for PubSubPublisher {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<String, BrokerError> {
        let token = self.tokens.access_token().await?;

        let body = PublishRequest {
            messages: vec![OutboundMessage {
                data: BASE64.encode(payload),
            }],
        };

        let resp = self
            .client
            .post(self.publish_url(topic))
            .bearer_auth(secrecy::ExposeSecret::expose_secret(&token))
            .json(&body)
            .send()
            .await
            .map_err(|e| BrokerError::PublishTransport {
                topic: topic.to_string(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BrokerError::PublishStatus {
                topic: topic.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let ack: PublishResponse = resp.json().await.map_err(|e| BrokerError::InvalidAck {
            topic: topic.to_string(),
            reason: e.to_string(),
        })?;
        ack.message_ids
            .into_iter()
            .next()
            .ok_or_else(|| BrokerError::InvalidAck {
                topic: topic.to_string(),
                reason: "response contained no message ids".into(),
            })
    }
}

// ── Tests ───────────────────────────────────────────────────────────
