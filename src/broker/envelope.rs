//! The broker's push-delivery envelope.
//!
//! Push subscriptions POST this wrapper to the stage endpoints: a
//! base64-encoded payload plus broker-assigned delivery metadata. The
//! metadata is logged on every invocation so an idempotency key can later
//! be derived from it without changing the stage contracts.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::BrokerError;

/// One push delivery from the broker.
#[derive(Debug, Clone, Deserialize)]
pub struct PushEnvelope {
    pub message: PushMessage,
    #[serde(default)]
    pub subscription: Option<String>,
    #[serde(rename = "deliveryAttempt", default)]
    pub delivery_attempt: Option<u32>,
}

/// The delivered message: payload plus broker metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct PushMessage {
    /// Base64-encoded payload bytes.
    #[serde(default)]
    pub data: String,
    #[serde(rename = "messageId", default)]
    pub message_id: String,
    #[serde(rename = "publishTime", default)]
    pub publish_time: Option<DateTime<Utc>>,
}

/// Parse a push request body into an envelope.
pub fn decode_push(body: &[u8]) -> Result<PushEnvelope, BrokerError> {
    serde_json::from_slice(body).map_err(|e| BrokerError::InvalidEnvelope(e.to_string()))
}

impl PushEnvelope {
    /// Decode the payload carried by this delivery.
    pub fn payload(&self) -> Result<Vec<u8>, BrokerError> {
        BASE64
            .decode(&self.message.data)
            .map_err(|e| BrokerError::InvalidEnvelope(format!("payload is not valid base64: {e}")))
    }

    /// Delivery attempt number; first delivery when the broker omits it.
    pub fn attempt(&self) -> u32 {
        self.delivery_attempt.unwrap_or(1)
    }

    /// Build an envelope for an in-process delivery.
    pub fn local(message_id: String, publish_time: DateTime<Utc>, payload: &[u8]) -> Self {
        Self {
            message: PushMessage {
                data: BASE64.encode(payload),
                message_id,
                publish_time: Some(publish_time),
            },
            subscription: None,
            delivery_attempt: None,
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────
