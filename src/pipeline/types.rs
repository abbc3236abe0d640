//! Message model for the pipeline's hand-off contracts.

use serde::{Deserialize, Serialize};

/// The webhook body posted by the messaging platform.
#[derive(Debug, Deserialize)]
pub struct WebhookEnvelope {
    #[serde(default)]
    pub events: Vec<InboundEvent>,
}

/// One event inside a webhook. Absent fields decode as empty strings; an
/// empty image id still produces a ProcessMessage and fails downstream at
/// the image fetch.
#[derive(Debug, Deserialize)]
pub struct InboundEvent {
    #[serde(rename = "replyToken", default)]
    pub reply_token: String,
    #[serde(default)]
    pub message: InboundMessage,
}

#[derive(Debug, Default, Deserialize)]
pub struct InboundMessage {
    #[serde(default)]
    pub id: String,
}

/// Payload on the "to-process" topic: which image to classify and where to
/// reply when done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessMessage {
    pub image_id: String,
    pub reply_token: String,
}

/// Payload on the "to-send" topic: the classified labels, in the
/// classifier's confidence order. May be empty, never null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessage {
    pub reply_token: String,
    pub labels: Vec<String>,
}

impl SendMessage {
    /// The reply text: labels joined with single newlines. Empty labels
    /// yield an empty string.
    pub fn reply_text(&self) -> String {
        self.labels.join("\n")
    }
}

// ── Tests ───────────────────────────────────────────────────────────
