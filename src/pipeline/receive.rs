//! ReceiveStage — webhook entrypoint.

use crate::broker::Publisher as _;
use crate::config::PipelineConfig;
use crate::error::{BrokerError, PipelineError, Result};
use crate::pipeline::types::{ProcessMessage, WebhookEnvelope};
use crate::pipeline::StageDeps;

/// Handle one inbound webhook body.
///
/// Publishes one ProcessMessage per contained event, sequentially, and
/// returns the number published once every publish has been acknowledged.
/// The first failure aborts the batch: events already published stay
/// published, so a platform retry of the whole webhook re-publishes them
/// (accepted at-least-once duplication).
pub async fn receive_stage(
    config: &PipelineConfig,
    deps: &StageDeps,
    body: &[u8],
) -> Result<usize> {
    let webhook: WebhookEnvelope = serde_json::from_slice(body)
        .map_err(|e| PipelineError::MalformedWebhook(e.to_string()))?;

    tracing::info!(events = webhook.events.len(), "received webhook");

    let mut published = 0;
    for event in &webhook.events {
        let msg = ProcessMessage {
            image_id: event.message.id.clone(),
            reply_token: event.reply_token.clone(),
        };
        let payload =
            serde_json::to_vec(&msg).map_err(|e| BrokerError::Encode(e.to_string()))?;
        let message_id = deps
            .publisher
            .publish(&config.process_topic, &payload)
            .await?;
        tracing::info!(
            message_id = %message_id,
            image_id = %msg.image_id,
            "published process message"
        );
        published += 1;
    }

    Ok(published)
}

// ── Tests ───────────────────────────────────────────────────────────
