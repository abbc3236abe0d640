//! ProcessStage — fetch, classify, hand off.

use crate::broker::{Publisher as _, PushEnvelope};
use crate::config::{CHANNEL_ACCESS_TOKEN_SECRET, PipelineConfig};
use crate::error::{BrokerError, PipelineError, Result};
use crate::pipeline::types::{ProcessMessage, SendMessage};
use crate::pipeline::StageDeps;

/// Handle one "to-process" delivery.
///
/// Each step is a failure point that aborts the invocation; the broker's
/// redelivery is the only retry path. No state is held across invocations,
/// so re-invoking with the same message produces the same SendMessage.
pub async fn process_stage(
    config: &PipelineConfig,
    deps: &StageDeps,
    envelope: &PushEnvelope,
) -> Result<()> {
    let payload = envelope.payload()?;
    let msg: ProcessMessage = serde_json::from_slice(&payload)
        .map_err(|e| PipelineError::MalformedPayload(e.to_string()))?;

    tracing::info!(
        message_id = %envelope.message.message_id,
        attempt = envelope.attempt(),
        image_id = %msg.image_id,
        "processing image"
    );

    let credential = deps
        .secrets
        .resolve(&config.project_id, CHANNEL_ACCESS_TOKEN_SECRET)
        .await?;
    let image = deps.images.fetch_image(&credential, &msg.image_id).await?;
    let labels = deps.classifier.classify(&image, config.max_labels).await?;

    tracing::info!(
        image_id = %msg.image_id,
        label_count = labels.len(),
        "image classified"
    );

    let send = SendMessage {
        reply_token: msg.reply_token,
        labels,
    };
    let payload = serde_json::to_vec(&send).map_err(|e| BrokerError::Encode(e.to_string()))?;
    let message_id = deps.publisher.publish(&config.send_topic, &payload).await?;
    tracing::info!(message_id = %message_id, "published send message");

    Ok(())
}

// ── Tests ───────────────────────────────────────────────────────────
