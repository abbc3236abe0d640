//! SendStage — deliver the classified labels as a reply.

use crate::broker::PushEnvelope;
use crate::config::{CHANNEL_ACCESS_TOKEN_SECRET, PipelineConfig};
use crate::error::{PipelineError, Result};
use crate::pipeline::types::SendMessage;
use crate::pipeline::StageDeps;

/// Handle one "to-send" delivery.
///
/// The reply text is the labels joined with newlines; an empty label list
/// yields an empty reply, which is still sent (preserved upstream
/// behavior). Any failure surfaces as an invocation error, triggering
/// broker redelivery.
pub async fn send_stage(
    config: &PipelineConfig,
    deps: &StageDeps,
    envelope: &PushEnvelope,
) -> Result<()> {
    let payload = envelope.payload()?;
    let msg: SendMessage = serde_json::from_slice(&payload)
        .map_err(|e| PipelineError::MalformedPayload(e.to_string()))?;

    tracing::info!(
        message_id = %envelope.message.message_id,
        attempt = envelope.attempt(),
        label_count = msg.labels.len(),
        "sending reply"
    );

    let text = msg.reply_text();
    let credential = deps
        .secrets
        .resolve(&config.project_id, CHANNEL_ACCESS_TOKEN_SECRET)
        .await?;
    deps.replies
        .send_reply(&credential, &msg.reply_token, &text)
        .await?;

    tracing::info!("reply sent");
    Ok(())
}

// ── Tests ───────────────────────────────────────────────────────────
