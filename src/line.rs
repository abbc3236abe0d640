//! LINE Messaging API client — image content download and text replies.
//!
//! Two bearer-authenticated endpoints on separate hosts: the content API
//! serves attachment bytes, the reply API accepts one reply per reply
//! token. Neither call retries; non-2xx statuses surface to the caller.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::error::ChannelError;

/// Downloads attachment bytes from the messaging platform.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch_image(
        &self,
        credential: &SecretString,
        image_id: &str,
    ) -> Result<Vec<u8>, ChannelError>;
}

/// Posts a textual reply addressed by a reply token.
#[async_trait]
pub trait ReplySender: Send + Sync {
    async fn send_reply(
        &self,
        credential: &SecretString,
        reply_token: &str,
        text: &str,
    ) -> Result<(), ChannelError>;
}

/// LINE Messaging API client. Implements both sides of the conversation:
/// fetching the inbound image and pushing the outbound reply.
pub struct LineClient {
    client: reqwest::Client,
    api_base: String,
    content_api_base: String,
}

#[derive(Debug, Serialize)]
struct ReplyRequest<'a> {
    #[serde(rename = "replyToken")]
    reply_token: &'a str,
    messages: Vec<ReplyMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ReplyMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

impl LineClient {
    pub fn new(client: reqwest::Client, api_base: String, content_api_base: String) -> Self {
        Self {
            client,
            api_base,
            content_api_base,
        }
    }

    fn content_url(&self, image_id: &str) -> String {
        format!("{}/v2/bot/message/{}/content", self.content_api_base, image_id)
    }

    fn reply_url(&self) -> String {
        format!("{}/v2/bot/message/reply", self.api_base)
    }
}

#[async_trait]
impl ImageFetcher for LineClient {
    async fn fetch_image(
        &self,
        credential: &SecretString,
        image_id: &str,
    ) -> Result<Vec<u8>, ChannelError> {
        let resp = self
            .client
            .get(self.content_url(image_id))
            .bearer_auth(credential.expose_secret())
            .send()
            .await
            .map_err(|e| ChannelError::FetchTransport {
                image_id: image_id.to_string(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ChannelError::FetchStatus {
                image_id: image_id.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let bytes = resp.bytes().await.map_err(|e| ChannelError::FetchTransport {
            image_id: image_id.to_string(),
            reason: e.to_string(),
        })?;
        tracing::debug!(image_id, size = bytes.len(), "downloaded image content");
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ReplySender for LineClient {
    async fn send_reply(
        &self,
        credential: &SecretString,
        reply_token: &str,
        text: &str,
    ) -> Result<(), ChannelError> {
        let body = ReplyRequest {
            reply_token,
            messages: vec![ReplyMessage { kind: "text", text }],
        };

        let resp = self
            .client
            .post(self.reply_url())
            .bearer_auth(credential.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| ChannelError::ReplyTransport {
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ChannelError::ReplyStatus {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(text_len = text.len(), "sent reply");
        Ok(())
    }
}

// ── Tests ───────────────────────────────────────────────────────────
