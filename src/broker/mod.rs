//! Publish-subscribe hand-off between pipeline stages.
//!
//! Topics are append-only channels: stages publish complete, self-describing
//! payloads and never read their own output. Two backends implement the
//! [`Publisher`] trait — Pub/Sub over REST for deployment, an in-process
//! broker for local runs and tests.

pub mod envelope;
pub mod memory;
pub mod pubsub;

pub use envelope::{PushEnvelope, PushMessage, decode_push};
pub use memory::{DeliveredMessage, MemoryBroker};
pub use pubsub::PubSubPublisher;

use async_trait::async_trait;

use crate::error::BrokerError;

/// Publishes a payload to a named topic.
///
/// Returns the broker-assigned message id once delivery has been durably
/// accepted; an error means the payload may not have been accepted and the
/// caller must treat the publish as failed.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<String, BrokerError>;
}
