//! In-process broker for local runs and integration tests.
//!
//! Delivers each published payload to every subscriber of the topic,
//! synthesizing the delivery metadata a real broker would assign. Best
//! effort only: no redelivery, no persistence, at-most-once to each
//! subscriber.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

use super::Publisher;
use crate::error::BrokerError;

/// One delivery handed to a subscriber.
#[derive(Debug, Clone)]
pub struct DeliveredMessage {
    pub message_id: String,
    pub publish_time: DateTime<Utc>,
    pub payload: Vec<u8>,
}

#[derive(Default)]
pub struct MemoryBroker {
    topics: Mutex<HashMap<String, Vec<mpsc::UnboundedSender<DeliveredMessage>>>>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber for a topic. Every message published to the
    /// topic after this call is delivered to the returned receiver.
    pub fn subscribe(&self, topic: &str) -> mpsc::UnboundedReceiver<DeliveredMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.topics
            .lock()
            .expect("broker lock poisoned")
            .entry(topic.to_string())
            .or_default()
            .push(tx);
        rx
    }
}

#[async_trait]
impl Publisher for MemoryBroker {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<String, BrokerError> {
        let message_id = Uuid::new_v4().to_string();
        let delivery = DeliveredMessage {
            message_id: message_id.clone(),
            publish_time: Utc::now(),
            payload: payload.to_vec(),
        };

        let mut topics = self.topics.lock().expect("broker lock poisoned");
        if let Some(subscribers) = topics.get_mut(topic) {
            // Drop subscribers whose receiver has gone away.
            subscribers.retain(|tx| tx.send(delivery.clone()).is_ok());
        }
        tracing::debug!(topic, message_id = %message_id, "published to memory broker");
        Ok(message_id)
    }
}

// ── Tests ───────────────────────────────────────────────────────────
