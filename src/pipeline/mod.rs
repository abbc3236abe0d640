//! The three-stage labeling pipeline.
//!
//! All work flows one direction through two topics:
//! 1. `receive_stage` — webhook in, one ProcessMessage out per event
//! 2. `process_stage` — fetch + classify, one SendMessage out
//! 3. `send_stage` — deliver the label text as a reply
//!
//! Stages are pure functions of their input message plus external service
//! responses. They hold no state across invocations, so redelivery of the
//! same message produces the same output.

pub mod process;
pub mod receive;
pub mod send;
#[cfg(test)]
pub(crate) mod testing;
pub mod types;

pub use process::process_stage;
pub use receive::receive_stage;
pub use send::send_stage;
pub use types::{InboundEvent, ProcessMessage, SendMessage, WebhookEnvelope};

use std::sync::Arc;

use crate::broker::Publisher;
use crate::line::{ImageFetcher, ReplySender};
use crate::secrets::SecretStore;
use crate::vision::Classifier;

/// The downstream collaborators a stage invocation needs, behind narrow
/// traits so tests can substitute doubles without network access.
#[derive(Clone)]
pub struct StageDeps {
    pub secrets: Arc<dyn SecretStore>,
    pub images: Arc<dyn ImageFetcher>,
    pub classifier: Arc<dyn Classifier>,
    pub replies: Arc<dyn ReplySender>,
    pub publisher: Arc<dyn Publisher>,
}
