//! Test doubles for the stage dependency traits.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::broker::Publisher;
use crate::config::PipelineConfig;
use crate::error::{BrokerError, ChannelError, ClassifyError, SecretError};
use crate::line::{ImageFetcher, ReplySender};
use crate::pipeline::StageDeps;
use crate::secrets::SecretStore;
use crate::vision::Classifier;

pub(crate) fn test_config() -> PipelineConfig {
    PipelineConfig::from_lookup(|key| match key {
        "PROJECT_ID" => Some("proj-1".into()),
        "WAIT_PROCESS_TOPIC" => Some("to-process".into()),
        "WAIT_SEND_TOPIC" => Some("to-send".into()),
        _ => None,
    })
    .expect("test config")
}

/// Publisher that records every publish; optionally fails after N accepts.
#[derive(Clone, Default)]
pub(crate) struct RecordingPublisher {
    records: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
    fail_after: Option<usize>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_after(n: usize) -> Self {
        Self {
            fail_after: Some(n),
            ..Self::default()
        }
    }

    pub fn records(&self) -> Vec<(String, Vec<u8>)> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<String, BrokerError> {
        let mut records = self.records.lock().unwrap();
        if let Some(limit) = self.fail_after {
            if records.len() >= limit {
                return Err(BrokerError::PublishTransport {
                    topic: topic.to_string(),
                    reason: "injected publish failure".into(),
                });
            }
        }
        records.push((topic.to_string(), payload.to_vec()));
        Ok(format!("m-{}", records.len()))
    }
}

/// Secret store returning a fixed value, recording requested names.
#[derive(Clone)]
pub(crate) struct StaticSecrets {
    value: String,
    fail: bool,
    requests: Arc<Mutex<Vec<(String, String)>>>,
}

impl StaticSecrets {
    pub fn new(value: &str) -> Self {
        Self {
            value: value.to_string(),
            fail: false,
            requests: Arc::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new("")
        }
    }

    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SecretStore for StaticSecrets {
    async fn resolve(&self, project_id: &str, name: &str) -> Result<SecretString, SecretError> {
        self.requests
            .lock()
            .unwrap()
            .push((project_id.to_string(), name.to_string()));
        if self.fail {
            return Err(SecretError::Status {
                name: name.to_string(),
                status: 403,
                body: "permission denied".into(),
            });
        }
        Ok(SecretString::from(self.value.clone()))
    }
}

/// Image fetcher returning fixed bytes, recording credential and id.
#[derive(Clone)]
pub(crate) struct StaticImages {
    image: Vec<u8>,
    fail: bool,
    requests: Arc<Mutex<Vec<(String, String)>>>,
}

impl StaticImages {
    pub fn new(image: &[u8]) -> Self {
        Self {
            image: image.to_vec(),
            fail: false,
            requests: Arc::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(b"")
        }
    }

    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageFetcher for StaticImages {
    async fn fetch_image(
        &self,
        credential: &SecretString,
        image_id: &str,
    ) -> Result<Vec<u8>, ChannelError> {
        self.requests
            .lock()
            .unwrap()
            .push((credential.expose_secret().to_string(), image_id.to_string()));
        if self.fail {
            return Err(ChannelError::FetchStatus {
                image_id: image_id.to_string(),
                status: 404,
                body: "no such message".into(),
            });
        }
        Ok(self.image.clone())
    }
}

/// Classifier returning a fixed label list, recording each request.
#[derive(Clone)]
pub(crate) struct StaticClassifier {
    labels: Vec<String>,
    fail: bool,
    requests: Arc<Mutex<Vec<(Vec<u8>, u32)>>>,
}

impl StaticClassifier {
    pub fn new(labels: &[&str]) -> Self {
        Self {
            labels: labels.iter().map(|s| s.to_string()).collect(),
            fail: false,
            requests: Arc::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(&[])
        }
    }

    pub fn requests(&self) -> Vec<(Vec<u8>, u32)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Classifier for StaticClassifier {
    async fn classify(&self, image: &[u8], max_labels: u32) -> Result<Vec<String>, ClassifyError> {
        self.requests
            .lock()
            .unwrap()
            .push((image.to_vec(), max_labels));
        if self.fail {
            return Err(ClassifyError::Annotation {
                code: 3,
                message: "Bad image data.".into(),
            });
        }
        Ok(self.labels.clone())
    }
}

/// Reply sender that records every reply.
#[derive(Clone, Default)]
pub(crate) struct RecordingReplies {
    fail: bool,
    replies: Arc<Mutex<Vec<(String, String, String)>>>,
}

impl RecordingReplies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Recorded (credential, reply token, text) triples.
    pub fn replies(&self) -> Vec<(String, String, String)> {
        self.replies.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReplySender for RecordingReplies {
    async fn send_reply(
        &self,
        credential: &SecretString,
        reply_token: &str,
        text: &str,
    ) -> Result<(), ChannelError> {
        if self.fail {
            return Err(ChannelError::ReplyTransport {
                reason: "injected reply failure".into(),
            });
        }
        self.replies.lock().unwrap().push((
            credential.expose_secret().to_string(),
            reply_token.to_string(),
            text.to_string(),
        ));
        Ok(())
    }
}

/// Full dependency set with recording doubles in every slot.
#[derive(Clone)]
pub(crate) struct TestHarness {
    pub publisher: RecordingPublisher,
    pub secrets: StaticSecrets,
    pub images: StaticImages,
    pub classifier: StaticClassifier,
    pub replies: RecordingReplies,
}

impl TestHarness {
    pub fn new() -> Self {
        Self {
            publisher: RecordingPublisher::new(),
            secrets: StaticSecrets::new("channel-token"),
            images: StaticImages::new(b"image-bytes"),
            classifier: StaticClassifier::new(&["cat", "outdoor"]),
            replies: RecordingReplies::new(),
        }
    }

    pub fn deps(&self) -> StageDeps {
        StageDeps {
            secrets: Arc::new(self.secrets.clone()),
            images: Arc::new(self.images.clone()),
            classifier: Arc::new(self.classifier.clone()),
            replies: Arc::new(self.replies.clone()),
            publisher: Arc::new(self.publisher.clone()),
        }
    }
}

/// Dependencies for stages that only publish.
pub(crate) fn deps_with(publisher: RecordingPublisher) -> StageDeps {
    let harness = TestHarness {
        publisher,
        ..TestHarness::new()
    };
    harness.deps()
}
