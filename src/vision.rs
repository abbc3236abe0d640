//! Image classification via the Vision `images:annotate` REST API.
//!
//! One request per image, LABEL_DETECTION only. The classifier's own
//! confidence ordering is preserved; nothing here re-sorts or filters the
//! returned labels.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use crate::error::ClassifyError;
use crate::gcp::GcpTokenSource;

/// Turns image bytes into an ordered list of label strings.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, image: &[u8], max_labels: u32) -> Result<Vec<String>, ClassifyError>;
}

/// Vision REST classifier.
pub struct VisionClassifier {
    client: reqwest::Client,
    api_base: String,
    tokens: Arc<GcpTokenSource>,
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct AnnotateRequest {
    requests: Vec<AnnotateImageRequest>,
}

#[derive(Debug, Serialize)]
struct AnnotateImageRequest {
    image: ImageContent,
    features: Vec<Feature>,
}

#[derive(Debug, Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Debug, Serialize)]
struct Feature {
    #[serde(rename = "type")]
    feature_type: &'static str,
    #[serde(rename = "maxResults")]
    max_results: u32,
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Default, Deserialize)]
struct AnnotateImageResponse {
    #[serde(rename = "labelAnnotations", default)]
    label_annotations: Vec<LabelAnnotation>,
    #[serde(default)]
    error: Option<RpcStatus>,
}

#[derive(Debug, Deserialize)]
struct LabelAnnotation {
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct RpcStatus {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

fn annotate_request(image: &[u8], max_labels: u32) -> AnnotateRequest {
    AnnotateRequest {
        requests: vec![AnnotateImageRequest {
            image: ImageContent {
                content: BASE64.encode(image),
            },
            features: vec![Feature {
                feature_type: "LABEL_DETECTION",
                max_results: max_labels,
            }],
        }],
    }
}

/// Extract the ordered label descriptions from an annotate response.
fn labels_from_response(resp: AnnotateResponse) -> Result<Vec<String>, ClassifyError> {
    let Some(image_resp) = resp.responses.into_iter().next() else {
        return Err(ClassifyError::InvalidResponse(
            "annotate response contained no results".into(),
        ));
    };
    if let Some(err) = image_resp.error {
        return Err(ClassifyError::Annotation {
            code: err.code,
            message: err.message,
        });
    }
    Ok(image_resp
        .label_annotations
        .into_iter()
        .map(|label| label.description)
        .collect())
}

impl VisionClassifier {
    pub fn new(client: reqwest::Client, api_base: String, tokens: Arc<GcpTokenSource>) -> Self {
        Self {
            client,
            api_base,
            tokens,
        }
    }
}

#[async_trait]
impl Classifier for VisionClassifier {
    async fn classify(&self, image: &[u8], max_labels: u32) -> Result<Vec<String>, ClassifyError> {
        let token = self.tokens.access_token().await?;

        let resp = self
            .client
            .post(format!("{}/v1/images:annotate", self.api_base))
            .bearer_auth(secrecy::ExposeSecret::expose_secret(&token))
            .json(&annotate_request(image, max_labels))
            .send()
            .await
            .map_err(|e| ClassifyError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClassifyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: AnnotateResponse = resp
            .json()
            .await
            .map_err(|e| ClassifyError::InvalidResponse(e.to_string()))?;
        let labels = labels_from_response(body)?;
        tracing::debug!(label_count = labels.len(), "classified image");
        Ok(labels)
    }
}

// ── Tests ───────────────────────────────────────────────────────────
