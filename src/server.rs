//! HTTP surface: the webhook entrypoint, broker push endpoints, health.
//!
//! Every stage invocation arrives here. The webhook POST triggers the
//! receive stage directly; the broker delivers to the process and send
//! stages via push subscriptions. A non-2xx response from a push endpoint
//! signals the broker to redeliver.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::trace::TraceLayer;

use crate::broker::decode_push;
use crate::config::PipelineConfig;
use crate::error::{FailureKind, Result};
use crate::pipeline::{process_stage, receive_stage, send_stage, StageDeps};

/// Shared state for all routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<PipelineConfig>,
    pub deps: StageDeps,
}

/// Build the pipeline router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/webhook", post(webhook))
        .route("/push/process", post(push_process))
        .route("/push/send", post(push_send))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// POST /webhook — ReceiveStage.
///
/// 200 only after every publish in the batch has been acknowledged; 500
/// with the error text on the first failure, letting the platform retry
/// the whole batch.
async fn webhook(State(state): State<AppState>, body: Bytes) -> Response {
    match receive_stage(&state.config, &state.deps, &body).await {
        Ok(published) => {
            tracing::info!(published, "webhook accepted");
            (StatusCode::OK, "receive".to_string()).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "webhook failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// POST /push/process — ProcessStage.
async fn push_process(State(state): State<AppState>, body: Bytes) -> Response {
    let result = match decode_push(&body) {
        Ok(envelope) => process_stage(&state.config, &state.deps, &envelope).await,
        Err(e) => Err(e.into()),
    };
    push_response("process", &state.config, result)
}

/// POST /push/send — SendStage.
async fn push_send(State(state): State<AppState>, body: Bytes) -> Response {
    let result = match decode_push(&body) {
        Ok(envelope) => send_stage(&state.config, &state.deps, &envelope).await,
        Err(e) => Err(e.into()),
    };
    push_response("send", &state.config, result)
}

/// Map a stage result to the push-delivery protocol: 200 acks the
/// delivery, 500 requests redelivery. With `ack_permanent_failures` set,
/// permanently failing deliveries are acknowledged and dropped instead of
/// burning redelivery attempts.
fn push_response(stage: &str, config: &PipelineConfig, result: Result<()>) -> Response {
    match result {
        Ok(()) => (StatusCode::OK, "ok".to_string()).into_response(),
        Err(e) if config.ack_permanent_failures && e.failure_kind() == FailureKind::Permanent => {
            tracing::warn!(stage, error = %e, "dropping permanently failing delivery");
            (StatusCode::OK, "dropped".to_string()).into_response()
        }
        Err(e) => {
            tracing::error!(stage, error = %e, "stage failed, delivery will be retried");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────
