//! Error types for the labeling pipeline.

/// Whether a failed invocation is worth redelivering.
///
/// The broker retries any non-2xx push delivery, so by default every error
/// is retried. Classifying errors lets the push endpoints acknowledge
/// deliveries that can never succeed (see `ack_permanent_failures`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// A retry may succeed: network failure, timeout, rate limiting, 5xx.
    Transient,
    /// A retry cannot succeed: malformed input, auth denied, not found.
    Permanent,
}

/// Classify an HTTP status from a downstream dependency.
///
/// 408/429 and server errors are worth retrying; every other non-2xx
/// status reflects a request that will fail the same way next time.
pub(crate) fn status_failure_kind(status: u16) -> FailureKind {
    match status {
        408 | 429 => FailureKind::Transient,
        s if s >= 500 => FailureKind::Transient,
        _ => FailureKind::Permanent,
    }
}

/// Top-level error type for the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Google auth error: {0}")]
    GcpAuth(#[from] GcpAuthError),

    #[error("Secret error: {0}")]
    Secret(#[from] SecretError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Classification error: {0}")]
    Classify(#[from] ClassifyError),

    #[error("Broker error: {0}")]
    Broker(#[from] BrokerError),

    #[error("Malformed webhook body: {0}")]
    MalformedWebhook(String),

    #[error("Malformed topic payload: {0}")]
    MalformedPayload(String),
}

impl PipelineError {
    /// Whether redelivering the triggering message could change the outcome.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Config(_) => FailureKind::Permanent,
            Self::GcpAuth(e) => e.failure_kind(),
            Self::Secret(e) => e.failure_kind(),
            Self::Channel(e) => e.failure_kind(),
            Self::Classify(e) => e.failure_kind(),
            Self::Broker(e) => e.failure_kind(),
            Self::MalformedWebhook(_) | Self::MalformedPayload(_) => FailureKind::Permanent,
        }
    }
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors acquiring a Google API bearer token.
#[derive(Debug, thiserror::Error)]
pub enum GcpAuthError {
    #[error("metadata server request failed: {0}")]
    Transport(String),

    #[error("metadata server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid token response: {0}")]
    InvalidResponse(String),
}

impl GcpAuthError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Transport(_) => FailureKind::Transient,
            Self::Status { status, .. } => status_failure_kind(*status),
            Self::InvalidResponse(_) => FailureKind::Permanent,
        }
    }
}

/// Secret store access errors.
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("secret {name} request failed: {reason}")]
    Transport { name: String, reason: String },

    #[error("secret {name} access returned {status}: {body}")]
    Status {
        name: String,
        status: u16,
        body: String,
    },

    #[error("secret {name} payload invalid: {reason}")]
    InvalidPayload { name: String, reason: String },

    #[error("token acquisition failed: {0}")]
    Auth(#[from] GcpAuthError),
}

impl SecretError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Transport { .. } => FailureKind::Transient,
            Self::Status { status, .. } => status_failure_kind(*status),
            Self::InvalidPayload { .. } => FailureKind::Permanent,
            Self::Auth(e) => e.failure_kind(),
        }
    }
}

/// Messaging-platform errors (image download, reply push).
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("image {image_id} download failed: {reason}")]
    FetchTransport { image_id: String, reason: String },

    #[error("image {image_id} download returned {status}: {body}")]
    FetchStatus {
        image_id: String,
        status: u16,
        body: String,
    },

    #[error("reply send failed: {reason}")]
    ReplyTransport { reason: String },

    #[error("reply endpoint returned {status}: {body}")]
    ReplyStatus { status: u16, body: String },
}

impl ChannelError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::FetchTransport { .. } | Self::ReplyTransport { .. } => FailureKind::Transient,
            Self::FetchStatus { status, .. } | Self::ReplyStatus { status, .. } => {
                status_failure_kind(*status)
            }
        }
    }
}

/// Image classification errors.
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("annotate request failed: {0}")]
    Transport(String),

    #[error("annotate returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid annotate response: {0}")]
    InvalidResponse(String),

    #[error("image annotation failed with code {code}: {message}")]
    Annotation { code: i32, message: String },

    #[error("token acquisition failed: {0}")]
    Auth(#[from] GcpAuthError),
}

impl ClassifyError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Transport(_) => FailureKind::Transient,
            Self::Status { status, .. } => status_failure_kind(*status),
            Self::InvalidResponse(_) | Self::Annotation { .. } => FailureKind::Permanent,
            Self::Auth(e) => e.failure_kind(),
        }
    }
}

/// Broker publish and delivery-envelope errors.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("publish to {topic} failed: {reason}")]
    PublishTransport { topic: String, reason: String },

    #[error("publish to {topic} returned {status}: {body}")]
    PublishStatus {
        topic: String,
        status: u16,
        body: String,
    },

    #[error("publish to {topic} returned an invalid acknowledgment: {reason}")]
    InvalidAck { topic: String, reason: String },

    #[error("message payload failed to encode: {0}")]
    Encode(String),

    #[error("invalid delivery envelope: {0}")]
    InvalidEnvelope(String),

    #[error("token acquisition failed: {0}")]
    Auth(#[from] GcpAuthError),
}

impl BrokerError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::PublishTransport { .. } => FailureKind::Transient,
            Self::PublishStatus { status, .. } => status_failure_kind(*status),
            Self::InvalidAck { .. } | Self::Encode(_) | Self::InvalidEnvelope(_) => {
                FailureKind::Permanent
            }
            Self::Auth(e) => e.failure_kind(),
        }
    }
}

/// Result type alias for the pipeline.
pub type Result<T> = std::result::Result<T, PipelineError>;

// ── Tests ───────────────────────────────────────────────────────────
