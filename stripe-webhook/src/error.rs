//! Error types for router construction and request processing.

use axum::http::StatusCode;
use thiserror::Error;

/// Title reported for signature failures.
pub const SIGNATURE_ERROR_TITLE: &str = "Signature verification error";

/// Title reported for every other processing failure.
pub const PROCESSING_ERROR_TITLE: &str = "Error processing event";

/// Invalid router configuration, raised once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Must provide webhook path")]
    MissingWebhookPath,

    #[error("Webhook path must start with '/': {0}")]
    InvalidWebhookPath(String),

    #[error("Must provide one or more event handlers")]
    MissingHandlers,

    #[error("Must provide provider secret key")]
    MissingProviderSecretKey,
}

/// Failure while processing a single webhook request.
///
/// Every variant is caught at the request boundary and turned into exactly
/// one response; nothing here outlives the request that produced it.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The request body could not be read in full.
    #[error("{0}")]
    BodyRead(String),

    /// The body is not a JSON event object.
    #[error("{0}")]
    MalformedPayload(String),

    /// The signature oracle rejected the request.
    #[error("{0}")]
    SignatureVerification(String),

    /// A registered handler failed.
    #[error("{0}")]
    Handler(anyhow::Error),
}

impl WebhookError {
    /// HTTP status the error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            WebhookError::SignatureVerification(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable title placed in the error body.
    pub fn title(&self) -> &'static str {
        match self {
            WebhookError::SignatureVerification(_) => SIGNATURE_ERROR_TITLE,
            _ => PROCESSING_ERROR_TITLE,
        }
    }

    pub fn is_signature_error(&self) -> bool {
        matches!(self, WebhookError::SignatureVerification(_))
    }
}

impl From<serde_json::Error> for WebhookError {
    fn from(err: serde_json::Error) -> Self {
        WebhookError::MalformedPayload(err.to_string())
    }
}
