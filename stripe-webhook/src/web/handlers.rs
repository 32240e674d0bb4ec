//! Webhook endpoint handlers.
//!
//! The webhook handler runs the whole pipeline for one request:
//! 1. Read the raw body
//! 2. Authenticate it (or trust it when no signing secret is configured)
//! 3. Dispatch the event to its registered handlers
//! 4. Translate the outcome into exactly one response

use std::fmt;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::HeaderMap,
    response::Response,
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::dispatch::{dispatch, DispatchOutcome};
use crate::error::WebhookError;
use crate::registry::HandlerRegistry;
use crate::web::body::read_raw_body;
use crate::web::response::translate;
use crate::web::signature::{authenticate, SignatureVerifier, SIGNATURE_HEADER};

/// Shared, immutable request-processing state.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<HandlerRegistry>,
    pub signing_secret: Option<Arc<str>>,
    pub verifier: Arc<dyn SignatureVerifier>,
    pub max_body_bytes: usize,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("registry", &self.registry)
            .field("signature_verification", &self.signing_secret.is_some())
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}

impl AppState {
    /// Authenticate and dispatch one raw request.
    pub async fn process(
        &self,
        headers: &HeaderMap,
        body: Body,
    ) -> Result<DispatchOutcome, WebhookError> {
        let raw = read_raw_body(body, self.max_body_bytes).await?;

        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok());

        info!(
            body_length = raw.len(),
            has_signature = signature.is_some(),
            "webhook_received"
        );

        let auth = authenticate(
            &raw,
            signature,
            self.signing_secret.as_deref(),
            self.verifier.as_ref(),
        )?;

        let verified = auth.is_verified();
        let event = auth.into_event();

        info!(
            event_type = %event.event_type,
            event_id = ?event.id(),
            verified = verified,
            "webhook_authenticated"
        );

        Ok(dispatch(event, &self.registry).await)
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Stripe Webhook
// =============================================================================

/// Stripe webhook endpoint.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Response {
    translate(state.process(&headers, body).await)
}
