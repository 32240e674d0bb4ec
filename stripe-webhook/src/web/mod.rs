//! HTTP surface of the webhook receiver.
//!
//! This module provides:
//! - Raw body reading with a size limit
//! - Stripe signature verification
//! - The axum endpoint that authenticates, dispatches and responds
//! - Outcome to status code translation

pub mod body;
pub mod handlers;
pub mod response;
pub mod signature;

pub use body::{read_raw_body, DEFAULT_MAX_BODY_BYTES};
pub use handlers::{health, stripe_webhook, AppState, HealthResponse};
pub use response::{translate, ErrorBody, ErrorDetail};
pub use signature::{
    authenticate, compute_signature, is_signature_verification_enabled, signature_header,
    AuthResult, SignatureVerifier, StripeSignatureVerifier, DEFAULT_TOLERANCE_SECS,
    SIGNATURE_HEADER,
};
