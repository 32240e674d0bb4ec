//! Stripe webhook signature verification.
//!
//! Stripe signs each delivery with HMAC-SHA256 over `"{timestamp}.{body}"`
//! and sends the result in the `Stripe-Signature` header:
//!
//! ```text
//! Stripe-Signature: t=1492774577,v1=5257a869e7ecebeda32affa62cdca3fa51cad7e77a0e56ff536d0ce8e108d8bd
//! ```
//!
//! Reference: https://docs.stripe.com/webhooks#verify-manually

use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

use crate::error::WebhookError;
use crate::event::Event;

type HmacSha256 = Hmac<Sha256>;

/// Request header carrying the provider signature.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Default maximum age of a signed timestamp.
pub const DEFAULT_TOLERANCE_SECS: u64 = 300;

const SIGNATURE_SCHEME: &str = "v1";

/// Cryptographic oracle that authenticates a raw body and returns the
/// parsed event.
///
/// Implementations must report authentication problems (missing header,
/// bad signature, stale timestamp) as
/// [`WebhookError::SignatureVerification`] so they can be told apart from
/// every other failure.
pub trait SignatureVerifier: Send + Sync {
    fn verify(
        &self,
        raw_body: &[u8],
        signature_header: Option<&str>,
        signing_secret: &str,
    ) -> Result<Event, WebhookError>;
}

/// Outcome of a successful authentication step.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthResult {
    /// The signature was checked by the oracle.
    Authenticated(Event),
    /// No signing secret is configured; the body was trusted as-is.
    Unverified(Event),
}

impl AuthResult {
    pub fn is_verified(&self) -> bool {
        matches!(self, AuthResult::Authenticated(_))
    }

    pub fn into_event(self) -> Event {
        match self {
            AuthResult::Authenticated(event) | AuthResult::Unverified(event) => event,
        }
    }
}

/// Authenticate a raw request body.
///
/// Without a signing secret the verifier is never called and the body is
/// parsed as trusted JSON. With a secret the verifier is called exactly
/// once and decides the outcome.
pub fn authenticate(
    raw_body: &[u8],
    signature_header: Option<&str>,
    signing_secret: Option<&str>,
    verifier: &dyn SignatureVerifier,
) -> Result<AuthResult, WebhookError> {
    match signing_secret.filter(|s| is_signature_verification_enabled(Some(*s))) {
        Some(secret) => verifier
            .verify(raw_body, signature_header, secret)
            .map(AuthResult::Authenticated),
        None => Event::from_slice(raw_body).map(AuthResult::Unverified),
    }
}

/// HMAC-SHA256 verifier for the Stripe signature scheme.
#[derive(Debug, Clone, Copy)]
pub struct StripeSignatureVerifier {
    tolerance_secs: u64,
}

impl Default for StripeSignatureVerifier {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE_SECS)
    }
}

impl StripeSignatureVerifier {
    /// Create a verifier that rejects timestamps older than
    /// `tolerance_secs`. A tolerance of zero disables the age check.
    pub fn new(tolerance_secs: u64) -> Self {
        Self { tolerance_secs }
    }

    pub fn tolerance_secs(&self) -> u64 {
        self.tolerance_secs
    }

    /// Verify `signature_header` against `raw_body` as of `now_secs`.
    pub fn verify_header_at(
        &self,
        raw_body: &[u8],
        signature_header: Option<&str>,
        signing_secret: &str,
        now_secs: u64,
    ) -> Result<(), WebhookError> {
        let header = match signature_header {
            Some(h) if !h.trim().is_empty() => h,
            _ => {
                warn!("signature_header_missing");
                return Err(WebhookError::SignatureVerification(
                    "missing Stripe-Signature header".to_string(),
                ));
            }
        };

        let (timestamp, signatures) = match parse_signature_header(header) {
            Some(parsed) => parsed,
            None => {
                warn!(header_length = header.len(), "signature_header_malformed");
                return Err(WebhookError::SignatureVerification(
                    "unable to extract timestamp and signatures from header".to_string(),
                ));
            }
        };

        let Some(expected) = compute_signature(signing_secret, timestamp, raw_body) else {
            return Err(WebhookError::SignatureVerification(
                "invalid webhook signing secret".to_string(),
            ));
        };

        // Constant-time comparison against every v1 entry
        if !signatures
            .iter()
            .any(|candidate| constant_time_compare(&expected, candidate))
        {
            warn!(
                candidates = signatures.len(),
                body_length = raw_body.len(),
                "signature_mismatch"
            );
            return Err(WebhookError::SignatureVerification(
                "no signatures found matching the expected signature for payload".to_string(),
            ));
        }

        if self.tolerance_secs > 0 && timestamp.saturating_add(self.tolerance_secs) < now_secs {
            warn!(
                webhook_time = timestamp,
                current_time = now_secs,
                tolerance_secs = self.tolerance_secs,
                "signature_stale"
            );
            return Err(WebhookError::SignatureVerification(
                "timestamp outside the tolerance zone".to_string(),
            ));
        }

        Ok(())
    }
}

impl SignatureVerifier for StripeSignatureVerifier {
    fn verify(
        &self,
        raw_body: &[u8],
        signature_header: Option<&str>,
        signing_secret: &str,
    ) -> Result<Event, WebhookError> {
        let now_secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        self.verify_header_at(raw_body, signature_header, signing_secret, now_secs)?;
        Event::from_slice(raw_body)
    }
}

/// Compute the hex `v1` signature for a payload signed at `timestamp`.
pub fn compute_signature(
    signing_secret: &str,
    timestamp: u64,
    raw_body: &[u8],
) -> Option<String> {
    let mut mac = match HmacSha256::new_from_slice(signing_secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            warn!("signature_invalid_key");
            return None;
        }
    };

    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(raw_body);

    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Build a complete `Stripe-Signature` header value for a payload.
pub fn signature_header(
    signing_secret: &str,
    timestamp: u64,
    raw_body: &[u8],
) -> Option<String> {
    let signature = compute_signature(signing_secret, timestamp, raw_body)?;
    Some(format!("t={},{}={}", timestamp, SIGNATURE_SCHEME, signature))
}

/// Split a header into its timestamp and `v1` signatures.
///
/// Unknown schemes (e.g. `v0`) are ignored. Returns `None` when the
/// timestamp is missing or unparsable, or when no `v1` entry is present.
fn parse_signature_header(header: &str) -> Option<(u64, Vec<&str>)> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for item in header.split(',') {
        let Some((key, value)) = item.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse::<u64>().ok(),
            SIGNATURE_SCHEME => signatures.push(value),
            _ => {}
        }
    }

    match timestamp {
        Some(t) if !signatures.is_empty() => Some((t, signatures)),
        _ => None,
    }
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

/// Check if signature verification is enabled for a configured secret.
pub fn is_signature_verification_enabled(signing_secret: Option<&str>) -> bool {
    signing_secret.map(|s| !s.trim().is_empty()).unwrap_or(false)
}
