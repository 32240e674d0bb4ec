//! Configuration module for environment variable parsing.

use std::env;
use tracing::warn;

use crate::web::{DEFAULT_MAX_BODY_BYTES, DEFAULT_TOLERANCE_SECS};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Path the webhook endpoint is mounted at
    pub webhook_path: String,

    /// Stripe API secret key (`sk_...`)
    pub stripe_secret_key: Option<String>,

    /// Stripe webhook signing secret (`whsec_...`); enables signature checks
    pub stripe_webhook_secret: Option<String>,

    /// Maximum accepted request body size in bytes
    pub max_body_bytes: usize,

    /// Maximum age in seconds for signed webhook timestamps
    pub signature_tolerance_secs: u64,

    /// Event types the server registers its logging handler for
    pub event_types: Option<Vec<String>>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Config {
            port: parse_or("PORT", 8080),

            webhook_path: env::var("WEBHOOK_PATH")
                .unwrap_or_else(|_| "/webhooks/stripe".to_string()),

            stripe_secret_key: env::var("STRIPE_SECRET_KEY").ok(),

            stripe_webhook_secret: env::var("STRIPE_WEBHOOK_SECRET").ok(),

            max_body_bytes: parse_or("WEBHOOK_MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES),

            signature_tolerance_secs: parse_or(
                "STRIPE_SIGNATURE_TOLERANCE_SECS",
                DEFAULT_TOLERANCE_SECS,
            ),

            event_types: parse_csv("WEBHOOK_EVENT_TYPES"),
        }
    }
}

/// Parse a numeric variable, falling back to `default` when unset or invalid.
fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid value, using default");
            default
        }
    }
}

/// Parse a comma-separated list of strings.
fn parse_csv(name: &str) -> Option<Vec<String>> {
    env::var(name).ok().map(|raw| {
        raw.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}
