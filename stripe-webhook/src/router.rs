//! Router initialization.
//!
//! All configuration is captured once in an immutable [`WebhookRouter`];
//! several independent routers can live in the same process.

use std::fmt;
use std::sync::Arc;

use axum::{routing::post, Router};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::error::ConfigError;
use crate::registry::HandlerRegistry;
use crate::web::{
    stripe_webhook, AppState, SignatureVerifier, StripeSignatureVerifier, DEFAULT_MAX_BODY_BYTES,
    DEFAULT_TOLERANCE_SECS,
};

/// A validated webhook endpoint ready to be mounted.
pub struct WebhookRouter {
    webhook_path: String,
    provider_secret_key: String,
    state: AppState,
}

impl WebhookRouter {
    pub fn builder() -> WebhookRouterBuilder {
        WebhookRouterBuilder::default()
    }

    pub fn webhook_path(&self) -> &str {
        &self.webhook_path
    }

    /// Credential for the payment provider's API.
    pub fn provider_secret_key(&self) -> &str {
        &self.provider_secret_key
    }

    pub fn verifies_signatures(&self) -> bool {
        self.state.signing_secret.is_some()
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.state.registry
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Build the axum router serving `POST <webhook_path>`.
    pub fn into_router(self) -> Router {
        Router::new()
            .route(&self.webhook_path, post(stripe_webhook))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state)
    }
}

impl fmt::Debug for WebhookRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookRouter")
            .field("webhook_path", &self.webhook_path)
            .field("provider_secret_key", &"<redacted>")
            .field("state", &self.state)
            .finish()
    }
}

/// Collects router options; [`build`](Self::build) validates them eagerly.
#[derive(Default)]
pub struct WebhookRouterBuilder {
    webhook_path: Option<String>,
    handlers: Option<HandlerRegistry>,
    provider_secret_key: Option<String>,
    webhook_signing_secret: Option<String>,
    max_body_bytes: Option<usize>,
    signature_tolerance_secs: Option<u64>,
    verifier: Option<Arc<dyn SignatureVerifier>>,
}

impl WebhookRouterBuilder {
    /// Path the endpoint is mounted at, e.g. `/webhooks/stripe`.
    pub fn webhook_path(mut self, path: impl Into<String>) -> Self {
        self.webhook_path = Some(path.into());
        self
    }

    pub fn handlers(mut self, registry: HandlerRegistry) -> Self {
        self.handlers = Some(registry);
        self
    }

    pub fn provider_secret_key(mut self, key: impl Into<String>) -> Self {
        self.provider_secret_key = Some(key.into());
        self
    }

    /// Enables signature verification. A blank secret leaves it disabled.
    pub fn webhook_signing_secret(mut self, secret: impl Into<String>) -> Self {
        self.webhook_signing_secret = Some(secret.into());
        self
    }

    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = Some(limit);
        self
    }

    /// Maximum signature age in seconds for the default verifier.
    pub fn signature_tolerance_secs(mut self, secs: u64) -> Self {
        self.signature_tolerance_secs = Some(secs);
        self
    }

    /// Replace the default Stripe verifier.
    pub fn verifier(mut self, verifier: Arc<dyn SignatureVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Apply the environment-derived settings of `config`.
    ///
    /// Secrets absent from `config` leave previously set values untouched.
    pub fn with_config(mut self, config: &Config) -> Self {
        self.webhook_path = Some(config.webhook_path.clone());
        if let Some(key) = &config.stripe_secret_key {
            self.provider_secret_key = Some(key.clone());
        }
        if let Some(secret) = &config.stripe_webhook_secret {
            self.webhook_signing_secret = Some(secret.clone());
        }
        self.max_body_bytes = Some(config.max_body_bytes);
        self.signature_tolerance_secs = Some(config.signature_tolerance_secs);
        self
    }

    pub fn build(self) -> Result<WebhookRouter, ConfigError> {
        let webhook_path = self
            .webhook_path
            .filter(|p| !p.trim().is_empty())
            .ok_or(ConfigError::MissingWebhookPath)?;
        if !webhook_path.starts_with('/') {
            return Err(ConfigError::InvalidWebhookPath(webhook_path));
        }

        let registry = self
            .handlers
            .filter(|r| !r.is_empty())
            .ok_or(ConfigError::MissingHandlers)?;

        let provider_secret_key = self
            .provider_secret_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingProviderSecretKey)?;

        let signing_secret: Option<Arc<str>> = self
            .webhook_signing_secret
            .filter(|s| !s.trim().is_empty())
            .map(Arc::from);

        let tolerance = self
            .signature_tolerance_secs
            .unwrap_or(DEFAULT_TOLERANCE_SECS);
        let verifier = self
            .verifier
            .unwrap_or_else(|| Arc::new(StripeSignatureVerifier::new(tolerance)));

        info!(
            webhook_path = %webhook_path,
            event_types = registry.len(),
            signature_verification = signing_secret.is_some(),
            "webhook_router_initialized"
        );

        Ok(WebhookRouter {
            webhook_path,
            provider_secret_key,
            state: AppState {
                registry: Arc::new(registry),
                signing_secret,
                verifier,
                max_body_bytes: self.max_body_bytes.unwrap_or(DEFAULT_MAX_BODY_BYTES),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::handler_fn;

    fn registry() -> HandlerRegistry {
        HandlerRegistry::builder()
            .on("customer.source.created", handler_fn(|_event| async { Ok(()) }))
            .build()
    }

    fn complete() -> WebhookRouterBuilder {
        WebhookRouter::builder()
            .webhook_path("/path")
            .handlers(registry())
            .provider_secret_key("sk_test_abc")
    }

    #[test]
    fn test_build_without_webhook_path_fails() {
        let err = WebhookRouter::builder()
            .handlers(registry())
            .provider_secret_key("sk_test_abc")
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingWebhookPath);

        let err = complete().webhook_path("").build().unwrap_err();
        assert_eq!(err, ConfigError::MissingWebhookPath);
    }

    #[test]
    fn test_build_with_relative_path_fails() {
        let err = complete().webhook_path("path").build().unwrap_err();
        assert_eq!(err, ConfigError::InvalidWebhookPath("path".to_string()));
    }

    #[test]
    fn test_build_without_handlers_fails() {
        let err = WebhookRouter::builder()
            .webhook_path("/path")
            .provider_secret_key("sk_test_abc")
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingHandlers);

        let err = complete()
            .handlers(HandlerRegistry::default())
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingHandlers);
    }

    #[test]
    fn test_build_without_provider_key_fails() {
        let err = WebhookRouter::builder()
            .webhook_path("/path")
            .handlers(registry())
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingProviderSecretKey);
    }

    #[test]
    fn test_build_with_required_options() {
        let router = complete().build().unwrap();

        assert_eq!(router.webhook_path(), "/path");
        assert_eq!(router.provider_secret_key(), "sk_test_abc");
        assert!(!router.verifies_signatures());
        assert_eq!(router.state().max_body_bytes, DEFAULT_MAX_BODY_BYTES);
    }

    #[test]
    fn test_build_with_signing_secret() {
        let router = complete().webhook_signing_secret("whsec_abc").build().unwrap();
        assert!(router.verifies_signatures());

        let router = complete().webhook_signing_secret("  ").build().unwrap();
        assert!(!router.verifies_signatures());
    }

    #[test]
    fn test_build_from_config() {
        let config = Config {
            port: 8080,
            webhook_path: "/webhooks/stripe".to_string(),
            stripe_secret_key: Some("sk_test_abc".to_string()),
            stripe_webhook_secret: Some("whsec_abc".to_string()),
            max_body_bytes: 4096,
            signature_tolerance_secs: 60,
            event_types: None,
        };

        let router = WebhookRouter::builder()
            .with_config(&config)
            .handlers(registry())
            .build()
            .unwrap();

        assert_eq!(router.webhook_path(), "/webhooks/stripe");
        assert!(router.verifies_signatures());
        assert_eq!(router.state().max_body_bytes, 4096);
    }

    #[test]
    fn test_config_without_secrets_keeps_explicit_values() {
        let config = Config {
            port: 8080,
            webhook_path: "/webhooks/stripe".to_string(),
            stripe_secret_key: None,
            stripe_webhook_secret: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            signature_tolerance_secs: DEFAULT_TOLERANCE_SECS,
            event_types: None,
        };

        let router = WebhookRouter::builder()
            .provider_secret_key("sk_test_abc")
            .webhook_signing_secret("whsec_abc")
            .with_config(&config)
            .handlers(registry())
            .build()
            .unwrap();

        assert_eq!(router.provider_secret_key(), "sk_test_abc");
        assert!(router.verifies_signatures());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let router = complete().webhook_signing_secret("whsec_abc").build().unwrap();
        let debug = format!("{:?}", router);

        assert!(!debug.contains("sk_test_abc"));
        assert!(!debug.contains("whsec_abc"));
    }
}
