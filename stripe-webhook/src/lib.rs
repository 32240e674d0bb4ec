//! Stripe webhook receiver.
//!
//! Receives signed event notifications, authenticates them against the raw
//! request body and fans each event out to the handlers registered for its
//! type.
//!
//! ## Architecture
//!
//! ```text
//! POST → read_raw_body → authenticate → dispatch (handlers, concurrently) → response
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use stripe_webhook::{handler_fn, HandlerRegistry, WebhookRouter};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = HandlerRegistry::builder()
//!     .on("invoice.paid", handler_fn(|event| async move {
//!         tracing::info!(event_id = ?event.id(), "invoice_paid");
//!         Ok(())
//!     }))
//!     .build();
//!
//! let app = WebhookRouter::builder()
//!     .webhook_path("/webhooks/stripe")
//!     .handlers(registry)
//!     .provider_secret_key("sk_test_...")
//!     .webhook_signing_secret("whsec_...")
//!     .build()?
//!     .into_router();
//! # let _ = app;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod registry;
pub mod router;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use dispatch::{dispatch, DispatchOutcome};
pub use error::{ConfigError, WebhookError};
pub use event::Event;
pub use registry::{handler_fn, Handler, HandlerRegistry, Handlers};
pub use router::{WebhookRouter, WebhookRouterBuilder};
pub use web::{AppState, AuthResult, SignatureVerifier, StripeSignatureVerifier};
