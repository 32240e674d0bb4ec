//! Stripe webhook server.
//!
//! This binary:
//! - Receives Stripe webhooks on the configured path
//! - Verifies the `Stripe-Signature` header when a signing secret is set
//! - Logs every event whose type is listed in `WEBHOOK_EVENT_TYPES`
//!
//! Applications embed the library and register their own handlers; this
//! server is the reference deployment.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::get;
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use stripe_webhook::web::health;
use stripe_webhook::{handler_fn, Config, Event, Handler, HandlerRegistry, WebhookRouter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");

    // Load configuration
    let config = Config::from_env();
    info!(
        port = config.port,
        webhook_path = %config.webhook_path,
        stripe_secret_key_set = config.stripe_secret_key.is_some(),
        signature_verification = config.stripe_webhook_secret.is_some(),
        max_body_bytes = config.max_body_bytes,
        "config_loaded"
    );

    let event_types = config.event_types.clone().unwrap_or_default();
    if event_types.is_empty() {
        warn!("no_event_types_configured");
    }

    let mut registry = HandlerRegistry::builder();
    for event_type in &event_types {
        registry = registry.on(event_type.as_str(), log_event());
    }

    let webhook = WebhookRouter::builder()
        .with_config(&config)
        .handlers(registry.build())
        .build()
        .context("Invalid webhook configuration")?;

    // Build the router
    let app = webhook.into_router().route("/health", get(health));

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Handler that records the event in the structured log.
fn log_event() -> Handler {
    handler_fn(|event: Arc<Event>| async move {
        info!(
            event_type = %event.event_type,
            event_id = ?event.id(),
            livemode = event.livemode(),
            "stripe_event_received"
        );
        Ok(())
    })
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "ctrl_c_handler_failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "sigterm_handler_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
