//! Fan-out of one event to every handler registered for its type.
//!
//! ## Dispatch Flow
//!
//! ```text
//! Event → registry.resolve(type) → [h1, h2, ...] → join_all → DispatchOutcome
//! ```

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use anyhow::anyhow;
use futures::FutureExt;
use tracing::{info, warn};

use crate::event::Event;
use crate::registry::{Handler, HandlerRegistry};

/// Result of routing one event through the registry.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// No handler is registered for the event type. Not an error.
    NoHandlersRegistered,

    /// Every resolved handler completed.
    Success { handlers: usize },

    /// At least one handler failed. `cause` is the first failure in
    /// registration order; all handlers were still awaited.
    HandlerFailure {
        cause: anyhow::Error,
        failed: usize,
        total: usize,
    },
}

impl DispatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DispatchOutcome::Success { .. })
    }
}

/// Invoke every handler registered for `event.event_type` concurrently and
/// wait for all of them to settle.
///
/// A failing or panicking handler does not cancel its siblings. No timeout
/// is applied; a handler that never completes keeps the dispatch pending.
pub async fn dispatch(event: Event, registry: &HandlerRegistry) -> DispatchOutcome {
    let handlers = registry.resolve(&event.event_type);

    if handlers.is_empty() {
        info!(
            event_type = %event.event_type,
            event_id = ?event.id(),
            "dispatch_no_handlers"
        );
        return DispatchOutcome::NoHandlersRegistered;
    }

    let total = handlers.len();
    let event = Arc::new(event);

    info!(
        event_type = %event.event_type,
        event_id = ?event.id(),
        handlers = total,
        "dispatch_start"
    );

    let futures: Vec<_> = handlers
        .iter()
        .map(|handler| invoke(Arc::clone(handler), Arc::clone(&event)))
        .collect();

    let results = futures::future::join_all(futures).await;

    let mut first_failure = None;
    let mut failed = 0;
    for (index, result) in results.into_iter().enumerate() {
        if let Err(e) = result {
            warn!(
                event_type = %event.event_type,
                handler_index = index,
                error = %e,
                "dispatch_handler_failed"
            );
            failed += 1;
            first_failure.get_or_insert(e);
        }
    }

    match first_failure {
        None => {
            info!(event_type = %event.event_type, handlers = total, "dispatch_complete");
            DispatchOutcome::Success { handlers: total }
        }
        Some(cause) => {
            warn!(
                event_type = %event.event_type,
                failed = failed,
                handlers = total,
                "dispatch_failed"
            );
            DispatchOutcome::HandlerFailure {
                cause,
                failed,
                total,
            }
        }
    }
}

/// Run one handler, turning a panic into an ordinary failure.
async fn invoke(handler: Handler, event: Arc<Event>) -> anyhow::Result<()> {
    let run = async move { handler(event).await };

    match AssertUnwindSafe(run).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => Err(anyhow!("handler panicked: {}", panic_message(panic.as_ref()))),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic"
    }
}
