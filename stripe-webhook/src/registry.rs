//! Event-type to handler routing table.
//!
//! The registry is built once at startup and never mutated afterwards, so
//! it is shared between concurrent requests behind an `Arc` with no locking.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::event::Event;

/// Integrator-supplied unit of work invoked once per matching event.
pub type Handler = Arc<dyn Fn(Arc<Event>) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Wrap an async closure as a [`Handler`].
pub fn handler_fn<F, Fut>(f: F) -> Handler
where
    F: Fn(Arc<Event>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |event: Arc<Event>| f(event).boxed())
}

/// Registry entry as supplied by configuration: one handler or several.
pub enum Handlers {
    Single(Handler),
    Many(Vec<Handler>),
}

impl Handlers {
    fn into_vec(self) -> Vec<Handler> {
        match self {
            Handlers::Single(handler) => vec![handler],
            Handlers::Many(handlers) => handlers,
        }
    }
}

impl From<Handler> for Handlers {
    fn from(handler: Handler) -> Self {
        Handlers::Single(handler)
    }
}

impl From<Vec<Handler>> for Handlers {
    fn from(handlers: Vec<Handler>) -> Self {
        Handlers::Many(handlers)
    }
}

/// Immutable mapping from exact event type to an ordered list of handlers.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    routes: HashMap<String, Vec<Handler>>,
}

impl HandlerRegistry {
    pub fn builder() -> HandlerRegistryBuilder {
        HandlerRegistryBuilder::default()
    }

    /// Build a registry from a configuration mapping.
    ///
    /// Single handlers are normalized to one-element lists and entries with
    /// no handlers are dropped.
    pub fn from_map<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Handlers)>,
        K: Into<String>,
    {
        let mut builder = Self::builder();
        for (event_type, handlers) in entries {
            builder = builder.on_all(event_type, handlers.into_vec());
        }
        builder.build()
    }

    /// Handlers registered for `event_type`, in registration order.
    ///
    /// Matching is exact; an unknown type resolves to an empty slice.
    pub fn resolve(&self, event_type: &str) -> &[Handler] {
        self.routes
            .get(event_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Registered event types, sorted.
    pub fn event_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    /// Number of registered event types.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for event_type in self.event_types() {
            map.entry(&event_type, &self.resolve(event_type).len());
        }
        map.finish()
    }
}

#[derive(Default)]
pub struct HandlerRegistryBuilder {
    routes: HashMap<String, Vec<Handler>>,
}

impl HandlerRegistryBuilder {
    /// Register a handler for an event type.
    ///
    /// Registering several handlers for the same type fans the event out to
    /// all of them.
    pub fn on(self, event_type: impl Into<String>, handler: Handler) -> Self {
        self.on_all(event_type, vec![handler])
    }

    /// Register an ordered list of handlers for an event type.
    pub fn on_all(mut self, event_type: impl Into<String>, handlers: Vec<Handler>) -> Self {
        if !handlers.is_empty() {
            self.routes
                .entry(event_type.into())
                .or_default()
                .extend(handlers);
        }
        self
    }

    pub fn build(self) -> HandlerRegistry {
        HandlerRegistry {
            routes: self.routes,
        }
    }
}
