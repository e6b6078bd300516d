//! Name-based handler registry.

use std::{collections::HashMap, fmt, sync::Arc};

use elementary_core::Envelope;

use crate::{HandlerError, MessageHandler};

/// Routes envelopes to handlers by name.
///
/// Replies follow the host naming convention: `<name>.callback` on success,
/// `error` with the error text on failure.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn MessageHandler>>,
    fallback: Option<Arc<dyn MessageHandler>>,
}

impl HandlerRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one envelope name.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, handler: impl MessageHandler + 'static) -> Self {
        self.register(name, Arc::new(handler));
        self
    }

    /// Register a handler for one envelope name, replacing any previous one.
    pub fn register(&mut self, name: impl Into<String>, handler: Arc<dyn MessageHandler>) {
        self.handlers.insert(name.into(), handler);
    }

    /// Handler for every name without a dedicated handler.
    #[must_use]
    pub fn with_fallback(mut self, handler: impl MessageHandler + 'static) -> Self {
        self.fallback = Some(Arc::new(handler));
        self
    }

    /// Whether an envelope with this name would be handled.
    #[must_use]
    pub fn handles(&self, name: &str) -> bool {
        self.fallback.is_some() || self.handlers.contains_key(name)
    }

    /// Run the matching handler and build the reply envelope.
    pub async fn respond(&self, message: &Envelope) -> Envelope {
        let Some(handler) = self.handlers.get(&message.name).or(self.fallback.as_ref()) else {
            tracing::warn!(name = %message.name, "no handler for message");
            return Envelope::error(HandlerError::Unhandled(message.name.clone()).to_string());
        };

        match handler.handle(message).await {
            Ok(payload) => Envelope::callback(&message.name, payload),
            Err(e) => {
                tracing::error!(name = %message.name, "handling message failed: {e}");
                Envelope::error(e.to_string())
            }
        }
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("HandlerRegistry")
            .field("handlers", &names)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}
