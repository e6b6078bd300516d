//! Legacy-Invoke transport: one-way notification through a host hook.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use elementary_core::{Dispatch, Request, Transport, TransportError, TransportKind};

/// Single synchronous callback provided by the embedding host.
///
/// Receives the payload as JSON text. There is no return channel.
pub trait LegacyHook: Send + Sync {
    fn invoke(&self, message: &str);
}

impl<F> LegacyHook for F
where
    F: Fn(&str) + Send + Sync,
{
    fn invoke(&self, message: &str) {
        self(message);
    }
}

/// Fire-and-forget transport.
///
/// Only the payload is forwarded; the operation name and verb are not part
/// of the legacy contract. An absent payload is sent as `null`.
#[derive(Clone)]
pub struct LegacyTransport {
    hook: Arc<dyn LegacyHook>,
}

impl LegacyTransport {
    /// Create a transport over a host hook.
    #[must_use]
    pub fn new(hook: Arc<dyn LegacyHook>) -> Self {
        Self { hook }
    }
}

impl fmt::Debug for LegacyTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LegacyTransport").finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for LegacyTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::LegacyInvoke
    }

    async fn dispatch(&self, request: Request) -> Result<Dispatch, TransportError> {
        request.validate()?;
        let text = serde_json::to_string(&request.payload)?;
        tracing::debug!(
            request_id = %request.id,
            operation = %request.operation,
            "invoking legacy host hook"
        );
        self.hook.invoke(&text);
        Ok(Dispatch::Detached)
    }
}
