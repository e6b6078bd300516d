//! Forward envelopes to the store's HTTP API.
//!
//! An envelope `{name: "/items", method: "GET", payload}` becomes
//! `GET <base>/api/items` with the payload as JSON body. The reply carries
//! the response body, decoded as JSON when possible.

use async_trait::async_trait;
use elementary_core::{Envelope, Request, Transport, Verb};
use elementary_transport::{RemoteTarget, RemoteTransport};
use serde_json::Value;

use crate::{HandlerError, MessageHandler};

/// Fallback handler routing unmatched names to the API server.
///
/// Envelopes without `method` are sent as `GET`.
#[derive(Debug, Clone)]
pub struct ApiForwardHandler {
    transport: RemoteTransport,
}

impl ApiForwardHandler {
    /// Forward through an existing remote transport.
    #[must_use]
    pub const fn new(transport: RemoteTransport) -> Self {
        Self { transport }
    }

    /// Forward to the API behind `target`.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn for_target(target: RemoteTarget) -> Result<Self, HandlerError> {
        Ok(Self::new(RemoteTransport::new(target)?))
    }
}

#[async_trait]
impl MessageHandler for ApiForwardHandler {
    async fn handle(&self, message: &Envelope) -> Result<Option<Value>, HandlerError> {
        let mut request = Request::new(message.method.unwrap_or(Verb::Get), &message.name);
        request.payload.clone_from(&message.payload);
        tracing::debug!(name = %message.name, method = %request.verb, "forwarding to API");

        let reply = self.transport.dispatch(request).await?.resolve().await?;
        Ok(reply.into_payload())
    }
}
