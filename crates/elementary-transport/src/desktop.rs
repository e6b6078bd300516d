//! Desktop-Bridge transport.

use async_trait::async_trait;
use elementary_core::{
    Dispatch, Envelope, HostEvents, Messenger, PendingReply, Request, Transport, TransportError,
    TransportKind, UiPort,
};

/// Sends envelopes to an embedded desktop host.
///
/// The envelope is `{name: operation, payload, method: verb}`. Whatever the
/// host sends back is handed to the caller untouched; interpreting `error`
/// replies is left to the layer above.
#[derive(Debug, Clone)]
pub struct DesktopTransport {
    messenger: Messenger,
}

impl DesktopTransport {
    /// Create a transport over a host messenger.
    #[must_use]
    pub const fn new(messenger: Messenger) -> Self {
        Self { messenger }
    }

    /// Create a transport from the UI end of a link.
    ///
    /// Returns the transport and the stream of host-pushed events.
    #[must_use]
    pub fn from_port(port: UiPort) -> (Self, HostEvents) {
        let (messenger, events) = port.into_parts();
        (Self::new(messenger), events)
    }
}

#[async_trait]
impl Transport for DesktopTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::DesktopBridge
    }

    async fn dispatch(&self, request: Request) -> Result<Dispatch, TransportError> {
        request.validate()?;
        let envelope = Envelope::request(&request);
        tracing::debug!(
            request_id = %request.id,
            name = %envelope.name,
            method = %request.verb,
            "sending envelope to desktop host"
        );
        let rx = self.messenger.send(envelope).await?;
        Ok(Dispatch::Pending(PendingReply::from_channel(request.id, rx)))
    }
}
