//! Host message loop.

use std::sync::Arc;

use elementary_core::{EventEmitter, HostPort, Incoming};
use futures::StreamExt;
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_stream::wrappers::ReceiverStream;

use crate::HandlerRegistry;

/// Answers envelopes arriving from the UI.
///
/// Messages are handled concurrently, so replies can complete in a
/// different order than the requests arrived.
#[derive(Debug, Clone)]
pub struct HostEndpoint {
    registry: Arc<HandlerRegistry>,
}

impl HostEndpoint {
    /// Create an endpoint over a handler registry.
    #[must_use]
    pub fn new(registry: HandlerRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// Spawn the message loop on the host end of a link.
    ///
    /// Returns the loop handle and an emitter for pushing events to the UI.
    /// The loop ends once every UI messenger is dropped.
    #[must_use]
    pub fn spawn(self, port: HostPort) -> (JoinHandle<()>, EventEmitter) {
        let (inbox, emitter) = port.into_parts();
        let handle = tokio::spawn(async move { self.serve(inbox).await });
        (handle, emitter)
    }

    /// Run the message loop until the inbox closes.
    pub async fn serve(self, inbox: mpsc::Receiver<Incoming>) {
        ReceiverStream::new(inbox)
            .for_each_concurrent(None, |incoming| {
                let registry = Arc::clone(&self.registry);
                async move {
                    let reply = registry.respond(&incoming.envelope).await;
                    let name = incoming.envelope.name.clone();
                    if !incoming.respond(reply) {
                        tracing::debug!(%name, "UI stopped waiting for reply");
                    }
                }
            })
            .await;
        tracing::debug!("host endpoint stopped");
    }
}
