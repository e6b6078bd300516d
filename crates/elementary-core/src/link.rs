//! In-process message link between the UI and the desktop host.
//!
//! The UI side submits envelopes and gets a reply slot per message; the host
//! side receives them in order and may push unsolicited events (menu clicks)
//! back to the UI.

use tokio::sync::{mpsc, oneshot};

use crate::{Envelope, TransportError};

/// Create a linked UI/host pair.
///
/// `capacity` bounds the number of envelopes the host has not picked up yet.
#[must_use]
pub fn link(capacity: usize) -> (UiPort, HostPort) {
    let (outbox, inbox) = mpsc::channel(capacity.max(1));
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    let ui = UiPort {
        messenger: Messenger { outbox },
        events: HostEvents { rx: events_rx },
    };
    let host = HostPort {
        inbox,
        emitter: EventEmitter { tx: events_tx },
    };
    (ui, host)
}

/// UI end of a link.
#[derive(Debug)]
pub struct UiPort {
    pub messenger: Messenger,
    pub events: HostEvents,
}

impl UiPort {
    /// Split into the request sender and the event receiver.
    #[must_use]
    pub fn into_parts(self) -> (Messenger, HostEvents) {
        (self.messenger, self.events)
    }
}

/// Sends envelopes to the host.
#[derive(Debug, Clone)]
pub struct Messenger {
    outbox: mpsc::Sender<Incoming>,
}

impl Messenger {
    /// Submit an envelope and get the slot its reply will land in.
    ///
    /// # Errors
    /// Returns `HostClosed` if the host end has been dropped.
    pub async fn send(
        &self,
        envelope: Envelope,
    ) -> Result<oneshot::Receiver<Envelope>, TransportError> {
        let (responder, rx) = oneshot::channel();
        self.outbox
            .send(Incoming {
                envelope,
                responder,
            })
            .await
            .map_err(|e| {
                tracing::debug!(name = %e.0.envelope.name, "host link closed, envelope dropped");
                TransportError::HostClosed
            })?;
        Ok(rx)
    }

    /// Whether the host end is gone.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.outbox.is_closed()
    }
}

/// Unsolicited envelopes pushed by the host.
#[derive(Debug)]
pub struct HostEvents {
    rx: mpsc::UnboundedReceiver<Envelope>,
}

impl HostEvents {
    /// Next event, or `None` once the host is gone.
    pub async fn next(&mut self) -> Option<Envelope> {
        self.rx.recv().await
    }
}

/// Host end of a link.
#[derive(Debug)]
pub struct HostPort {
    inbox: mpsc::Receiver<Incoming>,
    emitter: EventEmitter,
}

impl HostPort {
    /// Next envelope from the UI, or `None` once every messenger is dropped.
    pub async fn recv(&mut self) -> Option<Incoming> {
        self.inbox.recv().await
    }

    /// Handle for pushing events to the UI.
    #[must_use]
    pub fn emitter(&self) -> EventEmitter {
        self.emitter.clone()
    }

    /// Split into the raw inbox and the event emitter.
    #[must_use]
    pub fn into_parts(self) -> (mpsc::Receiver<Incoming>, EventEmitter) {
        (self.inbox, self.emitter)
    }
}

/// Pushes unsolicited events to the UI.
#[derive(Debug, Clone)]
pub struct EventEmitter {
    tx: mpsc::UnboundedSender<Envelope>,
}

impl EventEmitter {
    /// Push an event. Returns `false` if the UI end is gone.
    pub fn emit(&self, envelope: Envelope) -> bool {
        match self.tx.send(envelope) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(name = %e.0.name, "UI link closed, event dropped");
                false
            }
        }
    }
}

/// Envelope received by the host, with its reply slot.
#[derive(Debug)]
pub struct Incoming {
    pub envelope: Envelope,
    responder: oneshot::Sender<Envelope>,
}

impl Incoming {
    /// Answer the message. Returns `false` if the UI stopped waiting.
    pub fn respond(self, reply: Envelope) -> bool {
        self.responder.send(reply).is_ok()
    }
}
