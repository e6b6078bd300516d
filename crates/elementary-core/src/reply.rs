//! Explicit reply states.
//!
//! A dispatched request is in exactly one of three states:
//! - detached: the transport is one-way, no reply will ever come
//! - pending: a reply may still arrive
//! - delivered: the reply (or the transport failure) is available

use std::{
    fmt,
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use futures::{FutureExt, future::BoxFuture};
use serde_json::Value;
use tokio::sync::oneshot;

use crate::{Envelope, RequestId, TransportError};

/// Result of submitting a request to a transport.
#[derive(Debug)]
pub enum Dispatch {
    /// One-way transport; nothing will come back.
    Detached,
    /// A reply is outstanding.
    Pending(PendingReply),
}

impl Dispatch {
    /// Wait for the outcome.
    ///
    /// # Errors
    /// Returns error if the transport fails before a reply arrives.
    pub async fn resolve(self) -> Result<Reply, TransportError> {
        match self {
            Self::Detached => Ok(Reply::Detached),
            Self::Pending(pending) => pending.await.map(Reply::from),
        }
    }
}

/// Handle to an outstanding reply.
///
/// Resolves to the reply envelope. A reply that never comes leaves this
/// pending forever; there is no timeout at this layer.
pub struct PendingReply {
    request_id: RequestId,
    reply: BoxFuture<'static, Result<Envelope, TransportError>>,
}

impl PendingReply {
    /// Wrap an arbitrary future producing the reply envelope.
    #[must_use]
    pub fn new<F>(request_id: RequestId, reply: F) -> Self
    where
        F: Future<Output = Result<Envelope, TransportError>> + Send + 'static,
    {
        Self {
            request_id,
            reply: reply.boxed(),
        }
    }

    /// Await a oneshot reply slot. A dropped sender maps to `HostClosed`.
    #[must_use]
    pub fn from_channel(request_id: RequestId, rx: oneshot::Receiver<Envelope>) -> Self {
        Self::new(request_id, async move {
            rx.await.map_err(|_| TransportError::HostClosed)
        })
    }

    /// Request this reply belongs to.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Take the reply if it has already arrived, otherwise hand the handle back.
    ///
    /// # Errors
    /// Returns the unchanged handle while the reply is still pending.
    pub fn try_take(mut self) -> Result<Result<Envelope, TransportError>, Self> {
        match self.reply.as_mut().now_or_never() {
            Some(result) => Ok(result),
            None => Err(self),
        }
    }
}

impl Future for PendingReply {
    type Output = Result<Envelope, TransportError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.reply.as_mut().poll(cx)
    }
}

impl fmt::Debug for PendingReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingReply")
            .field("request_id", &self.request_id)
            .finish_non_exhaustive()
    }
}

/// Final outcome of one exchange.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// The backend answered with a payload.
    Payload(Value),
    /// The backend answered without a payload.
    Empty,
    /// The transport is one-way.
    Detached,
}

impl Reply {
    /// Borrow the payload, if any.
    #[must_use]
    pub const fn payload(&self) -> Option<&Value> {
        match self {
            Self::Payload(v) => Some(v),
            Self::Empty | Self::Detached => None,
        }
    }

    /// Take the payload, if any.
    #[must_use]
    pub fn into_payload(self) -> Option<Value> {
        match self {
            Self::Payload(v) => Some(v),
            Self::Empty | Self::Detached => None,
        }
    }
}

impl From<Envelope> for Reply {
    fn from(envelope: Envelope) -> Self {
        envelope.payload.map_or(Self::Empty, Self::Payload)
    }
}
