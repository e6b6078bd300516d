//! Message handlers run by the desktop host.

use std::future::Future;

use async_trait::async_trait;
use elementary_core::{Envelope, TransportError};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::SaveError;

/// Handler error.
///
/// The host reports it to the UI as an `error` envelope carrying the
/// display text.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("No handler for {0}")]
    Unhandled(String),
    #[error("Missing payload")]
    MissingPayload,
    #[error("Invalid payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
    #[error(transparent)]
    Save(#[from] SaveError),
    #[error("Forwarding to API failed: {0}")]
    Forward(#[from] TransportError),
    #[error("{0}")]
    Failed(String),
}

/// Trait for handling one kind of envelope.
///
/// Return `Ok(Some(payload))` to answer with data, `Ok(None)` to answer
/// without payload.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: &Envelope) -> Result<Option<Value>, HandlerError>;
}

/// Handler backed by an async closure.
pub struct FnHandler<F>(F);

/// Wrap an async closure as a [`MessageHandler`].
pub const fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(Envelope) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<Value>, HandlerError>> + Send + 'static,
{
    FnHandler(f)
}

#[async_trait]
impl<F, Fut> MessageHandler for FnHandler<F>
where
    F: Fn(Envelope) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<Value>, HandlerError>> + Send + 'static,
{
    async fn handle(&self, message: &Envelope) -> Result<Option<Value>, HandlerError> {
        (self.0)(message.clone()).await
    }
}

/// Decode the payload of a message.
///
/// # Errors
/// Returns error if the payload is missing or has the wrong shape.
pub fn parse_payload<T: DeserializeOwned>(message: &Envelope) -> Result<T, HandlerError> {
    let payload = message.payload.clone().ok_or(HandlerError::MissingPayload)?;
    Ok(serde_json::from_value(payload)?)
}
