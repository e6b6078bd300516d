//! Transport trait and its error type.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Dispatch, Request};

/// Boxed error from an underlying client library.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The runtime context a transport talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportKind {
    /// Embedded privileged host reached through a message channel.
    DesktopBridge,
    /// One-way global callback provided by some embedding hosts.
    LegacyInvoke,
    /// Conventional HTTP backend.
    RemoteServer,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::DesktopBridge => "desktop-bridge",
            Self::LegacyInvoke => "legacy-invoke",
            Self::RemoteServer => "remote-server",
        })
    }
}

/// Transport error.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid operation name: {0:?}")]
    InvalidOperation(String),
    #[error("No transport available")]
    Unavailable,
    #[error("Host channel closed")]
    HostClosed,
    #[error("Invalid URL: {0}")]
    Url(String),
    #[error("HTTP request failed: {0}")]
    Http(#[source] BoxError),
    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Trait for request transports.
///
/// `dispatch` hands the request to the backend and returns as soon as it
/// has been submitted. Whether a reply follows is encoded in [`Dispatch`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Which environment this transport serves.
    fn kind(&self) -> TransportKind;

    /// Submit a request.
    async fn dispatch(&self, request: Request) -> Result<Dispatch, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn kind(&self) -> TransportKind {
        (**self).kind()
    }

    async fn dispatch(&self, request: Request) -> Result<Dispatch, TransportError> {
        (**self).dispatch(request).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    fn kind(&self) -> TransportKind {
        (**self).kind()
    }

    async fn dispatch(&self, request: Request) -> Result<Dispatch, TransportError> {
        (**self).dispatch(request).await
    }
}
