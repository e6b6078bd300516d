//! Remote-Server transport over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use elementary_core::{
    Dispatch, Envelope, PendingReply, Request, Transport, TransportError, TransportKind, Verb,
};
use reqwest::{Client, Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

/// Port of the API server next to a development UI server.
pub const DEV_SERVER_PORT: u16 = 8081;

/// Path prefix of every API route.
pub const API_PREFIX: &str = "/api";

/// Where the HTTP backend lives, relative to the page serving the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTarget {
    /// Origin the UI was loaded from.
    pub origin: Url,
    /// Set when the UI runs under a local development server.
    #[serde(default)]
    pub dev_server: bool,
}

impl RemoteTarget {
    /// Create a target for a UI origin.
    #[must_use]
    pub const fn new(origin: Url, dev_server: bool) -> Self {
        Self { origin, dev_server }
    }

    /// Base address requests are sent to.
    ///
    /// Development mode talks to `http://<page-host>:8081`; otherwise the
    /// backend shares the page's origin.
    ///
    /// # Errors
    /// Returns error if the origin has no host.
    pub fn base(&self) -> Result<String, TransportError> {
        if self.dev_server {
            let host = self
                .origin
                .host_str()
                .ok_or_else(|| TransportError::Url(format!("origin {} has no host", self.origin)))?;
            return Ok(format!("http://{host}:{DEV_SERVER_PORT}"));
        }

        let origin = self.origin.origin();
        if !origin.is_tuple() {
            return Err(TransportError::Url(format!(
                "origin {} is opaque",
                self.origin
            )));
        }
        Ok(origin.ascii_serialization())
    }

    /// Full URL for an operation: `<base>/api<operation>`.
    ///
    /// # Errors
    /// Returns error if the operation does not start with `/` or the result
    /// is not a valid URL.
    pub fn endpoint(&self, operation: &str) -> Result<Url, TransportError> {
        if !operation.starts_with('/') {
            return Err(TransportError::InvalidOperation(operation.to_string()));
        }
        let raw = format!("{}{API_PREFIX}{operation}", self.base()?);
        Url::parse(&raw).map_err(|e| TransportError::Url(format!("{raw}: {e}")))
    }
}

/// HTTP transport.
///
/// Every dispatch is sent on a spawned task, so the caller never waits on
/// the network to get its [`PendingReply`].
#[derive(Debug, Clone)]
pub struct RemoteTransport {
    client: Client,
    target: RemoteTarget,
}

impl RemoteTransport {
    /// Create a transport without request timeout.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(target: RemoteTarget) -> Result<Self, TransportError> {
        Self::with_timeout(target, None)
    }

    /// Create a transport with an optional per-request timeout.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn with_timeout(
        target: RemoteTarget,
        timeout: Option<Duration>,
    ) -> Result<Self, TransportError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| TransportError::Http(e.into()))?;
        Ok(Self::with_client(client, target))
    }

    /// Create a transport over an existing client.
    #[must_use]
    pub const fn with_client(client: Client, target: RemoteTarget) -> Self {
        Self { client, target }
    }

    /// Target this transport sends to.
    #[must_use]
    pub const fn target(&self) -> &RemoteTarget {
        &self.target
    }
}

#[async_trait]
impl Transport for RemoteTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::RemoteServer
    }

    async fn dispatch(&self, request: Request) -> Result<Dispatch, TransportError> {
        request.validate()?;
        let url = self.target.endpoint(&request.operation)?;
        tracing::debug!(request_id = %request.id, method = %request.verb, %url, "sending HTTP request");

        let mut builder = self.client.request(method(request.verb), url);
        if let Some(payload) = &request.payload {
            builder = builder.json(payload);
        }

        let operation = request.operation;
        let handle = tokio::spawn(async move { send(builder, &operation).await });

        Ok(Dispatch::Pending(PendingReply::new(request.id, async move {
            handle.await.map_err(|e| TransportError::Http(e.into()))?
        })))
    }
}

async fn send(builder: RequestBuilder, operation: &str) -> Result<Envelope, TransportError> {
    let response = builder
        .send()
        .await
        .map_err(|e| TransportError::Http(e.into()))?;
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| TransportError::Http(e.into()))?;

    if !status.is_success() {
        tracing::warn!(%status, operation, "HTTP request rejected");
        return Err(TransportError::Status {
            status: status.as_u16(),
            body,
        });
    }

    Ok(Envelope::callback(operation, Some(parse_body(&body))))
}

/// JSON when possible, raw text otherwise, `null` for an empty body.
fn parse_body(body: &str) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

fn method(verb: Verb) -> Method {
    match verb {
        Verb::Get => Method::GET,
        Verb::Post => Method::POST,
        Verb::Put => Method::PUT,
        Verb::Patch => Method::PATCH,
        Verb::Delete => Method::DELETE,
        Verb::Head => Method::HEAD,
        Verb::Options => Method::OPTIONS,
    }
}
