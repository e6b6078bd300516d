//! Transport bridge facade.

use std::{fmt, sync::Arc};

use elementary_core::{
    Dispatch, Envelope, Reply, Request, Transport, TransportError, TransportKind, Verb,
};
use elementary_transport::{Capabilities, select};
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::{BridgeConfig, ConfigError, HostErrorPolicy};

/// Bridge error.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("Host reported an error for {operation}: {}", describe(.payload))]
    Host {
        operation: String,
        payload: Option<Value>,
    },
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

fn describe(payload: &Option<Value>) -> String {
    match payload {
        Some(Value::String(message)) => message.clone(),
        Some(other) => other.to_string(),
        None => "no details".to_string(),
    }
}

/// Routes requests through the transport selected at startup.
///
/// Cheap to clone; clones share the transport.
#[derive(Clone)]
pub struct Bridge {
    transport: Arc<dyn Transport>,
    host_errors: HostErrorPolicy,
}

impl Bridge {
    /// Create a bridge over an already selected transport.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            host_errors: HostErrorPolicy::default(),
        }
    }

    /// Select a transport from the host capabilities plus the configured
    /// remote target.
    ///
    /// # Errors
    /// Returns error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn from_config(
        config: &BridgeConfig,
        capabilities: Capabilities,
    ) -> Result<Self, BridgeError> {
        let capabilities = capabilities.with_remote(config.remote_target()?, config.timeout());
        Ok(Self::new(select(capabilities)?).with_host_errors(config.host_errors))
    }

    /// Set the handling of host `error` replies.
    #[must_use]
    pub const fn with_host_errors(mut self, policy: HostErrorPolicy) -> Self {
        self.host_errors = policy;
        self
    }

    /// Which transport this bridge talks through.
    #[must_use]
    pub fn kind(&self) -> TransportKind {
        self.transport.kind()
    }

    /// Submit a request and return without waiting for the reply.
    ///
    /// The host error policy is not applied at this level.
    ///
    /// # Errors
    /// Returns error if the transport rejects the request.
    pub async fn dispatch(&self, request: Request) -> Result<Dispatch, BridgeError> {
        Ok(self.transport.dispatch(request).await?)
    }

    /// Submit a request and wait for its outcome.
    ///
    /// One-way transports return `Reply::Detached` right away.
    ///
    /// # Errors
    /// Returns error on transport failure, or on a host `error` reply when
    /// the policy is `Surface`.
    pub async fn invoke(&self, request: Request) -> Result<Reply, BridgeError> {
        let operation = request.operation.clone();
        let request_id = request.id;

        match self.transport.dispatch(request).await? {
            Dispatch::Detached => Ok(Reply::Detached),
            Dispatch::Pending(pending) => {
                let envelope = pending.await?;
                tracing::debug!(%request_id, reply = %envelope.name, "reply received");
                self.settle(operation, envelope)
            }
        }
    }

    /// Shorthand for [`invoke`](Self::invoke) with loose arguments.
    ///
    /// # Errors
    /// See [`invoke`](Self::invoke).
    pub async fn call(
        &self,
        verb: Verb,
        operation: &str,
        payload: Option<Value>,
    ) -> Result<Reply, BridgeError> {
        let mut request = Request::new(verb, operation);
        request.payload = payload;
        self.invoke(request).await
    }

    /// Callback-style invoke.
    ///
    /// `on_result` runs at most once, and only when a payload arrives. Every
    /// other outcome is logged and dropped.
    pub fn invoke_with<F>(&self, request: Request, on_result: F) -> JoinHandle<()>
    where
        F: FnOnce(Value) + Send + 'static,
    {
        let bridge = self.clone();
        tokio::spawn(async move {
            let operation = request.operation.clone();
            match bridge.invoke(request).await {
                Ok(Reply::Payload(payload)) => on_result(payload),
                Ok(Reply::Empty) => {
                    tracing::debug!(%operation, "reply without payload dropped");
                }
                Ok(Reply::Detached) => {}
                Err(e) => tracing::warn!(%operation, "request failed: {e}"),
            }
        })
    }

    fn settle(&self, operation: String, envelope: Envelope) -> Result<Reply, BridgeError> {
        if envelope.is_error() && self.host_errors == HostErrorPolicy::Surface {
            tracing::warn!(%operation, "host reported an error");
            return Err(BridgeError::Host {
                operation,
                payload: envelope.payload,
            });
        }
        Ok(Reply::from(envelope))
    }
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("kind", &self.kind())
            .field("host_errors", &self.host_errors)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        net::SocketAddr,
        sync::{Arc, Mutex},
    };

    use axum::{Json, Router, routing::get};
    use elementary_core::{HostPort, link};
    use elementary_host::{HandlerError, HandlerRegistry, HostEndpoint, handler_fn};
    use elementary_transport::{DesktopTransport, LegacyTransport, RemoteTarget, RemoteTransport};
    use serde_json::json;
    use url::Url;

    use super::*;

    type Calls = Arc<Mutex<Vec<Value>>>;

    fn recorder() -> (Calls, impl Fn() -> Box<dyn FnOnce(Value) + Send>) {
        let calls: Calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        let make = move || {
            let sink = Arc::clone(&sink);
            Box::new(move |v: Value| sink.lock().unwrap().push(v)) as Box<dyn FnOnce(Value) + Send>
        };
        (calls, make)
    }

    fn desktop_bridge(registry: HandlerRegistry) -> Bridge {
        let (ui, host): (_, HostPort) = link(8);
        let (_loop, _emitter) = HostEndpoint::new(registry).spawn(host);
        let (transport, _events) = DesktopTransport::from_port(ui);
        Bridge::new(Arc::new(transport))
    }

    fn host_registry() -> HandlerRegistry {
        HandlerRegistry::new()
            .with("open", handler_fn(|_: Envelope| async { Ok(Some(json!({"id": 1}))) }))
            .with("quiet", handler_fn(|_: Envelope| async { Ok(None) }))
            .with(
                "broken",
                handler_fn(|_: Envelope| async { Err(HandlerError::Failed("locked".into())) }),
            )
    }

    #[tokio::test]
    async fn test_desktop_payload_delivered_once() {
        let bridge = desktop_bridge(host_registry());
        let (calls, make) = recorder();

        let request = Request::new(Verb::Post, "open").with_payload(json!({"path": "/a"}));
        bridge.invoke_with(request, make()).await.unwrap();

        assert_eq!(*calls.lock().unwrap(), vec![json!({"id": 1})]);
    }

    #[tokio::test]
    async fn test_desktop_missing_payload_never_calls_back() {
        let bridge = desktop_bridge(host_registry());
        let (calls, make) = recorder();

        bridge
            .invoke_with(Request::new(Verb::Get, "quiet"), make())
            .await
            .unwrap();

        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(
            bridge.call(Verb::Get, "quiet", None).await.unwrap(),
            Reply::Empty
        );
    }

    #[tokio::test]
    async fn test_host_error_surfaced() {
        let bridge = desktop_bridge(host_registry());
        let err = bridge.call(Verb::Post, "broken", None).await.unwrap_err();
        assert!(matches!(
            &err,
            BridgeError::Host { operation, payload: Some(p) } if operation == "broken" && p == "locked"
        ));
        assert_eq!(err.to_string(), "Host reported an error for broken: locked");
    }

    #[tokio::test]
    async fn test_host_error_forwarded() {
        let bridge =
            desktop_bridge(host_registry()).with_host_errors(HostErrorPolicy::Forward);
        let reply = bridge.call(Verb::Post, "broken", None).await.unwrap();
        assert_eq!(reply, Reply::Payload(json!("locked")));
    }

    #[tokio::test]
    async fn test_error_reply_callback_follows_policy() {
        let (calls, make) = recorder();

        let surface = desktop_bridge(host_registry());
        surface
            .invoke_with(Request::new(Verb::Post, "broken"), make())
            .await
            .unwrap();
        assert!(calls.lock().unwrap().is_empty());

        let forward = desktop_bridge(host_registry()).with_host_errors(HostErrorPolicy::Forward);
        forward
            .invoke_with(Request::new(Verb::Post, "broken"), make())
            .await
            .unwrap();
        assert_eq!(*calls.lock().unwrap(), vec![json!("locked")]);
    }

    #[tokio::test]
    async fn test_legacy_never_calls_back() {
        let seen = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink = Arc::clone(&seen);
        let hook = move |m: &str| sink.lock().unwrap().push(m.to_string());
        let bridge = Bridge::new(Arc::new(LegacyTransport::new(Arc::new(hook))));
        let (calls, make) = recorder();

        bridge
            .invoke_with(
                Request::new(Verb::Post, "open").with_payload(json!({"path": "/a"})),
                make(),
            )
            .await
            .unwrap();

        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(*seen.lock().unwrap(), vec![r#"{"path":"/a"}"#.to_string()]);
        assert_eq!(bridge.kind(), TransportKind::LegacyInvoke);
    }

    async fn serve(router: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn test_remote_items_callback() {
        let router = Router::new().route("/api/items", get(|| async { Json(json!({"items": []})) }));
        let addr = serve(router).await;
        let origin = Url::parse(&format!("http://{addr}")).unwrap();
        let transport = RemoteTransport::new(RemoteTarget::new(origin, false)).unwrap();
        let bridge = Bridge::new(Arc::new(transport));
        let (calls, make) = recorder();

        bridge
            .invoke_with(
                Request::new(Verb::Get, "/items").with_payload(json!({})),
                make(),
            )
            .await
            .unwrap();

        assert_eq!(*calls.lock().unwrap(), vec![json!({"items": []})]);
    }

    #[tokio::test]
    async fn test_remote_failure_is_an_error_not_a_callback() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let origin = Url::parse(&format!("http://{addr}")).unwrap();
        let bridge = Bridge::new(Arc::new(
            RemoteTransport::new(RemoteTarget::new(origin, false)).unwrap(),
        ));

        let err = bridge.call(Verb::Get, "/items", None).await.unwrap_err();
        assert!(matches!(err, BridgeError::Transport(TransportError::Http(_))));
    }

    #[test]
    fn test_from_config_prefers_host_capabilities() {
        let (ui, _host) = link(1);
        let config = BridgeConfig::default();

        let desktop =
            Bridge::from_config(&config, Capabilities::new().with_desktop(ui.messenger)).unwrap();
        assert_eq!(desktop.kind(), TransportKind::DesktopBridge);

        let remote = Bridge::from_config(&config, Capabilities::new()).unwrap();
        assert_eq!(remote.kind(), TransportKind::RemoteServer);
    }
}
