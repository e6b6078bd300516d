//! Transport selection from host capabilities.

use std::{fmt, sync::Arc};

#[cfg(feature = "remote")]
use std::time::Duration;

use elementary_core::{Messenger, Transport, TransportError, TransportKind};

use crate::{DesktopTransport, LegacyHook, LegacyTransport};
#[cfg(feature = "remote")]
use crate::{RemoteTarget, RemoteTransport};

/// What the embedding host made available at startup.
///
/// Built once when the process starts; [`select`] turns it into the single
/// transport the rest of the program holds on to.
#[derive(Default)]
pub struct Capabilities {
    desktop: Option<Messenger>,
    legacy: Option<Arc<dyn LegacyHook>>,
    #[cfg(feature = "remote")]
    remote: Option<(RemoteTarget, Option<Duration>)>,
}

impl Capabilities {
    /// No capabilities.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An embedded desktop host is reachable.
    #[must_use]
    pub fn with_desktop(mut self, messenger: Messenger) -> Self {
        self.desktop = Some(messenger);
        self
    }

    /// The host injected a legacy one-way hook.
    #[must_use]
    pub fn with_legacy(mut self, hook: Arc<dyn LegacyHook>) -> Self {
        self.legacy = Some(hook);
        self
    }

    /// An HTTP backend is reachable relative to the UI origin.
    #[cfg(feature = "remote")]
    #[must_use]
    pub fn with_remote(mut self, target: RemoteTarget, timeout: Option<Duration>) -> Self {
        self.remote = Some((target, timeout));
        self
    }

    /// Highest-priority transport these capabilities allow.
    #[must_use]
    pub fn preferred(&self) -> Option<TransportKind> {
        if self.desktop.is_some() {
            return Some(TransportKind::DesktopBridge);
        }
        if self.legacy.is_some() {
            return Some(TransportKind::LegacyInvoke);
        }
        #[cfg(feature = "remote")]
        if self.remote.is_some() {
            return Some(TransportKind::RemoteServer);
        }
        None
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Capabilities");
        s.field("desktop", &self.desktop.is_some())
            .field("legacy", &self.legacy.is_some());
        #[cfg(feature = "remote")]
        s.field("remote", &self.remote);
        s.finish()
    }
}

/// Pick the transport: desktop host first, then the legacy hook, then HTTP.
///
/// # Errors
/// Returns `Unavailable` if no capability is present, or the error from
/// building the HTTP client.
pub fn select(capabilities: Capabilities) -> Result<Arc<dyn Transport>, TransportError> {
    let Capabilities {
        desktop,
        legacy,
        #[cfg(feature = "remote")]
        remote,
    } = capabilities;

    if let Some(messenger) = desktop {
        return Ok(announce(Arc::new(DesktopTransport::new(messenger))));
    }
    if let Some(hook) = legacy {
        return Ok(announce(Arc::new(LegacyTransport::new(hook))));
    }
    #[cfg(feature = "remote")]
    if let Some((target, timeout)) = remote {
        let transport = RemoteTransport::with_timeout(target, timeout)?;
        return Ok(announce(Arc::new(transport)));
    }
    Err(TransportError::Unavailable)
}

fn announce(transport: Arc<dyn Transport>) -> Arc<dyn Transport> {
    tracing::info!(kind = %transport.kind(), "selected transport");
    transport
}

#[cfg(all(test, feature = "remote"))]
mod tests {
    use elementary_core::link;
    use url::Url;

    use super::*;

    fn remote() -> RemoteTarget {
        RemoteTarget::new(Url::parse("https://app.local").unwrap(), false)
    }

    fn hook() -> Arc<dyn LegacyHook> {
        Arc::new(|_: &str| {})
    }

    #[tokio::test]
    async fn test_desktop_wins_over_everything() {
        let (ui, _host) = link(1);
        let caps = Capabilities::new()
            .with_remote(remote(), None)
            .with_legacy(hook())
            .with_desktop(ui.messenger);
        assert_eq!(caps.preferred(), Some(TransportKind::DesktopBridge));
        assert_eq!(select(caps).unwrap().kind(), TransportKind::DesktopBridge);
    }

    #[test]
    fn test_legacy_wins_over_remote() {
        let caps = Capabilities::new()
            .with_remote(remote(), None)
            .with_legacy(hook());
        assert_eq!(select(caps).unwrap().kind(), TransportKind::LegacyInvoke);
    }

    #[test]
    fn test_remote_is_the_fallback() {
        let caps = Capabilities::new().with_remote(remote(), None);
        assert_eq!(caps.preferred(), Some(TransportKind::RemoteServer));
        assert_eq!(select(caps).unwrap().kind(), TransportKind::RemoteServer);
    }

    #[test]
    fn test_nothing_available() {
        let caps = Capabilities::new();
        assert_eq!(caps.preferred(), None);
        assert!(matches!(select(caps), Err(TransportError::Unavailable)));
    }
}
