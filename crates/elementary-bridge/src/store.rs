//! Forensic store commands issued from the UI.
//!
//! Each command asks the user for a path, then sends one message to the
//! desktop host. A cancelled dialog sends nothing.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use elementary_core::{Dispatch, HostEvents, Request, SaveRequest, TransportError, Verb, ops};
use serde_json::Value;
use thiserror::Error;

use crate::{Bridge, BridgeConfig, BridgeError, MenuEvent};

/// Dialog error.
#[derive(Debug, Error)]
pub enum DialogError {
    #[error("Dialog unavailable: {0}")]
    Unavailable(String),
    #[error("Dialog failed: {0}")]
    Failed(String),
}

/// Native file dialogs. `Ok(None)` means the user cancelled.
#[async_trait]
pub trait Dialog: Send + Sync {
    /// Choose an existing file.
    async fn pick_file(&self) -> Result<Option<PathBuf>, DialogError>;

    /// Choose a location for a new file.
    async fn pick_save_path(&self) -> Result<Option<PathBuf>, DialogError>;
}

/// Store error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Dialog error: {0}")]
    Dialog(#[from] DialogError),
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),
    #[error("Host rejected {operation}: {message}")]
    Host { operation: String, message: String },
    #[error("Path is not valid UTF-8: {0}")]
    NonUtf8Path(PathBuf),
    #[error("Disk image import is disabled")]
    Disabled,
}

/// Result of a store command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOutcome {
    Opened(PathBuf),
    Created(PathBuf),
    Imported(PathBuf),
    Saved(PathBuf),
    Cancelled,
}

/// Store commands over a bridge.
#[derive(Debug, Clone)]
pub struct StoreCommands<D> {
    bridge: Bridge,
    dialog: D,
    image_import: bool,
}

impl<D: Dialog> StoreCommands<D> {
    /// Create store commands. Disk image import starts disabled.
    #[must_use]
    pub const fn new(bridge: Bridge, dialog: D) -> Self {
        Self {
            bridge,
            dialog,
            image_import: false,
        }
    }

    /// Create store commands with the settings in `config`.
    #[must_use]
    pub const fn from_config(bridge: Bridge, dialog: D, config: &BridgeConfig) -> Self {
        Self::new(bridge, dialog).with_image_import(config.image_import)
    }

    /// Enable or disable disk image import.
    #[must_use]
    pub const fn with_image_import(mut self, enabled: bool) -> Self {
        self.image_import = enabled;
        self
    }

    /// Open an existing store.
    ///
    /// # Errors
    /// Returns error if the dialog fails or the host rejects the store.
    pub async fn open_store(&self) -> Result<StoreOutcome, StoreError> {
        match self.dialog.pick_file().await? {
            Some(path) => {
                self.send_path(ops::OPEN_STORE, &path).await?;
                Ok(StoreOutcome::Opened(path))
            }
            None => Ok(StoreOutcome::Cancelled),
        }
    }

    /// Create a new store.
    ///
    /// # Errors
    /// Returns error if the dialog fails or the host cannot create the store.
    pub async fn create_store(&self) -> Result<StoreOutcome, StoreError> {
        match self.dialog.pick_save_path().await? {
            Some(path) => {
                self.send_path(ops::NEW_STORE, &path).await?;
                Ok(StoreOutcome::Created(path))
            }
            None => Ok(StoreOutcome::Cancelled),
        }
    }

    /// Import a disk image into the open store.
    ///
    /// # Errors
    /// Returns `StoreError::Disabled` unless import was enabled, otherwise
    /// the same errors as [`open_store`](Self::open_store).
    pub async fn import_image(&self) -> Result<StoreOutcome, StoreError> {
        if !self.image_import {
            return Err(StoreError::Disabled);
        }
        match self.dialog.pick_file().await? {
            Some(path) => {
                self.send_path(ops::IMPORT_IMAGE, &path).await?;
                Ok(StoreOutcome::Imported(path))
            }
            None => Ok(StoreOutcome::Cancelled),
        }
    }

    /// Copy `src` out of the open store to `dest`.
    ///
    /// # Errors
    /// Returns error if the host cannot copy the file.
    pub async fn save_file(
        &self,
        src: impl Into<String>,
        dest: impl Into<PathBuf>,
    ) -> Result<StoreOutcome, StoreError> {
        let save = SaveRequest {
            src: src.into(),
            dest: dest.into(),
        };
        let request = Request::new(Verb::Post, ops::SAVE_FILE)
            .with_serialized(&save)
            .map_err(|e| BridgeError::from(TransportError::from(e)))?;
        self.send(request).await?;
        Ok(StoreOutcome::Saved(save.dest))
    }

    /// Run the command bound to a menu entry.
    ///
    /// # Errors
    /// See the individual commands.
    pub async fn on_menu(&self, event: MenuEvent) -> Result<StoreOutcome, StoreError> {
        match event {
            MenuEvent::Open => self.open_store().await,
            MenuEvent::New => self.create_store().await,
            MenuEvent::ImportImage => self.import_image().await,
        }
    }

    /// Handle host menu events until the host goes away.
    pub async fn run_menu(&self, mut events: HostEvents) {
        while let Some(envelope) = events.next().await {
            let Some(event) = MenuEvent::from_envelope(&envelope) else {
                tracing::debug!(name = %envelope.name, "ignoring host event");
                continue;
            };
            match self.on_menu(event).await {
                Ok(outcome) => tracing::info!(?event, ?outcome, "menu command finished"),
                Err(e) => tracing::warn!(?event, "menu command failed: {e}"),
            }
        }
        tracing::debug!("host event stream closed");
    }

    async fn send_path(&self, operation: &str, path: &Path) -> Result<(), StoreError> {
        let text = path
            .to_str()
            .ok_or_else(|| StoreError::NonUtf8Path(path.to_path_buf()))?;
        let request = Request::new(Verb::Post, operation).with_payload(Value::from(text));
        self.send(request).await
    }

    /// Send and wait for the host. Error replies fail the command whatever
    /// the bridge policy is.
    async fn send(&self, request: Request) -> Result<(), StoreError> {
        let operation = request.operation.clone();
        let pending = match self.bridge.dispatch(request).await? {
            Dispatch::Detached => return Ok(()),
            Dispatch::Pending(pending) => pending,
        };
        let envelope = pending.await.map_err(BridgeError::from)?;
        if envelope.is_error() {
            let message = match envelope.payload {
                Some(Value::String(message)) => message,
                Some(other) => other.to_string(),
                None => String::new(),
            };
            return Err(StoreError::Host { operation, message });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use elementary_core::{Envelope, EventEmitter, link};
    use elementary_host::{HandlerError, HandlerRegistry, HostEndpoint, SaveHandler, handler_fn};
    use elementary_transport::{DesktopTransport, LegacyTransport};
    use serde_json::json;

    use super::*;
    use crate::HostErrorPolicy;

    /// Answers every dialog with the next queued path.
    #[derive(Default)]
    struct FakeDialog {
        answers: Mutex<Vec<Option<PathBuf>>>,
    }

    impl FakeDialog {
        fn answering(answers: Vec<Option<PathBuf>>) -> Self {
            Self {
                answers: Mutex::new(answers.into_iter().rev().collect()),
            }
        }

        fn next(&self) -> Result<Option<PathBuf>, DialogError> {
            self.answers
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| DialogError::Failed("no answer queued".into()))
        }
    }

    #[async_trait]
    impl Dialog for FakeDialog {
        async fn pick_file(&self) -> Result<Option<PathBuf>, DialogError> {
            self.next()
        }

        async fn pick_save_path(&self) -> Result<Option<PathBuf>, DialogError> {
            self.next()
        }
    }

    type Seen = Arc<Mutex<Vec<Envelope>>>;

    /// Desktop bridge whose host records every message and rejects `locked`.
    fn recording_host(
        registry: HandlerRegistry,
        seen: &Seen,
    ) -> (Bridge, HostEvents, EventEmitter) {
        let sink = Arc::clone(seen);
        let registry = registry.with_fallback(handler_fn(move |m: Envelope| {
            let sink = Arc::clone(&sink);
            async move {
                let locked = m.payload == Some(json!("/locked"));
                sink.lock().unwrap().push(m);
                if locked {
                    return Err(HandlerError::Failed("store is locked".into()));
                }
                Ok(None)
            }
        }));
        let (ui, host) = link(8);
        let (_loop, emitter) = HostEndpoint::new(registry).spawn(host);
        let (transport, events) = DesktopTransport::from_port(ui);
        (Bridge::new(Arc::new(transport)), events, emitter)
    }

    #[tokio::test]
    async fn test_open_store_sends_path() {
        let seen = Seen::default();
        let (bridge, _events, _emitter) = recording_host(HandlerRegistry::new(), &seen);
        let dialog = FakeDialog::answering(vec![Some("/cases/a.forensicstore".into())]);
        let store = StoreCommands::new(bridge, dialog);

        let outcome = store.open_store().await.unwrap();

        assert_eq!(outcome, StoreOutcome::Opened("/cases/a.forensicstore".into()));
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].name, "open");
        assert_eq!(seen[0].payload, Some(json!("/cases/a.forensicstore")));
    }

    #[tokio::test]
    async fn test_cancelled_dialog_sends_nothing() {
        let seen = Seen::default();
        let (bridge, _events, _emitter) = recording_host(HandlerRegistry::new(), &seen);
        let store = StoreCommands::new(bridge, FakeDialog::answering(vec![None, None]));

        assert_eq!(store.open_store().await.unwrap(), StoreOutcome::Cancelled);
        assert_eq!(store.create_store().await.unwrap(), StoreOutcome::Cancelled);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_host_error_is_surfaced_even_when_forwarding() {
        let seen = Seen::default();
        let (bridge, _events, _emitter) = recording_host(HandlerRegistry::new(), &seen);
        let bridge = bridge.with_host_errors(HostErrorPolicy::Forward);
        let store = StoreCommands::new(bridge, FakeDialog::answering(vec![Some("/locked".into())]));

        let err = store.create_store().await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Host { ref operation, ref message } if operation == "new" && message == "store is locked"
        ));
    }

    #[tokio::test]
    async fn test_dialog_failure() {
        let seen = Seen::default();
        let (bridge, _events, _emitter) = recording_host(HandlerRegistry::new(), &seen);
        let store = StoreCommands::new(bridge, FakeDialog::default());

        assert!(matches!(
            store.open_store().await,
            Err(StoreError::Dialog(DialogError::Failed(_)))
        ));
    }

    #[tokio::test]
    async fn test_image_import_gated() {
        let seen = Seen::default();
        let (bridge, _events, _emitter) = recording_host(HandlerRegistry::new(), &seen);
        let dialog = FakeDialog::answering(vec![Some("/images/disk.dd".into())]);
        let store = StoreCommands::new(bridge, dialog);

        assert!(matches!(store.import_image().await, Err(StoreError::Disabled)));

        let store = store.with_image_import(true);
        assert_eq!(
            store.import_image().await.unwrap(),
            StoreOutcome::Imported("/images/disk.dd".into())
        );
        assert_eq!(seen.lock().unwrap()[0].name, "image");
    }

    #[tokio::test]
    async fn test_image_import_follows_config() {
        let seen = Seen::default();
        let (bridge, _events, _emitter) = recording_host(HandlerRegistry::new(), &seen);
        let dialog = || FakeDialog::answering(vec![Some("/images/disk.dd".into())]);

        let store = StoreCommands::from_config(bridge.clone(), dialog(), &BridgeConfig::default());
        assert!(matches!(
            store.on_menu(MenuEvent::ImportImage).await,
            Err(StoreError::Disabled)
        ));

        let config = BridgeConfig::from_lookup(|key| {
            (key == crate::config::ENV_IMAGE_IMPORT).then(|| "1".to_string())
        })
        .unwrap();
        let store = StoreCommands::from_config(bridge, dialog(), &config);
        assert_eq!(
            store.on_menu(MenuEvent::ImportImage).await.unwrap(),
            StoreOutcome::Imported("/images/disk.dd".into())
        );

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].name, "image");
        assert_eq!(seen[0].payload, Some(json!("/images/disk.dd")));
    }

    #[tokio::test]
    async fn test_save_file_through_host() {
        let root = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        tokio::fs::write(root.path().join("report.txt"), b"findings")
            .await
            .unwrap();

        let seen = Seen::default();
        let registry = HandlerRegistry::new().with("save", SaveHandler::new(root.path()));
        let (bridge, _events, _emitter) = recording_host(registry, &seen);
        let store = StoreCommands::new(bridge, FakeDialog::default());

        let dest = out.path().join("report.txt");
        let outcome = store.save_file("/report.txt", &dest).await.unwrap();

        assert_eq!(outcome, StoreOutcome::Saved(dest.clone()));
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"findings");

        let err = store.save_file("/../escape", &dest).await.unwrap_err();
        assert!(matches!(err, StoreError::Host { .. }));
    }

    #[tokio::test]
    async fn test_legacy_host_is_fire_and_forget() {
        let seen = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink = Arc::clone(&seen);
        let hook = move |m: &str| sink.lock().unwrap().push(m.to_string());
        let bridge = Bridge::new(Arc::new(LegacyTransport::new(Arc::new(hook))));
        let store = StoreCommands::new(bridge, FakeDialog::answering(vec![Some("/a".into())]));

        assert_eq!(store.open_store().await.unwrap(), StoreOutcome::Opened("/a".into()));
        assert_eq!(*seen.lock().unwrap(), vec![r#""/a""#.to_string()]);
    }

    #[tokio::test]
    async fn test_menu_events_run_commands() {
        let seen = Seen::default();
        let (bridge, events, emitter) = recording_host(HandlerRegistry::new(), &seen);
        let dialog = FakeDialog::answering(vec![Some("/new.forensicstore".into())]);
        let store = StoreCommands::new(bridge, dialog);

        assert!(emitter.emit(Envelope::reply("menu-close", None)));
        assert!(emitter.emit(Envelope::reply("menu-new", None)));
        drop(emitter);

        tokio::time::timeout(std::time::Duration::from_secs(1), store.run_menu(events))
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].name, "new");
    }
}
