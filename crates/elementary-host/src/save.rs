//! `save` handler: copy a file out of the open store.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use elementary_core::{Envelope, SaveRequest};
use serde_json::Value;

use thiserror::Error;

use crate::{HandlerError, MessageHandler, parse_payload};

/// Save handler error.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("Path outside of store: {0}")]
    OutsideStore(String),
    #[error("Copying {src} failed: {source}")]
    Copy {
        src: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Copies `src` (relative to the store root) to `dest`.
///
/// Answers without payload on success.
#[derive(Debug, Clone)]
pub struct SaveHandler {
    root: PathBuf,
}

impl SaveHandler {
    /// Create a handler for the store at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a store path. A leading `/` refers to the store root.
    ///
    /// # Errors
    /// Returns error if the path leaves the store.
    pub fn resolve(&self, src: &str) -> Result<PathBuf, SaveError> {
        let relative = Path::new(src.trim_start_matches('/'));
        let inside = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !inside || relative.as_os_str().is_empty() {
            return Err(SaveError::OutsideStore(src.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl MessageHandler for SaveHandler {
    async fn handle(&self, message: &Envelope) -> Result<Option<Value>, HandlerError> {
        let request: SaveRequest = parse_payload(message)?;
        let src = self.resolve(&request.src)?;
        let bytes = tokio::fs::copy(&src, &request.dest)
            .await
            .map_err(|source| SaveError::Copy {
                src: src.clone(),
                source,
            })?;
        tracing::info!(src = %src.display(), dest = %request.dest.display(), bytes, "saved file");
        Ok(None)
    }
}
