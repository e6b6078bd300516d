//! Operation names and payloads shared by the UI and the desktop host.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Open an existing store; payload is the store path.
pub const OPEN_STORE: &str = "open";

/// Create a new store; payload is the store path.
pub const NEW_STORE: &str = "new";

/// Import a disk image; payload is the image path.
pub const IMPORT_IMAGE: &str = "image";

/// Copy a file out of the open store; payload is a [`SaveRequest`].
pub const SAVE_FILE: &str = "save";

/// Host event: the user picked "Open" from the application menu.
pub const MENU_OPEN: &str = "menu-open";

/// Host event: the user picked "New" from the application menu.
pub const MENU_NEW: &str = "menu-new";

/// Host event: the user picked "Import disk image" from the application menu.
pub const MENU_IMAGE: &str = "menu-image";

/// Payload of [`SAVE_FILE`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveRequest {
    /// Path of the file inside the store.
    pub src: String,
    /// Destination on the local file system.
    pub dest: PathBuf,
}
