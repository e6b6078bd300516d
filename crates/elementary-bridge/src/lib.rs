//! UI-facing side of the elementary transport bridge.
//!
//! Provides:
//! - `Bridge` - `invoke` through whichever transport the host offers
//! - `BridgeConfig` - environment driven configuration
//! - `StoreCommands` - open/create/import/save commands and menu handling

pub mod bridge;
pub mod config;
pub mod menu;
pub mod store;

pub use bridge::{Bridge, BridgeError};
pub use config::{BridgeConfig, ConfigError, HostErrorPolicy};
pub use menu::MenuEvent;
pub use store::{Dialog, DialogError, StoreCommands, StoreError, StoreOutcome};
