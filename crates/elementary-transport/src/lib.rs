//! Concrete transports for the elementary bridge.
//!
//! Provides:
//! - Desktop-Bridge transport (envelopes over an in-process link)
//! - Legacy-Invoke transport (one-way host hook)
//! - Remote-Server transport (feature: remote)
//! - Capability-based selection

pub mod desktop;
pub mod legacy;
pub mod select;

#[cfg(feature = "remote")]
pub mod remote;

pub use desktop::DesktopTransport;
pub use legacy::{LegacyHook, LegacyTransport};
pub use select::{Capabilities, select};

#[cfg(feature = "remote")]
pub use remote::{API_PREFIX, DEV_SERVER_PORT, RemoteTarget, RemoteTransport};
