//! Core abstractions for the elementary transport bridge.
//!
//! This crate provides the fundamental building blocks:
//! - `Envelope` / `Verb` - Wire types shared with the desktop host
//! - `Request` - One outbound exchange
//! - `Dispatch` / `PendingReply` / `Reply` - Explicit reply states
//! - `Transport` trait
//! - `link` - In-process UI/host message channel
//! - `ops` - Operation names and payloads both sides agree on

pub mod envelope;
pub mod link;
pub mod ops;
pub mod reply;
pub mod request;
pub mod traits;

pub use envelope::{CALLBACK_SUFFIX, ERROR_NAME, Envelope, UnknownVerb, Verb};
pub use link::{EventEmitter, HostEvents, HostPort, Incoming, Messenger, UiPort, link};
pub use ops::SaveRequest;
pub use reply::{Dispatch, PendingReply, Reply};
pub use request::{Request, RequestId};
pub use traits::{BoxError, Transport, TransportError, TransportKind};
