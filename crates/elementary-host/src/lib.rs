//! Desktop host side of the elementary bridge.
//!
//! Provides:
//! - `MessageHandler` trait and closure adapter
//! - `HandlerRegistry` - name-based routing with `.callback` / `error` replies
//! - `HostEndpoint` - concurrent message loop over a link
//! - `SaveHandler` - copy a file out of the open store
//! - `ApiForwardHandler` - route remaining names to the store's HTTP API

pub mod endpoint;
pub mod forward;
pub mod handler;
pub mod registry;
pub mod save;

pub use endpoint::HostEndpoint;
pub use forward::ApiForwardHandler;
pub use handler::{FnHandler, HandlerError, MessageHandler, handler_fn, parse_payload};
pub use registry::HandlerRegistry;
pub use save::{SaveError, SaveHandler};
