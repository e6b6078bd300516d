//! Outbound request.

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::{TransportError, Verb};

/// Request identifier, used to correlate log lines.
pub type RequestId = Uuid;

/// One request/response exchange.
///
/// The operation name is routed verbatim: the desktop host sees it as the
/// envelope name, the remote server as the path after `/api`.
#[derive(Debug, Clone)]
pub struct Request {
    /// Identifier for tracing.
    pub id: RequestId,
    /// HTTP-style verb.
    pub verb: Verb,
    /// Name of the requested action.
    pub operation: String,
    /// Opaque payload, absent when the caller has nothing to send.
    pub payload: Option<Value>,
}

impl Request {
    /// Create a request without payload.
    #[must_use]
    pub fn new(verb: Verb, operation: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            verb,
            operation: operation.into(),
            payload: None,
        }
    }

    /// Attach a payload.
    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Attach any serializable payload.
    ///
    /// # Errors
    /// Returns error if the payload cannot be represented as JSON.
    pub fn with_serialized<T: Serialize>(self, payload: &T) -> Result<Self, serde_json::Error> {
        Ok(self.with_payload(serde_json::to_value(payload)?))
    }

    /// Reject requests no transport can route.
    ///
    /// # Errors
    /// Returns error if the operation name is empty or blank.
    pub fn validate(&self) -> Result<(), TransportError> {
        if self.operation.trim().is_empty() {
            return Err(TransportError::InvalidOperation(self.operation.clone()));
        }
        Ok(())
    }
}
