//! Wire envelope exchanged with the desktop host.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::Request;

/// Envelope name the host uses to report a failed operation.
pub const ERROR_NAME: &str = "error";

/// Suffix the host appends to the operation name of a successful reply.
pub const CALLBACK_SUFFIX: &str = ".callback";

/// HTTP-style verb attached to every request.
///
/// Only the remote transport routes on it; the desktop transport copies it
/// into the envelope's `method` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl Verb {
    /// Upper-case method name as sent on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown verb.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown verb: {0}")]
pub struct UnknownVerb(pub String);

impl FromStr for Verb {
    type Err = UnknownVerb;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            _ => Err(UnknownVerb(s.to_string())),
        }
    }
}

/// Message exchanged with the desktop host, in both directions.
///
/// A missing `payload` and `"payload": null` are different things: the
/// former means the host had nothing to deliver, the latter is a `null`
/// payload that is delivered like any other value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Operation name (requests) or reply name (replies).
    pub name: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<Verb>,
}

/// Maps a present field (including `null`) to `Some`.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl Envelope {
    /// Build the outbound envelope for a request.
    #[must_use]
    pub fn request(request: &Request) -> Self {
        Self {
            name: request.operation.clone(),
            payload: request.payload.clone(),
            method: Some(request.verb),
        }
    }

    /// Reply with an arbitrary name.
    #[must_use]
    pub fn reply(name: impl Into<String>, payload: Option<Value>) -> Self {
        Self {
            name: name.into(),
            payload,
            method: None,
        }
    }

    /// Successful reply to `operation`, named `<operation>.callback`.
    #[must_use]
    pub fn callback(operation: &str, payload: Option<Value>) -> Self {
        Self::reply(format!("{operation}{CALLBACK_SUFFIX}"), payload)
    }

    /// Error reply carrying a human readable message.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::reply(ERROR_NAME, Some(Value::String(message.into())))
    }

    /// Whether the host flagged this reply as an application error.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.name == ERROR_NAME
    }
}
