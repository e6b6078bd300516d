//! Bridge configuration.

use std::{str::FromStr, time::Duration};

use elementary_transport::RemoteTarget;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Origin assumed when none is configured.
pub const DEFAULT_ORIGIN: &str = "http://localhost";

pub const ENV_ORIGIN: &str = "ELEMENTARY_ORIGIN";
pub const ENV_DEV_SERVER: &str = "ELEMENTARY_DEV_SERVER";
pub const ENV_HOST_ERRORS: &str = "ELEMENTARY_HOST_ERRORS";
pub const ENV_TIMEOUT_MS: &str = "ELEMENTARY_TIMEOUT_MS";
pub const ENV_IMAGE_IMPORT: &str = "ELEMENTARY_IMAGE_IMPORT";

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("Invalid origin: {0}")]
    Origin(#[from] url::ParseError),
}

/// What to do with `error` replies from the desktop host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostErrorPolicy {
    /// Fail the call with `BridgeError::Host`.
    #[default]
    Surface,
    /// Deliver the error payload like any other reply.
    Forward,
}

impl FromStr for HostErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "surface" => Ok(Self::Surface),
            "forward" => Ok(Self::Forward),
            other => Err(format!("expected `surface` or `forward`, got `{other}`")),
        }
    }
}

/// Bridge configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Origin the UI is served from; [`DEFAULT_ORIGIN`] when unset.
    pub origin: Option<Url>,
    /// The UI runs under a local development server.
    pub dev_server: bool,
    /// Handling of host `error` replies.
    pub host_errors: HostErrorPolicy,
    /// Per-request timeout for the remote transport, in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Whether the disk image import command is enabled.
    pub image_import: bool,
}

impl BridgeConfig {
    /// Load from the process environment.
    ///
    /// # Errors
    /// Returns error if a variable is set to an unparsable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Unset keys keep their defaults.
    ///
    /// # Errors
    /// Returns error if a value cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_ORIGIN) {
            let origin = Url::parse(&value).map_err(|e| invalid(ENV_ORIGIN, &value, e))?;
            config.origin = Some(origin);
        }
        if let Some(value) = lookup(ENV_DEV_SERVER) {
            config.dev_server = parse_bool(ENV_DEV_SERVER, &value)?;
        }
        if let Some(value) = lookup(ENV_HOST_ERRORS) {
            config.host_errors = value.parse().map_err(|e| invalid(ENV_HOST_ERRORS, &value, e))?;
        }
        if let Some(value) = lookup(ENV_TIMEOUT_MS) {
            let ms = value
                .trim()
                .parse::<u64>()
                .map_err(|e| invalid(ENV_TIMEOUT_MS, &value, e))?;
            config.timeout_ms = Some(ms);
        }
        if let Some(value) = lookup(ENV_IMAGE_IMPORT) {
            config.image_import = parse_bool(ENV_IMAGE_IMPORT, &value)?;
        }

        Ok(config)
    }

    /// Remote request timeout, if configured.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Where the remote transport sends requests.
    ///
    /// # Errors
    /// Returns error if the default origin cannot be parsed.
    pub fn remote_target(&self) -> Result<RemoteTarget, ConfigError> {
        let origin = match &self.origin {
            Some(origin) => origin.clone(),
            None => Url::parse(DEFAULT_ORIGIN)?,
        };
        Ok(RemoteTarget::new(origin, self.dev_server))
    }
}

fn invalid(key: &'static str, value: &str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, value, "expected a boolean")),
    }
}
