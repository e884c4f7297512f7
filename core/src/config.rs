//! Construction-time settings for `AccountClient`.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const BASE_URL_ENV: &str = "ACCOUNTS_BASE_URL";
pub const VERSION_ENV: &str = "ACCOUNTS_API_VERSION";
pub const TIMEOUT_ENV: &str = "ACCOUNTS_TIMEOUT_MS";

/// Where the Accounts service lives and how long a single operation may take.
/// Immutable once a client has been built from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_version")]
    pub version: String,

    #[serde(rename = "timeout_ms", with = "millis", default = "default_timeout")]
    pub timeout: Duration,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_version() -> String {
    "v1".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            version: default_version(),
            timeout: default_timeout(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, version: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            version: version.into(),
            timeout,
        }
    }

    /// Defaults overridden by `ACCOUNTS_BASE_URL`, `ACCOUNTS_API_VERSION` and
    /// `ACCOUNTS_TIMEOUT_MS` where set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(base_url) = lookup(BASE_URL_ENV) {
            config.base_url = base_url;
        }
        if let Some(version) = lookup(VERSION_ENV) {
            config.version = version;
        }
        if let Some(raw) = lookup(TIMEOUT_ENV) {
            let millis = raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnv {
                name: TIMEOUT_ENV,
                value: raw.clone(),
            })?;
            config.timeout = Duration::from_millis(millis);
        }
        Ok(config)
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
