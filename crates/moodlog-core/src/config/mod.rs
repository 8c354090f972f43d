//! Remote store configuration.
//!
//! Resolved from environment variables by default; the CLI layers its own
//! config file and flags on top through [`RemoteConfig::from_parts`].

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::util::{is_http_url, normalize_text_option};
use crate::{Error, Result};

pub const ENV_REMOTE_URL: &str = "MOODLOG_REMOTE_URL";
pub const ENV_COLLECTION: &str = "MOODLOG_COLLECTION";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "MOODLOG_HTTP_TIMEOUT_SECS";

pub const DEFAULT_COLLECTION: &str = "notes";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Where the remote JSON document store lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL without trailing slash (e.g. `https://example.firebaseio.com`)
    pub base_url: String,
    /// Collection name, a single path segment
    pub collection: String,
    /// Per-request timeout
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
}

impl RemoteConfig {
    /// Build a configuration with the default timeout.
    pub fn new(base_url: impl Into<String>, collection: impl Into<String>) -> Result<Self> {
        Self::from_parts(
            Some(base_url.into()),
            Some(collection.into()),
            Some(DEFAULT_HTTP_TIMEOUT_SECS),
        )?
        .ok_or_else(|| Error::InvalidInput("Remote URL is required".to_string()))
    }

    /// Load configuration from environment variables.
    ///
    /// Returns `Ok(None)` when no remote URL is configured (local-only mode).
    pub fn from_env() -> Result<Option<Self>> {
        parse_config(|key| env::var(key).ok())
    }

    /// Assemble and validate configuration from optional parts.
    ///
    /// Returns `Ok(None)` when `base_url` is absent or blank.
    pub fn from_parts(
        base_url: Option<String>,
        collection: Option<String>,
        timeout_secs: Option<u64>,
    ) -> Result<Option<Self>> {
        let Some(base_url) = normalize_text_option(base_url) else {
            return Ok(None);
        };
        if !is_http_url(&base_url) {
            return Err(Error::InvalidInput(format!(
                "{ENV_REMOTE_URL} must start with http:// or https://"
            )));
        }

        let collection = normalize_text_option(collection)
            .unwrap_or_else(|| DEFAULT_COLLECTION.to_string());
        let collection = collection.trim_matches('/').to_string();
        if collection.is_empty() || collection.contains('/') {
            return Err(Error::InvalidInput(format!(
                "{ENV_COLLECTION} must be a single path segment"
            )));
        }

        let timeout_secs = timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(Error::InvalidInput(format!(
                "{ENV_HTTP_TIMEOUT_SECS} must be greater than zero"
            )));
        }

        Ok(Some(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            collection,
            timeout: Duration::from_secs(timeout_secs),
        }))
    }

    /// Endpoint for the whole collection.
    #[must_use]
    pub fn collection_url(&self) -> String {
        format!("{}/{}.json", self.base_url, self.collection)
    }

    /// Endpoint for a single note.
    #[must_use]
    pub fn note_url(&self, identity: &str) -> String {
        format!(
            "{}/{}/{}.json",
            self.base_url,
            self.collection,
            urlencoding::encode(identity)
        )
    }
}

fn parse_config(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<RemoteConfig>> {
    let timeout_secs = match normalize_text_option(lookup(ENV_HTTP_TIMEOUT_SECS)) {
        Some(raw) => Some(raw.parse::<u64>().map_err(|_| {
            Error::InvalidInput(format!(
                "{ENV_HTTP_TIMEOUT_SECS} must be a whole number of seconds"
            ))
        })?),
        None => None,
    };

    RemoteConfig::from_parts(lookup(ENV_REMOTE_URL), lookup(ENV_COLLECTION), timeout_secs)
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
