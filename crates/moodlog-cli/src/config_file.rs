//! Persistent CLI configuration.

use std::path::{Path, PathBuf};

use moodlog_core::config::{
    RemoteConfig, ENV_COLLECTION, ENV_HTTP_TIMEOUT_SECS, ENV_REMOTE_URL,
};
use moodlog_core::util::normalize_text_option;
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "cli-config.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliConfig {
    #[serde(default = "default_config_version")]
    pub version: u32,
    #[serde(default)]
    pub remote_url: Option<String>,
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub http_timeout_secs: Option<u64>,
}

const fn default_config_version() -> u32 {
    1
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("moodlog")
        .join(CONFIG_FILE_NAME)
}

impl CliConfig {
    pub fn load() -> Result<Self, String> {
        Self::load_from_path(&default_config_path())
    }

    pub fn load_from_path(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|error| format!("Failed to read config at {}: {}", path.display(), error))?;
        let mut config = serde_json::from_str::<Self>(&raw)
            .map_err(|error| format!("Failed to parse config at {}: {}", path.display(), error))?;
        config.normalize();
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf, String> {
        let path = default_config_path();
        self.save_to_path(&path)?;
        Ok(path)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| {
                format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    error
                )
            })?;
        }

        let mut normalized = self.clone();
        normalized.normalize();
        let serialized = serde_json::to_string_pretty(&normalized)
            .map_err(|error| format!("Failed to serialize config: {error}"))?;
        std::fs::write(path, serialized)
            .map_err(|error| format!("Failed to write config at {}: {}", path.display(), error))
    }

    /// Resolve the remote store configuration.
    ///
    /// Precedence per field: command-line flag, then environment, then this
    /// file. Returns `Ok(None)` when no remote URL is set anywhere.
    pub fn resolve_remote(
        &self,
        flag_url: Option<String>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Option<RemoteConfig>, String> {
        let base_url = normalize_text_option(flag_url)
            .or_else(|| normalize_text_option(lookup(ENV_REMOTE_URL)))
            .or_else(|| self.remote_url.clone());
        let collection =
            normalize_text_option(lookup(ENV_COLLECTION)).or_else(|| self.collection.clone());
        let timeout_secs = match normalize_text_option(lookup(ENV_HTTP_TIMEOUT_SECS)) {
            Some(raw) => Some(raw.parse::<u64>().map_err(|_| {
                format!("{ENV_HTTP_TIMEOUT_SECS} must be a whole number of seconds")
            })?),
            None => self.http_timeout_secs,
        };

        RemoteConfig::from_parts(base_url, collection, timeout_secs)
            .map_err(|error| error.to_string())
    }

    fn normalize(&mut self) {
        self.remote_url = normalize_text_option(self.remote_url.clone())
            .map(|url| url.trim_end_matches('/').to_string());
        self.collection = normalize_text_option(self.collection.clone());
    }
}
