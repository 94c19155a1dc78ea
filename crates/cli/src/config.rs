// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! TOML configuration for the `syncq` binary.
//!
//! Every field has a default, so a missing file or a file naming only a few
//! keys is valid.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use syncq_core::ProcessorConfig;

use crate::error::{Error, Result};

pub const APP_DIR_NAME: &str = "syncq";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const QUEUE_FILE_NAME: &str = "queue.json";
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8080/api";

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Queue file location. Defaults to the platform data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_path: Option<PathBuf>,
    pub backend: BackendConfig,
    pub sync: SyncSettings,
}

/// Where mutations are delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackendConfig {
    pub url: String,
    /// Bearer token sent with every request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig {
            url: DEFAULT_BACKEND_URL.to_string(),
            token: None,
            request_timeout_secs: 30,
        }
    }
}

/// Retry and probe tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncSettings {
    pub max_retries: u32,
    pub item_timeout_secs: u64,
    pub probe_interval_secs: u64,
    pub probe_timeout_ms: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            max_retries: syncq_core::MAX_RETRIES,
            item_timeout_secs: syncq_core::DEFAULT_ITEM_TIMEOUT.as_secs(),
            probe_interval_secs: 5,
            probe_timeout_ms: 2000,
        }
    }
}

impl SyncSettings {
    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs.max(1))
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

impl Config {
    /// Loads the config at `path`. A missing file yields the defaults.
    ///
    /// A relative `queue_path` is resolved against the directory holding the
    /// file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Config::default());
            }
            Err(e) => {
                return Err(Error::Config(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let mut config: Config = toml::from_str(&content)
            .map_err(|source| Error::Toml { path: path.to_path_buf(), source })?;

        if let Some(queue_path) = &config.queue_path {
            if queue_path.is_relative() {
                let base = path.parent().unwrap_or_else(|| Path::new("."));
                config.queue_path = Some(base.join(queue_path));
            }
        }
        Ok(config)
    }

    /// Loads from `explicit` when given, otherwise from the default location.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Config::load(path),
            None => Config::load(&default_config_path()?),
        }
    }

    /// Effective queue file location.
    pub fn queue_path(&self) -> Result<PathBuf> {
        match &self.queue_path {
            Some(path) => Ok(path.clone()),
            None => default_queue_path(),
        }
    }

    pub fn processor_config(&self) -> ProcessorConfig {
        ProcessorConfig {
            max_retries: self.sync.max_retries,
            item_timeout: Duration::from_secs(self.sync.item_timeout_secs),
        }
    }

    /// Host and port the reachability probe connects to.
    pub fn probe_target(&self) -> Result<(String, u16)> {
        let url = self.backend_url()?;
        let host = url
            .host_str()
            .ok_or_else(|| Error::InvalidUrl(self.backend.url.clone()))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();
        let port = url
            .port_or_known_default()
            .ok_or_else(|| Error::InvalidUrl(self.backend.url.clone()))?;
        Ok((host, port))
    }

    /// The backend URL, validated as absolute http(s).
    pub fn backend_url(&self) -> Result<Url> {
        let url = Url::parse(&self.backend.url)
            .map_err(|_| Error::InvalidUrl(self.backend.url.clone()))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            _ => Err(Error::InvalidUrl(self.backend.url.clone())),
        }
    }
}

/// `<config dir>/syncq/config.toml`
pub fn default_config_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
        .ok_or_else(|| Error::Config("cannot determine the config directory".to_string()))
}

/// `<data dir>/syncq/queue.json`
pub fn default_queue_path() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME).join(QUEUE_FILE_NAME))
        .ok_or_else(|| Error::Config("cannot determine the data directory".to_string()))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
