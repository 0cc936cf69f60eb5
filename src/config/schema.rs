//! Configuration schema.
//!
//! This module defines the configuration structure and validation logic for
//! the user-configurable settings of the client.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Name of the data directory under the user's home.
pub const DATA_DIR_NAME: &str = ".apicli";

/// Which storage backend persists history, collections and aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One JSON document per table.
    Json,
    /// Normalized tables in a SQLite database.
    Sqlite,
}

impl StorageBackend {
    /// Parses a backend name, ignoring case.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "json" => Some(StorageBackend::Json),
            "sqlite" => Some(StorageBackend::Sqlite),
            _ => None,
        }
    }
}

/// Main configuration structure.
///
/// Missing settings fall back to defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// Directory holding the storage files.
    ///
    /// Defaults to `~/.apicli`.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Storage backend. Defaults to SQLite.
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,

    /// Request timeout in seconds. Defaults to 30.
    ///
    /// Must be greater than 0.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Response body cap in bytes. Defaults to 50 MiB.
    ///
    /// Must be greater than 0.
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            backend: default_backend(),
            timeout_secs: default_timeout_secs(),
            max_response_bytes: default_max_response_bytes(),
        }
    }
}

impl ClientConfig {
    /// Validates the configuration.
    ///
    /// # Returns
    ///
    /// `Ok(())` if all settings are valid, or `Err` with a descriptive message.
    pub fn validate(&self) -> Result<(), String> {
        if self.timeout_secs == 0 {
            return Err("timeoutSecs must be greater than 0".to_string());
        }
        if self.max_response_bytes == 0 {
            return Err("maxResponseBytes must be greater than 0".to_string());
        }
        if self.data_dir.as_os_str().is_empty() {
            return Err("dataDir must not be empty".to_string());
        }
        Ok(())
    }

    /// Returns the timeout as a `std::time::Duration`.
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Returns a copy rooted at another data directory.
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Returns a copy using another backend.
    pub fn with_backend(mut self, backend: StorageBackend) -> Self {
        self.backend = backend;
        self
    }
}

// Default value functions for serde

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(DATA_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(DATA_DIR_NAME))
}

fn default_backend() -> StorageBackend {
    StorageBackend::Sqlite
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_response_bytes() -> usize {
    50 * 1024 * 1024
}
