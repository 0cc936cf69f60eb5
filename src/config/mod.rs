//! Configuration loading.
//!
//! A [`ClientConfig`] is built once per invocation and passed down explicitly;
//! nothing here is global. Sources, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. `<dataDir>/config.json`
//! 3. environment variables (`APICLI_BACKEND`, `APICLI_TIMEOUT_SECS`)
//!
//! The data directory itself comes from the caller's override, then
//! `APICLI_HOME`, then `~/.apicli`.

pub mod schema;

pub use schema::{ClientConfig, StorageBackend, DATA_DIR_NAME};

use std::path::{Path, PathBuf};

/// Config file looked up inside the data directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Environment variable overriding the data directory.
pub const ENV_HOME: &str = "APICLI_HOME";
/// Environment variable selecting the storage backend.
pub const ENV_BACKEND: &str = "APICLI_BACKEND";
/// Environment variable overriding the request timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "APICLI_TIMEOUT_SECS";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The merged configuration failed validation.
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// An environment variable held an unusable value.
    #[error("Invalid value {value:?} for {key}")]
    Parse { key: &'static str, value: String },

    /// The config file exists but could not be read.
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Arguments
    ///
    /// * `data_dir` - Explicit data directory; wins over `APICLI_HOME`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an environment override is malformed or the
    /// result fails validation. A malformed config file is not an error; it is
    /// logged and ignored.
    pub fn load(data_dir: Option<PathBuf>) -> Result<Self, ConfigError> {
        load_config_with(data_dir, |key| std::env::var(key).ok())
    }
}

/// Loads configuration using `env` to read environment variables.
pub fn load_config_with<F>(data_dir: Option<PathBuf>, env: F) -> Result<ClientConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = ClientConfig::default();
    let data_dir = data_dir
        .or_else(|| env(ENV_HOME).filter(|v| !v.is_empty()).map(PathBuf::from))
        .unwrap_or_else(|| defaults.data_dir.clone());

    let mut config = read_config_file(&data_dir)?.unwrap_or(defaults);
    config.data_dir = data_dir;

    if let Some(value) = env(ENV_BACKEND) {
        config.backend = StorageBackend::parse(&value).ok_or(ConfigError::Parse {
            key: ENV_BACKEND,
            value,
        })?;
    }

    if let Some(value) = env(ENV_TIMEOUT_SECS) {
        config.timeout_secs = value.trim().parse().map_err(|_| ConfigError::Parse {
            key: ENV_TIMEOUT_SECS,
            value: value.clone(),
        })?;
    }

    config.validate().map_err(ConfigError::Invalid)?;
    log::debug!(
        "configuration: backend={:?} data_dir={}",
        config.backend,
        config.data_dir.display()
    );
    Ok(config)
}

fn read_config_file(data_dir: &Path) -> Result<Option<ClientConfig>, ConfigError> {
    let path = data_dir.join(CONFIG_FILE_NAME);
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(&path)?;
    match serde_json::from_str::<ClientConfig>(&text) {
        Ok(config) => Ok(Some(config)),
        Err(e) => {
            log::warn!(
                "Failed to parse {}: {}. Using defaults.",
                path.display(),
                e
            );
            Ok(None)
        }
    }
}
