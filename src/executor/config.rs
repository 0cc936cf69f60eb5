//! HTTP request execution configuration.
//!
//! This module defines the resource bounds of a single request: the overall
//! timeout and the response body cap.

use crate::config::ClientConfig;
use std::time::Duration;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default response body cap (50 MiB).
pub const MAX_RESPONSE_SIZE: usize = 50 * 1024 * 1024;

/// Configuration for HTTP request execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionConfig {
    /// Maximum time to wait for a complete response, including connection,
    /// headers, and body download.
    pub timeout: Duration,

    /// Response bodies longer than this are cut to exactly this many bytes.
    pub max_body_bytes: usize,
}

impl ExecutionConfig {
    /// Creates a new ExecutionConfig with the given timeout and the default
    /// body cap.
    ///
    /// # Arguments
    ///
    /// * `timeout` - Overall request timeout
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            max_body_bytes: MAX_RESPONSE_SIZE,
        }
    }

    /// Overrides the body cap.
    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// Derives execution bounds from the client configuration.
    pub fn from_client_config(config: &ClientConfig) -> Self {
        Self {
            timeout: config.timeout_duration(),
            max_body_bytes: config.max_response_bytes,
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }
}
