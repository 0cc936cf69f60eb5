//! HTTP request execution error types.
//!
//! This module defines the transport-level failures of a single request. None
//! of them are retried.

use std::error::Error as _;

/// Errors that can occur during HTTP request execution.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// Network error occurred during request execution.
    ///
    /// This includes connection failures, DNS resolution errors,
    /// and other network-level issues.
    #[error("Network error: {0}")]
    Network(String),

    /// Request timed out before completion.
    ///
    /// Covers connecting, sending and reading the full body.
    #[error("Request timed out")]
    Timeout,

    /// TLS/SSL error occurred during HTTPS connection.
    #[error("TLS/SSL error: {0}")]
    Tls(String),

    /// Request building error.
    ///
    /// Invalid header names or values, or a client that could not be built.
    #[error("Request build error: {0}")]
    Build(String),
}

impl RequestError {
    /// Whether this is the timeout flavour of network error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, RequestError::Timeout)
    }
}

/// Renders an error together with its source chain.
fn describe(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Convert reqwest errors to RequestError.
impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        let message = describe(&err);
        let lower = message.to_lowercase();
        if err.is_timeout() {
            RequestError::Timeout
        } else if err.is_builder() {
            RequestError::Build(message)
        } else if lower.contains("certificate") || lower.contains("tls") || lower.contains("ssl")
        {
            RequestError::Tls(message)
        } else if err.is_connect() {
            RequestError::Network(format!("Connection failed: {}", message))
        } else {
            RequestError::Network(message)
        }
    }
}
