//! HTTP response data model.
//!
//! A [`ResponseRecord`] is always embedded in exactly one
//! [`RequestRecord`](super::RequestRecord); it has no identity of its own.

use super::request::{header_value, Headers};
use serde::{Deserialize, Serialize};

/// Represents an HTTP response received from a server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    /// HTTP status code (e.g., 200, 404, 500).
    pub status_code: u16,

    /// Status line text, e.g. `"200 OK"`.
    pub status: String,

    /// Response headers, one value per key (the first one received).
    ///
    /// Names are stored lowercase as delivered by the HTTP stack, so persisted
    /// history holds `set-cookie` rather than `Set-Cookie`.
    #[serde(default)]
    pub headers: Headers,

    /// Response body decoded as text, capped at the executor's body limit.
    #[serde(default)]
    pub body: String,

    /// Wall-clock time from dispatch until the body was fully read.
    #[serde(default)]
    pub duration_ms: u64,
}

impl ResponseRecord {
    /// Creates a new ResponseRecord with the given status code and text.
    ///
    /// # Arguments
    ///
    /// * `status_code` - HTTP status code
    /// * `status` - Status line text
    ///
    /// # Returns
    ///
    /// A new `ResponseRecord` with no headers, an empty body and zero duration.
    pub fn new(status_code: u16, status: impl Into<String>) -> Self {
        Self {
            status_code,
            status: status.into(),
            headers: Headers::new(),
            body: String::new(),
            duration_ms: 0,
        }
    }

    /// Checks if the response status indicates success (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Checks if the response status indicates a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code)
    }

    /// Checks if the response status indicates a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status_code)
    }

    /// Gets the Content-Type header value if present.
    pub fn content_type(&self) -> Option<&str> {
        header_value(&self.headers, "content-type")
    }
}

/// Builds the status line text the way it is displayed and stored: the code
/// followed by its canonical reason phrase when one exists.
pub fn status_line(code: u16, reason: Option<&str>) -> String {
    match reason {
        Some(reason) => format!("{} {}", code, reason),
        None => code.to_string(),
    }
}
