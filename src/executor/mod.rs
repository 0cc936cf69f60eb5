//! HTTP request executor.
//!
//! Performs exactly one attempt per call with bounded resource use: a fixed
//! overall timeout and a hard cap on how much of the response body is read.
//! URL validation and redaction happen around the executor, not inside it;
//! the wire always carries the caller's original headers.

pub mod config;
pub mod error;

pub use config::{ExecutionConfig, DEFAULT_TIMEOUT_SECS, MAX_RESPONSE_SIZE};
pub use error::RequestError;

use crate::models::{header_value, status_line, Headers, HttpMethod, ResponseRecord, Warning};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use std::time::Instant;
use url::Url;

/// Content type sent with a body when the caller did not pick one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// The result of a completed request.
#[derive(Debug, Clone)]
pub struct Execution {
    pub response: ResponseRecord,
    pub warnings: Vec<Warning>,
}

impl Execution {
    /// Whether the response body was cut at the cap.
    pub fn truncated(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, Warning::ResponseTruncated { .. }))
    }
}

/// Executes HTTP requests with a shared connection pool.
#[derive(Debug, Clone)]
pub struct Executor {
    client: reqwest::Client,
    config: ExecutionConfig,
}

impl Executor {
    /// Builds an executor with the given bounds.
    ///
    /// # Errors
    ///
    /// Returns `RequestError::Build` if the underlying client cannot be built.
    pub fn new(config: ExecutionConfig) -> Result<Self, RequestError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RequestError::Build(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Executes an HTTP request and returns the response.
    ///
    /// # Arguments
    ///
    /// * `method` - HTTP method
    /// * `url` - Already validated target URL
    /// * `headers` - Headers sent verbatim
    /// * `body` - Request body; empty means no body
    ///
    /// # Returns
    ///
    /// The response record plus a truncation warning when the body exceeded
    /// the cap. Any HTTP status, including 4xx and 5xx, is a successful result.
    ///
    /// # Errors
    ///
    /// Returns a [`RequestError`] for DNS, connection, TLS and timeout failures.
    pub async fn execute(
        &self,
        method: HttpMethod,
        url: &Url,
        headers: &Headers,
        body: &str,
    ) -> Result<Execution, RequestError> {
        let header_map = build_header_map(headers, !body.is_empty())?;

        let mut request = self
            .client
            .request(method.to_reqwest(), url.clone())
            .headers(header_map);
        if !body.is_empty() {
            request = request.body(body.to_string());
        }

        log::debug!("sending {} {}", method, url);
        let start = Instant::now();
        let mut response = request.send().await?;

        let status = response.status();
        let response_headers = collapse_headers(response.headers());

        let limit = self.config.max_body_bytes;
        let mut bytes: Vec<u8> = Vec::new();
        let mut truncated = false;
        while let Some(chunk) = response.chunk().await? {
            let remaining = limit - bytes.len();
            if chunk.len() > remaining {
                bytes.extend_from_slice(&chunk[..remaining]);
                truncated = true;
                break;
            }
            bytes.extend_from_slice(&chunk);
        }
        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        let (body, trimmed) = decode_body(bytes, limit, truncated);
        let truncated = truncated || trimmed;

        let mut warnings = Vec::new();
        if truncated {
            log::warn!("response body from {} truncated at {} bytes", url, limit);
            warnings.push(Warning::ResponseTruncated { limit });
        }

        log::debug!("{} {} -> {} in {}ms", method, url, status, duration_ms);

        Ok(Execution {
            response: ResponseRecord {
                status_code: status.as_u16(),
                status: status_line(status.as_u16(), status.canonical_reason()),
                headers: response_headers,
                body,
                duration_ms,
            },
            warnings,
        })
    }
}

/// Decodes a capped body lossily, keeping the decoded text within `limit` bytes.
///
/// A cut at the cap can split a multibyte character, and replacement
/// characters for invalid bytes are wider than the bytes they replace. The
/// returned flag is set when the decoded text had to be shortened.
fn decode_body(mut bytes: Vec<u8>, limit: usize, cut: bool) -> (String, bool) {
    if cut {
        if let Err(e) = std::str::from_utf8(&bytes) {
            // Only an incomplete sequence at the very end was left by the cut.
            if e.error_len().is_none() {
                bytes.truncate(e.valid_up_to());
            }
        }
    }

    let mut body = String::from_utf8_lossy(&bytes).into_owned();
    if body.len() <= limit {
        return (body, false);
    }
    let mut end = limit;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    body.truncate(end);
    (body, true)
}

/// Converts the caller's headers for the wire, adding the default content type
/// when a body is present and none was supplied.
fn build_header_map(headers: &Headers, has_body: bool) -> Result<HeaderMap, RequestError> {
    let mut map = HeaderMap::with_capacity(headers.len() + 1);
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| RequestError::Build(format!("invalid header name {:?}: {}", name, e)))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|e| RequestError::Build(format!("invalid value for header {}: {}", name, e)))?;
        map.insert(header_name, header_value);
    }
    if has_body && header_value(headers, "content-type").is_none() {
        map.insert(CONTENT_TYPE, HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    }
    Ok(map)
}

/// Keeps the first value received for each header name.
fn collapse_headers(headers: &HeaderMap) -> Headers {
    headers
        .keys()
        .filter_map(|name| {
            headers.get(name).map(|value| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
        })
        .collect()
}
