//! HTTP request data models.
//!
//! This module defines the request method, the header mapping shared by every
//! record type, the executed [`RequestRecord`] kept in history and the
//! unexecuted [`SavedRequest`] kept in collections.

use super::response::ResponseRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Header mapping. Keys keep the casing they were supplied with; lookups that
/// need to be case-insensitive go through [`header_value`].
pub type Headers = HashMap<String, String>;

/// Number of characters of a UUID kept as a history identifier.
const RECORD_ID_LEN: usize = 8;

/// HTTP request method.
///
/// Serialized as its upper-case name. Parsing is case-insensitive so that
/// documents written by older versions (which stored the method exactly as
/// typed) still load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HttpMethod {
    /// HTTP GET method - retrieve a resource
    GET,
    /// HTTP POST method - submit data to create a resource
    POST,
    /// HTTP PUT method - replace a resource
    PUT,
    /// HTTP DELETE method - remove a resource
    DELETE,
    /// HTTP PATCH method - partially modify a resource
    PATCH,
    /// HTTP OPTIONS method - describe communication options
    OPTIONS,
    /// HTTP HEAD method - retrieve headers only
    HEAD,
}

impl HttpMethod {
    /// Returns the string representation of the HTTP method.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::OPTIONS => "OPTIONS",
            HttpMethod::HEAD => "HEAD",
        }
    }

    /// Converts to the method type used by the HTTP client.
    pub fn to_reqwest(self) -> reqwest::Method {
        match self {
            HttpMethod::GET => reqwest::Method::GET,
            HttpMethod::POST => reqwest::Method::POST,
            HttpMethod::PUT => reqwest::Method::PUT,
            HttpMethod::DELETE => reqwest::Method::DELETE,
            HttpMethod::PATCH => reqwest::Method::PATCH,
            HttpMethod::OPTIONS => reqwest::Method::OPTIONS,
            HttpMethod::HEAD => reqwest::Method::HEAD,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returned when a string does not name a supported HTTP method.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported HTTP method: {0}")]
pub struct HttpMethodParseError(pub String);

impl FromStr for HttpMethod {
    type Err = HttpMethodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "GET" => Ok(HttpMethod::GET),
            "POST" => Ok(HttpMethod::POST),
            "PUT" => Ok(HttpMethod::PUT),
            "DELETE" => Ok(HttpMethod::DELETE),
            "PATCH" => Ok(HttpMethod::PATCH),
            "OPTIONS" => Ok(HttpMethod::OPTIONS),
            "HEAD" => Ok(HttpMethod::HEAD),
            _ => Err(HttpMethodParseError(s.to_string())),
        }
    }
}

impl TryFrom<String> for HttpMethod {
    type Error = HttpMethodParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HttpMethod> for String {
    fn from(method: HttpMethod) -> Self {
        method.as_str().to_string()
    }
}

/// Looks up a header value by name, ignoring ASCII case.
pub fn header_value<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// An executed request as kept in the history log.
///
/// Records are immutable once written; the only replacement happens when a
/// whole record is re-inserted during migration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestRecord {
    /// Short opaque identifier, unique within the history log.
    pub id: String,

    /// When the request was executed.
    pub timestamp: DateTime<Utc>,

    pub method: HttpMethod,

    /// The URL that was dereferenced, after alias resolution.
    pub url: String,

    #[serde(default)]
    pub headers: Headers,

    #[serde(default)]
    pub body: String,

    /// The response, when one was received.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseRecord>,
}

impl RequestRecord {
    /// Creates a record stamped with the current time and a fresh identifier.
    ///
    /// # Arguments
    ///
    /// * `method` - HTTP method that was sent
    /// * `url` - Resolved target URL
    /// * `headers` - Request headers (redact before storing)
    /// * `body` - Request body text, empty when none was sent
    pub fn new(method: HttpMethod, url: String, headers: Headers, body: String) -> Self {
        Self {
            id: new_record_id(),
            timestamp: Utc::now(),
            method,
            url,
            headers,
            body,
            response: None,
        }
    }

    /// Attaches the response to this record.
    pub fn with_response(mut self, response: ResponseRecord) -> Self {
        self.response = Some(response);
        self
    }
}

/// Generates a short history identifier from a v4 UUID.
pub fn new_record_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(RECORD_ID_LEN);
    id
}

/// A request saved into a collection for later replay. Never carries a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedRequest {
    /// Display name; empty is allowed.
    #[serde(default)]
    pub name: String,

    pub method: HttpMethod,

    /// Target URL, possibly an unresolved alias reference such as `api/users`.
    pub url: String,

    #[serde(default)]
    pub headers: Headers,

    #[serde(default)]
    pub body: String,
}

impl SavedRequest {
    /// Creates a saved request with no headers and no body.
    pub fn new(name: impl Into<String>, method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method,
            url: url.into(),
            headers: Headers::new(),
            body: String::new(),
        }
    }

    /// Returns the name if set, otherwise `METHOD url`.
    pub fn label(&self) -> String {
        if self.name.is_empty() {
            format!("{} {}", self.method, self.url)
        } else {
            self.name.clone()
        }
    }
}
