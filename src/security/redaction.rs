//! Credential redaction before persistence.
//!
//! Redaction only ever touches copies headed for storage. The headers sent on
//! the wire are the caller's originals.

use crate::models::{Headers, RequestRecord, ResponseRecord, SavedRequest};

/// Marker stored in place of a sensitive header value.
pub const REDACTED: &str = "[REDACTED]";

/// Lower-case names of headers whose values never reach storage.
pub const SENSITIVE_HEADERS: &[&str] = &[
    // Standard authentication
    "authorization",
    "proxy-authorization",
    "www-authenticate",
    // Session and token
    "cookie",
    "set-cookie",
    "x-api-key",
    "api-key",
    "x-auth-token",
    "x-csrf-token",
    "x-xsrf-token",
    // AWS
    "x-amz-security-token",
    "x-amz-credential",
    "x-amz-signature",
    // GCP
    "x-goog-authenticated-user-email",
    "x-goog-authenticated-user-id",
    "x-goog-iap-jwt-assertion",
    // Azure
    "x-ms-client-principal",
    "x-ms-client-principal-id",
    "x-ms-token-aad-id-token",
    // Generic
    "x-access-token",
    "x-refresh-token",
    "x-session-token",
    "x-secret-key",
    "x-private-key",
];

/// Substrings that suggest a request body carries credentials.
pub const SENSITIVE_BODY_PATTERNS: &[&str] = &[
    "password",
    "passwd",
    "pwd",
    "secret",
    "token",
    "api_key",
    "apikey",
    "private_key",
    "privatekey",
    "credit_card",
    "creditcard",
    "card_number",
    "ssn",
    "social_security",
    "access_token",
    "refresh_token",
    "client_secret",
    "auth",
];

/// Checks whether a header name is in the sensitive set, ignoring case.
pub fn is_sensitive_header(name: &str) -> bool {
    SENSITIVE_HEADERS
        .iter()
        .any(|sensitive| name.eq_ignore_ascii_case(sensitive))
}

/// Returns a copy of `headers` with every sensitive value replaced by
/// [`REDACTED`]. Keys keep their original casing.
///
/// Total and idempotent: an empty map yields an empty map, and redacting an
/// already redacted map changes nothing.
pub fn redact(headers: &Headers) -> Headers {
    headers
        .iter()
        .map(|(key, value)| {
            if is_sensitive_header(key) {
                (key.clone(), REDACTED.to_string())
            } else {
                (key.clone(), value.clone())
            }
        })
        .collect()
}

/// Redacts a response's headers, leaving status and body alone.
pub fn redact_response(response: &ResponseRecord) -> ResponseRecord {
    ResponseRecord {
        headers: redact(&response.headers),
        ..response.clone()
    }
}

/// Redacts request headers and any embedded response headers of a record that
/// is about to be written to history.
pub fn redact_record(record: &RequestRecord) -> RequestRecord {
    RequestRecord {
        headers: redact(&record.headers),
        response: record.response.as_ref().map(redact_response),
        ..record.clone()
    }
}

/// Redacts the headers of a request about to be saved into a collection.
pub fn redact_saved(request: &SavedRequest) -> SavedRequest {
    SavedRequest {
        headers: redact(&request.headers),
        ..request.clone()
    }
}

/// Advisory scan of a request body for credential-like text.
///
/// Never alters the body; the caller decides whether to warn.
pub fn body_looks_sensitive(body: &str) -> bool {
    if body.is_empty() {
        return false;
    }
    let lower = body.to_lowercase();
    SENSITIVE_BODY_PATTERNS
        .iter()
        .any(|pattern| lower.contains(pattern))
}
