//! Request safety: outbound URL validation and credential redaction.

pub mod redaction;
pub mod url_guard;

pub use redaction::{
    body_looks_sensitive, is_sensitive_header, redact, redact_record, redact_response,
    redact_saved, REDACTED,
};
pub use url_guard::{validate, ValidatedUrl, ValidationError};
