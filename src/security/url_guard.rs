//! Outbound URL safety checks.
//!
//! Only a cloud metadata host blocks a request. Plain HTTP, loopback hosts and
//! private-range literals produce warnings that the caller shows but does not
//! act on.
//!
//! The private-range check is a textual prefix match on the host string. A
//! name that resolves to a private address through DNS is not detected.

use crate::models::Warning;
use url::{Host, Url};

/// Hosts serving instance credentials on common cloud providers.
pub const METADATA_HOSTS: &[&str] = &[
    "169.254.169.254",          // AWS, GCP, Azure
    "metadata.google.internal", // GCP
    "metadata.goog",            // GCP alternative
    "100.100.100.200",          // Alibaba Cloud
    "169.254.170.2",            // AWS ECS task metadata
];

/// Host names treated as loopback.
pub const LOOPBACK_HOSTS: &[&str] = &["localhost", "127.0.0.1", "::1"];

/// Literal prefixes of private and reserved IPv4 ranges.
pub const PRIVATE_PREFIXES: &[&str] = &[
    "10.", "192.168.", "172.16.", "172.17.", "172.18.", "172.19.", "172.20.", "172.21.",
    "172.22.", "172.23.", "172.24.", "172.25.", "172.26.", "172.27.", "172.28.", "172.29.",
    "172.30.", "172.31.", "0.", "169.254.",
];

/// Why a URL was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The URL could not be parsed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The scheme is neither `http` nor `https`.
    #[error("unsupported URL scheme: {0} (only http and https are allowed)")]
    UnsupportedScheme(String),

    /// The URL has no host.
    #[error("URL must have a hostname")]
    MissingHost,

    /// The host is a cloud metadata endpoint.
    #[error("blocked request to cloud metadata endpoint: {0}")]
    BlockedMetadataEndpoint(String),
}

/// A URL that passed validation, with whatever warnings it raised.
#[derive(Debug, Clone)]
pub struct ValidatedUrl {
    pub url: Url,
    pub warnings: Vec<Warning>,
}

/// Validates a raw URL before it is dereferenced.
///
/// # Arguments
///
/// * `raw_url` - The URL as typed or resolved from an alias
///
/// # Returns
///
/// The parsed URL and zero or more warnings.
///
/// # Errors
///
/// Returns a [`ValidationError`] for unparsable URLs, non-HTTP schemes, a
/// missing host, or a cloud metadata host.
pub fn validate(raw_url: &str) -> Result<ValidatedUrl, ValidationError> {
    let url = match Url::parse(raw_url) {
        Ok(url) => url,
        Err(url::ParseError::EmptyHost) => return Err(empty_host_error(raw_url)),
        Err(e) => return Err(ValidationError::InvalidUrl(e.to_string())),
    };

    let scheme = url.scheme().to_ascii_lowercase();
    if scheme != "http" && scheme != "https" {
        return Err(ValidationError::UnsupportedScheme(url.scheme().to_string()));
    }

    let hostname = match url.host() {
        Some(Host::Domain(domain)) if !domain.is_empty() => domain.to_string(),
        Some(Host::Ipv4(addr)) => addr.to_string(),
        Some(Host::Ipv6(addr)) => addr.to_string(),
        _ => return Err(ValidationError::MissingHost),
    };
    let lower = hostname.to_ascii_lowercase();

    if is_metadata_host(&lower) {
        log::warn!("blocked request to metadata endpoint {}", hostname);
        return Err(ValidationError::BlockedMetadataEndpoint(hostname));
    }

    let mut warnings = Vec::new();
    if scheme == "http" {
        warnings.push(Warning::InsecureTransport);
    }
    if LOOPBACK_HOSTS.contains(&lower.as_str()) {
        warnings.push(Warning::LoopbackHost(hostname.clone()));
    }
    if is_private_host(&hostname) {
        warnings.push(Warning::PrivateHost(hostname));
    }

    for warning in &warnings {
        log::debug!("url warning for {}: {}", raw_url, warning);
    }

    Ok(ValidatedUrl { url, warnings })
}

/// An empty host is only reported as missing once the scheme is known to be HTTP.
fn empty_host_error(raw_url: &str) -> ValidationError {
    match raw_url.split_once(':') {
        Some((scheme, _))
            if !scheme.eq_ignore_ascii_case("http") && !scheme.eq_ignore_ascii_case("https") =>
        {
            ValidationError::UnsupportedScheme(scheme.to_ascii_lowercase())
        }
        _ => ValidationError::MissingHost,
    }
}

/// Checks the host text against the metadata denylist, ignoring case.
pub fn is_metadata_host(hostname: &str) -> bool {
    METADATA_HOSTS
        .iter()
        .any(|blocked| blocked.eq_ignore_ascii_case(hostname))
}

/// Checks whether the host text starts with a private or reserved prefix.
pub fn is_private_host(hostname: &str) -> bool {
    PRIVATE_PREFIXES
        .iter()
        .any(|prefix| hostname.starts_with(prefix))
}
