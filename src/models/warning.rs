//! Non-fatal outcomes surfaced to the user alongside a result.

use std::fmt;

/// Something the user should be told about that does not stop a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// The URL uses plain `http`.
    InsecureTransport,

    /// The host is `localhost` or a loopback literal.
    LoopbackHost(String),

    /// The host text starts with a private or reserved IPv4 prefix.
    PrivateHost(String),

    /// The response body exceeded the cap and was cut to `limit` bytes.
    ResponseTruncated {
        /// Cap in bytes.
        limit: usize,
    },

    /// The request body looks like it contains credentials and will be stored
    /// in history as-is.
    SensitiveBody,

    /// The request ran but could not be saved into the requested collection.
    CollectionSaveFailed {
        collection: String,
        reason: String,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::InsecureTransport => write!(
                f,
                "Using insecure HTTP connection. Data will be transmitted unencrypted."
            ),
            Warning::LoopbackHost(host) => {
                write!(f, "Making request to localhost/loopback address: {}", host)
            }
            Warning::PrivateHost(host) => {
                write!(f, "Making request to private/internal IP address: {}", host)
            }
            Warning::ResponseTruncated { limit } => write!(
                f,
                "Response body truncated (exceeded {} MiB limit)",
                limit / (1024 * 1024)
            ),
            Warning::SensitiveBody => write!(
                f,
                "Request body may contain sensitive data (e.g., passwords, tokens). \
                 This will be stored in history. Use --no-history to skip storing this request."
            ),
            Warning::CollectionSaveFailed { collection, reason } => {
                write!(f, "Failed to save to collection '{}': {}", collection, reason)
            }
        }
    }
}
