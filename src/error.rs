//! Crate-level error type.
//!
//! Each layer has its own error enum; [`Error`] wraps them so `?` composes
//! from the executor, the validator and the storage backends up to the
//! [`Session`](crate::commands::Session) operations.

use crate::config::ConfigError;
use crate::executor::RequestError;
use crate::security::ValidationError;
use crate::storage::StorageError;

/// Errors surfaced by the public operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The target URL was rejected before anything was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// DNS, connection, TLS or timeout failure. Never retried.
    #[error(transparent)]
    Network(#[from] RequestError),

    /// A collection or alias mutation could not be persisted.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The named collection does not exist.
    #[error("Collection '{0}' not found")]
    NotFound(String),

    /// The named collection has no requests to run.
    #[error("Collection '{0}' is empty")]
    EmptyCollection(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// Whether the failure happened on the wire rather than before it.
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network(_))
    }
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
