//! Core of a command-line HTTP client.
//!
//! This crate executes ad-hoc HTTP requests safely, keeps a bounded and
//! redacted history of them, stores named collections of saved requests and
//! URL aliases, and replays collections as best-effort batches.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - **models**: Requests, responses, collections and warnings, in their
//!   persisted shapes
//! - **security**: Outbound URL validation and credential redaction
//! - **executor**: Executes one HTTP request with a timeout and a body cap
//! - **storage**: The `Storage` trait with JSON and SQLite backends, plus the
//!   one-time JSON to SQLite migration
//! - **aliases**: Expands `name/path` references into full URLs
//! - **runner**: Replays a collection, isolating per-request failures
//! - **commands**: The `Session` facade called by the command-line layer
//! - **config**: Data directory, backend choice and request bounds
//!
//! # Request flow
//!
//! A single request goes through alias resolution, URL validation, the
//! executor, redaction and finally the history log. Validation and network
//! errors fail the request; history problems never do.
//!
//! ```no_run
//! use apicli::{ClientConfig, HttpMethod, RequestOptions, Session};
//!
//! # async fn run() -> Result<(), apicli::Error> {
//! let config = ClientConfig::load(None)?;
//! let session = Session::open(&config)?;
//!
//! session.create_alias("api", "https://api.example.com/v1")?;
//! let outcome = session
//!     .execute_request(HttpMethod::GET, "api/users", &RequestOptions::default())
//!     .await?;
//!
//! println!("{} in {}ms", outcome.response.status, outcome.response.duration_ms);
//! for warning in &outcome.warnings {
//!     eprintln!("warning: {}", warning);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Logging
//!
//! The crate logs through the `log` facade and never installs a logger; the
//! embedding binary picks one (for example `env_logger::init()`).

pub mod aliases;
pub mod commands;
pub mod config;
pub mod error;
pub mod executor;
pub mod models;
pub mod runner;
pub mod security;
pub mod storage;

pub use commands::{parse_headers, RequestOptions, RequestOutcome, Session};
pub use config::{ClientConfig, ConfigError, StorageBackend};
pub use error::Error;
pub use executor::{Executor, ExecutionConfig, RequestError};
pub use models::{
    Collection, Headers, HttpMethod, RequestRecord, ResponseRecord, SavedRequest, Warning,
};
pub use runner::{BatchItem, BatchRunner};
pub use security::ValidationError;
pub use storage::{Storage, StorageError};
