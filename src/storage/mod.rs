//! Durable storage for history, collections and aliases.
//!
//! Two backends implement the same [`Storage`] contract:
//!
//! - [`JsonStorage`]: one JSON document per table, rewritten whole on every
//!   mutation.
//! - [`SqliteStorage`]: normalized tables, with multi-row operations wrapped in
//!   transactions.
//!
//! Callers only ever see `dyn Storage`; [`open_storage`] picks the backend from
//! the [`ClientConfig`]. Every backing file is kept owner-only (`0600`) inside
//! an owner-only (`0700`) directory.
//!
//! The history log is capped at [`HISTORY_CAPACITY`] entries on every write,
//! ordered most recent first by timestamp.

pub mod json;
pub mod migration;
pub mod sqlite;

pub use json::JsonStorage;
pub use migration::{migrate_if_empty, FileMigration, MigrationReport};
pub use sqlite::SqliteStorage;

use crate::config::{ClientConfig, StorageBackend};
use crate::models::{Collection, RequestRecord, SavedRequest, HISTORY_CAPACITY};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::path::Path;

/// History document file name.
pub const HISTORY_FILE: &str = "history.json";
/// Collections document file name.
pub const COLLECTIONS_FILE: &str = "collections.json";
/// Aliases document file name.
pub const ALIASES_FILE: &str = "aliases.json";
/// SQLite database file name.
pub const DATABASE_FILE: &str = "apicli.db";
/// Suffix appended to a document once its contents live in the database.
pub const MIGRATED_SUFFIX: &str = ".migrated";

#[cfg(unix)]
const SECURE_FILE_MODE: u32 = 0o600;
#[cfg(unix)]
const SECURE_DIR_MODE: u32 = 0o700;

/// Alias name to base URL, sorted by name.
pub type AliasMap = BTreeMap<String, String>;

/// Errors raised by the storage backends.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading or writing a backing file failed.
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A document could not be encoded or decoded.
    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A SQLite statement failed.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The data directory could not be determined or prepared.
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// The persistence contract shared by both backends.
///
/// Lookups return `Ok(None)` for missing entries; deleting something that does
/// not exist is a no-op.
pub trait Storage: Send {
    /// Returns the history log, most recent first, at most
    /// [`HISTORY_CAPACITY`] entries.
    fn load_history(&self) -> Result<Vec<RequestRecord>, StorageError>;

    /// Replaces the whole history log. The capacity bound still applies.
    fn save_history(&self, records: &[RequestRecord]) -> Result<(), StorageError>;

    /// Prepends a record and evicts entries beyond the 100 most recent.
    fn add_to_history(&self, record: &RequestRecord) -> Result<(), StorageError>;

    fn clear_history(&self) -> Result<(), StorageError>;

    fn get_history_entry(&self, id: &str) -> Result<Option<RequestRecord>, StorageError>;

    /// Returns every collection, sorted by name, requests in replay order.
    fn list_collections(&self) -> Result<Vec<Collection>, StorageError>;

    /// Replaces every collection in one step.
    fn save_collections(&self, collections: &[Collection]) -> Result<(), StorageError>;

    /// Creates an empty collection; no-op if it already exists.
    fn create_collection(&self, name: &str) -> Result<(), StorageError>;

    /// Deletes a collection together with its saved requests.
    fn delete_collection(&self, name: &str) -> Result<(), StorageError>;

    fn get_collection(&self, name: &str) -> Result<Option<Collection>, StorageError>;

    /// Appends a request at the end of a collection, creating the collection
    /// first if needed.
    fn add_to_collection(&self, name: &str, request: &SavedRequest) -> Result<(), StorageError>;

    fn list_aliases(&self) -> Result<AliasMap, StorageError>;

    /// Replaces every alias in one step.
    fn save_aliases(&self, aliases: &AliasMap) -> Result<(), StorageError>;

    /// Creates or overwrites an alias.
    fn create_alias(&self, name: &str, url: &str) -> Result<(), StorageError>;

    fn delete_alias(&self, name: &str) -> Result<(), StorageError>;

    fn get_alias(&self, name: &str) -> Result<Option<String>, StorageError>;

    /// Whether history, collections and aliases are all empty.
    fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.load_history()?.is_empty()
            && self.list_collections()?.is_empty()
            && self.list_aliases()?.is_empty())
    }
}

/// Opens the configured backend under `config.data_dir`.
///
/// The SQLite backend imports any legacy JSON documents on first open.
///
/// # Errors
///
/// Returns [`StorageError`] if the data directory or backing files cannot be
/// prepared.
pub fn open_storage(config: &ClientConfig) -> Result<Box<dyn Storage>, StorageError> {
    match config.backend {
        StorageBackend::Json => Ok(Box::new(JsonStorage::open(&config.data_dir)?)),
        StorageBackend::Sqlite => Ok(Box::new(SqliteStorage::open(&config.data_dir)?)),
    }
}

/// Creates the data directory as owner-only if it does not exist yet.
pub fn ensure_secure_dir(path: &Path) -> Result<(), StorageError> {
    if path.as_os_str().is_empty() {
        return Err(StorageError::DataDir("empty path".to_string()));
    }
    if path.is_dir() {
        return Ok(());
    }

    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(SECURE_DIR_MODE);
    }
    builder
        .create(path)
        .map_err(|e| StorageError::DataDir(format!("{}: {}", path.display(), e)))
}

/// Makes sure `path` exists with owner-only permissions.
///
/// A missing file is created with the restricted mode directly, so it is never
/// visible with default permissions. An existing file has its mode reset if it
/// drifted.
pub fn ensure_secure_file(path: &Path) -> Result<(), StorageError> {
    if !path.exists() {
        let mut options = OpenOptions::new();
        options.write(true).create(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(SECURE_FILE_MODE);
        }
        options.open(path)?;
        return Ok(());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(path)?.permissions().mode() & 0o777;
        if mode != SECURE_FILE_MODE {
            log::debug!(
                "resetting permissions of {} from {:o}",
                path.display(),
                mode
            );
            fs::set_permissions(path, fs::Permissions::from_mode(SECURE_FILE_MODE))?;
        }
    }
    Ok(())
}

/// Sorts records most recent first and drops everything past the cap.
pub(crate) fn bound_history(records: &[RequestRecord]) -> Vec<RequestRecord> {
    let mut records = records.to_vec();
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    records.truncate(HISTORY_CAPACITY);
    records
}
