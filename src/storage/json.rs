//! Document-store backend.
//!
//! Each table is a single JSON document in the data directory. A mutation
//! loads the whole document, changes it in memory and writes it back through
//! a temporary file in the same directory that is then renamed over the
//! original, so readers never observe a half-written document.

use super::{
    bound_history, ensure_secure_dir, ensure_secure_file, AliasMap, Storage, StorageError,
    ALIASES_FILE, COLLECTIONS_FILE, HISTORY_FILE,
};
use crate::models::{
    AliasesDocument, Collection, CollectionsDocument, HistoryDocument, RequestRecord, SavedRequest,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

/// JSON file storage rooted at a data directory.
#[derive(Debug, Clone)]
pub struct JsonStorage {
    data_dir: PathBuf,
}

impl JsonStorage {
    /// Opens (and if needed creates) the storage directory.
    ///
    /// Documents are created lazily on first write.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let data_dir = data_dir.as_ref().to_path_buf();
        ensure_secure_dir(&data_dir)?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }

    /// Reads a document, treating a missing file as an empty document.
    fn read_document<T>(&self, file: &str) -> Result<T, StorageError>
    where
        T: DeserializeOwned + Default,
    {
        read_document(&self.path(file))
    }

    /// Atomically replaces a document.
    fn write_document<T: Serialize>(&self, file: &str, document: &T) -> Result<(), StorageError> {
        let path = self.path(file);
        let data = serde_json::to_vec_pretty(document)?;

        // tempfile creates the file owner-only on unix.
        let mut tmp = tempfile::NamedTempFile::new_in(&self.data_dir)?;
        tmp.write_all(&data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| StorageError::Io(e.error))?;

        ensure_secure_file(&path)
    }

    fn update_collections<F>(&self, mutate: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut CollectionsDocument),
    {
        let mut document: CollectionsDocument = self.read_document(COLLECTIONS_FILE)?;
        mutate(&mut document);
        self.write_document(COLLECTIONS_FILE, &document)
    }

    fn update_aliases<F>(&self, mutate: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut AliasesDocument),
    {
        let mut document: AliasesDocument = self.read_document(ALIASES_FILE)?;
        mutate(&mut document);
        self.write_document(ALIASES_FILE, &document)
    }
}

/// Reads a JSON document from `path`, returning the default if it does not exist.
pub(crate) fn read_document<T>(path: &Path) -> Result<T, StorageError>
where
    T: DeserializeOwned + Default,
{
    match std::fs::read(path) {
        Ok(data) if data.iter().all(u8::is_ascii_whitespace) => Ok(T::default()),
        Ok(data) => Ok(serde_json::from_slice(&data)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(e.into()),
    }
}

impl Storage for JsonStorage {
    fn load_history(&self) -> Result<Vec<RequestRecord>, StorageError> {
        let document: HistoryDocument = self.read_document(HISTORY_FILE)?;
        Ok(bound_history(&document.requests))
    }

    fn save_history(&self, records: &[RequestRecord]) -> Result<(), StorageError> {
        let document = HistoryDocument {
            requests: bound_history(records),
        };
        self.write_document(HISTORY_FILE, &document)
    }

    fn add_to_history(&self, record: &RequestRecord) -> Result<(), StorageError> {
        let mut document: HistoryDocument = self.read_document(HISTORY_FILE)?;
        let evicted = document.push_front(record.clone());
        if evicted > 0 {
            log::debug!("evicted {} history entries", evicted);
        }
        self.write_document(HISTORY_FILE, &document)
    }

    fn clear_history(&self) -> Result<(), StorageError> {
        self.write_document(HISTORY_FILE, &HistoryDocument::default())
    }

    fn get_history_entry(&self, id: &str) -> Result<Option<RequestRecord>, StorageError> {
        let document: HistoryDocument = self.read_document(HISTORY_FILE)?;
        Ok(document.find(id).cloned())
    }

    fn list_collections(&self) -> Result<Vec<Collection>, StorageError> {
        let document: CollectionsDocument = self.read_document(COLLECTIONS_FILE)?;
        Ok(document.into_sorted())
    }

    fn save_collections(&self, collections: &[Collection]) -> Result<(), StorageError> {
        let document = CollectionsDocument {
            collections: collections
                .iter()
                .map(|c| (c.name.clone(), c.clone()))
                .collect(),
        };
        self.write_document(COLLECTIONS_FILE, &document)
    }

    fn create_collection(&self, name: &str) -> Result<(), StorageError> {
        let mut document: CollectionsDocument = self.read_document(COLLECTIONS_FILE)?;
        if document.collections.contains_key(name) {
            return Ok(());
        }
        document
            .collections
            .insert(name.to_string(), Collection::new(name));
        self.write_document(COLLECTIONS_FILE, &document)
    }

    fn delete_collection(&self, name: &str) -> Result<(), StorageError> {
        self.update_collections(|document| {
            document.collections.remove(name);
        })
    }

    fn get_collection(&self, name: &str) -> Result<Option<Collection>, StorageError> {
        let mut document: CollectionsDocument = self.read_document(COLLECTIONS_FILE)?;
        Ok(document.collections.remove(name))
    }

    fn add_to_collection(&self, name: &str, request: &SavedRequest) -> Result<(), StorageError> {
        self.update_collections(|document| {
            document
                .collections
                .entry(name.to_string())
                .or_insert_with(|| Collection::new(name))
                .requests
                .push(request.clone());
        })
    }

    fn list_aliases(&self) -> Result<AliasMap, StorageError> {
        let document: AliasesDocument = self.read_document(ALIASES_FILE)?;
        Ok(document.aliases)
    }

    fn save_aliases(&self, aliases: &AliasMap) -> Result<(), StorageError> {
        let document = AliasesDocument {
            aliases: aliases.clone(),
        };
        self.write_document(ALIASES_FILE, &document)
    }

    fn create_alias(&self, name: &str, url: &str) -> Result<(), StorageError> {
        self.update_aliases(|document| {
            document.aliases.insert(name.to_string(), url.to_string());
        })
    }

    fn delete_alias(&self, name: &str) -> Result<(), StorageError> {
        self.update_aliases(|document| {
            document.aliases.remove(name);
        })
    }

    fn get_alias(&self, name: &str) -> Result<Option<String>, StorageError> {
        let mut document: AliasesDocument = self.read_document(ALIASES_FILE)?;
        Ok(document.aliases.remove(name))
    }
}
