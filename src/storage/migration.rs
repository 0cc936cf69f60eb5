//! One-time import of legacy JSON documents into a relational store.
//!
//! Runs only while the target holds no history, collections or aliases. Each
//! of the three documents is handled on its own: a document that fails to
//! parse or replay is left in place and the others still proceed. A document
//! whose contents were replayed is renamed with a `.migrated` suffix; the
//! rename marks completion, it is not a lock.

use super::json::read_document;
use super::{Storage, StorageError, ALIASES_FILE, COLLECTIONS_FILE, HISTORY_FILE, MIGRATED_SUFFIX};
use crate::models::{AliasesDocument, CollectionsDocument, HistoryDocument};
use std::fmt;
use std::path::{Path, PathBuf};

/// What happened to one legacy document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileMigration {
    /// No such file.
    Absent,
    /// Contents replayed and the file renamed.
    Migrated { items: usize },
    /// Parse or replay failed; the file was left in place.
    Failed(String),
}

impl fmt::Display for FileMigration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileMigration::Absent => write!(f, "absent"),
            FileMigration::Migrated { items } => write!(f, "{} migrated", items),
            FileMigration::Failed(reason) => write!(f, "failed ({})", reason),
        }
    }
}

/// Outcome of [`migrate_if_empty`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// The target already held data, so nothing was attempted.
    pub skipped: bool,
    pub history: FileMigration,
    pub collections: FileMigration,
    pub aliases: FileMigration,
}

impl MigrationReport {
    fn skipped() -> Self {
        Self {
            skipped: true,
            history: FileMigration::Absent,
            collections: FileMigration::Absent,
            aliases: FileMigration::Absent,
        }
    }

    /// Whether at least one document was imported.
    pub fn migrated_anything(&self) -> bool {
        [&self.history, &self.collections, &self.aliases]
            .iter()
            .any(|m| matches!(m, FileMigration::Migrated { .. }))
    }
}

impl fmt::Display for MigrationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.skipped {
            return write!(f, "skipped, target not empty");
        }
        write!(
            f,
            "history: {}; collections: {}; aliases: {}",
            self.history, self.collections, self.aliases
        )
    }
}

/// Imports `history.json`, `collections.json` and `aliases.json` from
/// `data_dir` into `target` if `target` is empty.
///
/// Never fails: every problem is logged and reflected in the report.
pub fn migrate_if_empty(target: &dyn Storage, data_dir: &Path) -> MigrationReport {
    match target.is_empty() {
        Ok(true) => {}
        Ok(false) => return MigrationReport::skipped(),
        Err(e) => {
            log::warn!("skipping migration, could not inspect target: {}", e);
            return MigrationReport::skipped();
        }
    }

    MigrationReport {
        skipped: false,
        history: migrate_file(&data_dir.join(HISTORY_FILE), |path| {
            let document: HistoryDocument = read_document(path)?;
            // Oldest first, so insertion order agrees with recency.
            for record in document.requests.iter().rev() {
                target.add_to_history(record)?;
            }
            Ok(document.requests.len())
        }),
        collections: migrate_file(&data_dir.join(COLLECTIONS_FILE), |path| {
            let document: CollectionsDocument = read_document(path)?;
            let mut items = 0;
            for collection in document.into_sorted() {
                target.create_collection(&collection.name)?;
                for request in &collection.requests {
                    target.add_to_collection(&collection.name, request)?;
                    items += 1;
                }
            }
            Ok(items)
        }),
        aliases: migrate_file(&data_dir.join(ALIASES_FILE), |path| {
            let document: AliasesDocument = read_document(path)?;
            for (name, url) in &document.aliases {
                target.create_alias(name, url)?;
            }
            Ok(document.aliases.len())
        }),
    }
}

fn migrate_file<F>(path: &Path, replay: F) -> FileMigration
where
    F: FnOnce(&Path) -> Result<usize, StorageError>,
{
    if !path.exists() {
        return FileMigration::Absent;
    }

    let items = match replay(path) {
        Ok(items) => items,
        Err(e) => {
            log::warn!("failed to migrate {}: {}", path.display(), e);
            return FileMigration::Failed(e.to_string());
        }
    };

    let marker = migrated_path(path);
    if let Err(e) = std::fs::rename(path, &marker) {
        log::warn!(
            "migrated {} but could not rename it: {}",
            path.display(),
            e
        );
        return FileMigration::Failed(e.to_string());
    }
    log::debug!("migrated {} item(s) from {}", items, path.display());
    FileMigration::Migrated { items }
}

fn migrated_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(MIGRATED_SUFFIX);
    PathBuf::from(name)
}
