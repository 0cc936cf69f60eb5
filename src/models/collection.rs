//! Collections, the history log and the on-disk document shapes.
//!
//! The document types mirror the persisted JSON layout exactly; both storage
//! backends hand these same shapes back to callers.

use super::request::{RequestRecord, SavedRequest};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Maximum number of entries retained in the history log.
pub const HISTORY_CAPACITY: usize = 100;

/// A named, ordered group of saved requests. Order is replay order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub name: String,
    #[serde(default)]
    pub requests: Vec<SavedRequest>,
}

impl Collection {
    /// Creates an empty collection.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requests: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }
}

/// The history log, most recent first. `history.json` holds exactly this.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryDocument {
    #[serde(default)]
    pub requests: Vec<RequestRecord>,
}

impl HistoryDocument {
    /// Inserts a record at the front, re-establishes most-recent-first order by
    /// timestamp and evicts anything beyond [`HISTORY_CAPACITY`].
    ///
    /// The sort is stable, so a new record with the same timestamp as an
    /// existing one stays ahead of it.
    ///
    /// # Returns
    ///
    /// The number of evicted records.
    pub fn push_front(&mut self, record: RequestRecord) -> usize {
        self.requests.insert(0, record);
        self.requests.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        let evicted = self.requests.len().saturating_sub(HISTORY_CAPACITY);
        self.requests.truncate(HISTORY_CAPACITY);
        evicted
    }

    /// Finds a record by its identifier.
    pub fn find(&self, id: &str) -> Option<&RequestRecord> {
        self.requests.iter().find(|r| r.id == id)
    }
}

/// All collections keyed by name. `collections.json` holds exactly this.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionsDocument {
    #[serde(default)]
    pub collections: HashMap<String, Collection>,
}

impl CollectionsDocument {
    /// Returns the collections sorted by name.
    pub fn into_sorted(self) -> Vec<Collection> {
        let mut collections: Vec<Collection> = self.collections.into_values().collect();
        collections.sort_by(|a, b| a.name.cmp(&b.name));
        collections
    }
}

/// Alias name to base URL. `aliases.json` holds exactly this.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AliasesDocument {
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}
