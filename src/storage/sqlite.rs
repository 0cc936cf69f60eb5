//! Relational backend.
//!
//! History, collections, saved requests and aliases live in normalized tables
//! of a single SQLite database. Saved requests carry an explicit `position`
//! column for replay order and reference their collection with a cascading
//! foreign key. Header maps are stored as JSON text.

use super::{
    bound_history, ensure_secure_dir, ensure_secure_file, migration, AliasMap, Storage,
    StorageError, DATABASE_FILE,
};
use crate::models::{
    Collection, Headers, HttpMethod, RequestRecord, ResponseRecord, SavedRequest, HISTORY_CAPACITY,
};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS history (
        id                   TEXT PRIMARY KEY,
        timestamp            TEXT NOT NULL,
        method               TEXT NOT NULL,
        url                  TEXT NOT NULL,
        headers              TEXT DEFAULT '{}',
        body                 TEXT DEFAULT '',
        response_status_code INTEGER,
        response_status      TEXT,
        response_headers     TEXT,
        response_body        TEXT,
        response_duration_ms INTEGER
    );
    CREATE INDEX IF NOT EXISTS idx_history_timestamp ON history(timestamp DESC);

    CREATE TABLE IF NOT EXISTS collections (
        id   INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT UNIQUE NOT NULL
    );

    CREATE TABLE IF NOT EXISTS saved_requests (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        collection_id INTEGER NOT NULL,
        name          TEXT DEFAULT '',
        method        TEXT NOT NULL,
        url           TEXT NOT NULL,
        headers       TEXT DEFAULT '{}',
        body          TEXT DEFAULT '',
        position      INTEGER NOT NULL,
        FOREIGN KEY (collection_id) REFERENCES collections(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_saved_requests_collection
        ON saved_requests(collection_id, position);

    CREATE TABLE IF NOT EXISTS aliases (
        name TEXT PRIMARY KEY,
        url  TEXT NOT NULL
    );
";

const HISTORY_COLUMNS: &str = "id, timestamp, method, url, headers, body, \
     response_status_code, response_status, response_headers, response_body, response_duration_ms";

/// Newest first; rowid breaks ties between identical timestamps.
const HISTORY_ORDER: &str = "ORDER BY timestamp DESC, rowid DESC";

/// SQLite-backed storage.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens `<data_dir>/apicli.db`, creating it owner-only if needed, and
    /// imports legacy JSON documents when the database is still empty.
    ///
    /// Migration problems are logged and never fail the open.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the directory, the file or the schema
    /// cannot be set up.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let data_dir = data_dir.as_ref();
        ensure_secure_dir(data_dir)?;

        let db_path = data_dir.join(DATABASE_FILE);
        ensure_secure_file(&db_path)?;

        let storage = Self::from_connection(Connection::open(&db_path)?)?;

        let report = migration::migrate_if_empty(&storage, data_dir);
        if report.migrated_anything() {
            log::info!("imported legacy JSON data: {}", report);
        }
        Ok(storage)
    }

    /// Opens a private in-memory database. Nothing is migrated.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    fn collection_id(&self, name: &str) -> Result<Option<i64>, StorageError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id FROM collections WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .optional()?)
    }
}

fn encode_headers(headers: &Headers) -> Result<String, StorageError> {
    Ok(serde_json::to_string(headers)?)
}

/// Decodes a header column. Unreadable values become an empty map.
fn decode_headers(raw: Option<String>) -> Headers {
    match raw.as_deref() {
        None | Some("") => Headers::new(),
        Some(text) => serde_json::from_str(text).unwrap_or_else(|e| {
            log::warn!("ignoring unreadable headers column: {}", e);
            Headers::new()
        }),
    }
}

fn encode_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn conversion_error<E>(column: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(err))
}

fn map_history_row(row: &Row<'_>) -> rusqlite::Result<RequestRecord> {
    let timestamp: String = row.get(1)?;
    let timestamp = DateTime::parse_from_rfc3339(&timestamp)
        .map_err(|e| conversion_error(1, e))?
        .with_timezone(&Utc);
    let method: String = row.get(2)?;
    let method: HttpMethod = method.parse().map_err(|e| conversion_error(2, e))?;

    let response = match row.get::<_, Option<i64>>(6)? {
        Some(code) => Some(ResponseRecord {
            status_code: u16::try_from(code).map_err(|e| conversion_error(6, e))?,
            status: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
            headers: decode_headers(row.get(8)?),
            body: row.get::<_, Option<String>>(9)?.unwrap_or_default(),
            duration_ms: row
                .get::<_, Option<i64>>(10)?
                .and_then(|d| u64::try_from(d).ok())
                .unwrap_or(0),
        }),
        None => None,
    };

    Ok(RequestRecord {
        id: row.get(0)?,
        timestamp,
        method,
        url: row.get(3)?,
        headers: decode_headers(row.get(4)?),
        body: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        response,
    })
}

fn map_saved_row(row: &Row<'_>) -> rusqlite::Result<SavedRequest> {
    let method: String = row.get(1)?;
    Ok(SavedRequest {
        name: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
        method: method.parse().map_err(|e| conversion_error(1, e))?,
        url: row.get(2)?,
        headers: decode_headers(row.get(3)?),
        body: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
    })
}

/// Inserts or replaces one history row.
fn insert_history(conn: &Connection, record: &RequestRecord) -> Result<(), StorageError> {
    let response = record.response.as_ref();
    let response_headers = response.map(|r| encode_headers(&r.headers)).transpose()?;

    conn.execute(
        &format!(
            "INSERT OR REPLACE INTO history ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            HISTORY_COLUMNS
        ),
        params![
            record.id,
            encode_timestamp(&record.timestamp),
            record.method.as_str(),
            record.url,
            encode_headers(&record.headers)?,
            record.body,
            response.map(|r| i64::from(r.status_code)),
            response.map(|r| r.status.as_str()),
            response_headers,
            response.map(|r| r.body.as_str()),
            response.map(|r| i64::try_from(r.duration_ms).unwrap_or(i64::MAX)),
        ],
    )?;
    Ok(())
}

/// Deletes everything beyond the newest [`HISTORY_CAPACITY`] rows.
fn evict_history(conn: &Connection) -> Result<usize, StorageError> {
    let capacity = i64::try_from(HISTORY_CAPACITY).unwrap_or(i64::MAX);
    let evicted = conn.execute(
        &format!(
            "DELETE FROM history WHERE id NOT IN (SELECT id FROM history {} LIMIT ?1)",
            HISTORY_ORDER
        ),
        [capacity],
    )?;
    Ok(evicted)
}

fn insert_saved(
    conn: &Connection,
    collection_id: i64,
    request: &SavedRequest,
    position: i64,
) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO saved_requests (collection_id, name, method, url, headers, body, position)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            collection_id,
            request.name,
            request.method.as_str(),
            request.url,
            encode_headers(&request.headers)?,
            request.body,
            position,
        ],
    )?;
    Ok(())
}

fn load_saved(conn: &Connection, collection_id: i64) -> Result<Vec<SavedRequest>, StorageError> {
    let mut stmt = conn.prepare(
        "SELECT name, method, url, headers, body
         FROM saved_requests
         WHERE collection_id = ?1
         ORDER BY position",
    )?;
    let rows = stmt.query_map([collection_id], map_saved_row)?;
    let mut requests = Vec::new();
    for row in rows {
        requests.push(row?);
    }
    Ok(requests)
}

impl Storage for SqliteStorage {
    fn load_history(&self) -> Result<Vec<RequestRecord>, StorageError> {
        let capacity = i64::try_from(HISTORY_CAPACITY).unwrap_or(i64::MAX);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM history {} LIMIT ?1",
            HISTORY_COLUMNS, HISTORY_ORDER
        ))?;
        let rows = stmt.query_map([capacity], map_history_row)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    fn save_history(&self, records: &[RequestRecord]) -> Result<(), StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM history", [])?;
        // Oldest first so rowid order agrees with recency on equal timestamps.
        for record in bound_history(records).iter().rev() {
            insert_history(&tx, record)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn add_to_history(&self, record: &RequestRecord) -> Result<(), StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        insert_history(&tx, record)?;
        let evicted = evict_history(&tx)?;
        tx.commit()?;
        if evicted > 0 {
            log::debug!("evicted {} history entries", evicted);
        }
        Ok(())
    }

    fn clear_history(&self) -> Result<(), StorageError> {
        self.conn.execute("DELETE FROM history", [])?;
        Ok(())
    }

    fn get_history_entry(&self, id: &str) -> Result<Option<RequestRecord>, StorageError> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {} FROM history WHERE id = ?1", HISTORY_COLUMNS),
                [id],
                map_history_row,
            )
            .optional()?)
    }

    fn list_collections(&self) -> Result<Vec<Collection>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM collections ORDER BY name")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?;

        let mut collections = Vec::new();
        for row in rows {
            let (id, name) = row?;
            collections.push(Collection {
                name,
                requests: load_saved(&self.conn, id)?,
            });
        }
        Ok(collections)
    }

    fn save_collections(&self, collections: &[Collection]) -> Result<(), StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        // Cascades to saved_requests.
        tx.execute("DELETE FROM collections", [])?;
        for collection in collections {
            tx.execute(
                "INSERT INTO collections (name) VALUES (?1)",
                [&collection.name],
            )?;
            let id = tx.last_insert_rowid();
            for (position, request) in (0_i64..).zip(&collection.requests) {
                insert_saved(&tx, id, request, position)?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn create_collection(&self, name: &str) -> Result<(), StorageError> {
        self.conn
            .execute("INSERT OR IGNORE INTO collections (name) VALUES (?1)", [name])?;
        Ok(())
    }

    fn delete_collection(&self, name: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM collections WHERE name = ?1", [name])?;
        Ok(())
    }

    fn get_collection(&self, name: &str) -> Result<Option<Collection>, StorageError> {
        match self.collection_id(name)? {
            Some(id) => Ok(Some(Collection {
                name: name.to_string(),
                requests: load_saved(&self.conn, id)?,
            })),
            None => Ok(None),
        }
    }

    fn add_to_collection(&self, name: &str, request: &SavedRequest) -> Result<(), StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("INSERT OR IGNORE INTO collections (name) VALUES (?1)", [name])?;
        let id: i64 = tx.query_row(
            "SELECT id FROM collections WHERE name = ?1",
            [name],
            |row| row.get(0),
        )?;
        let position: i64 = tx.query_row(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM saved_requests WHERE collection_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        insert_saved(&tx, id, request, position)?;
        tx.commit()?;
        Ok(())
    }

    fn list_aliases(&self) -> Result<AliasMap, StorageError> {
        let mut stmt = self.conn.prepare("SELECT name, url FROM aliases")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut aliases = AliasMap::new();
        for row in rows {
            let (name, url) = row?;
            aliases.insert(name, url);
        }
        Ok(aliases)
    }

    fn save_aliases(&self, aliases: &AliasMap) -> Result<(), StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM aliases", [])?;
        for (name, url) in aliases {
            tx.execute("INSERT INTO aliases (name, url) VALUES (?1, ?2)", [name, url])?;
        }
        tx.commit()?;
        Ok(())
    }

    fn create_alias(&self, name: &str, url: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO aliases (name, url) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET url = excluded.url",
            [name, url],
        )?;
        Ok(())
    }

    fn delete_alias(&self, name: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM aliases WHERE name = ?1", [name])?;
        Ok(())
    }

    fn get_alias(&self, name: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .conn
            .query_row("SELECT url FROM aliases WHERE name = ?1", [name], |row| {
                row.get(0)
            })
            .optional()?)
    }

    fn is_empty(&self) -> Result<bool, StorageError> {
        let rows: i64 = self.conn.query_row(
            "SELECT (SELECT COUNT(*) FROM history)
                  + (SELECT COUNT(*) FROM collections)
                  + (SELECT COUNT(*) FROM aliases)",
            [],
            |row| row.get(0),
        )?;
        Ok(rows == 0)
    }
}
