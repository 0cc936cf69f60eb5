//! Operations exposed to the command-line layer.
//!
//! A [`Session`] owns one storage backend and one executor for the lifetime
//! of an invocation. Every operation the CLI needs goes through it: ad-hoc
//! requests, history, collections, batch runs and aliases.
//!
//! Per-invocation request flags travel in [`RequestOptions`] rather than in
//! shared state.

use crate::aliases::resolve_alias;
use crate::config::ClientConfig;
use crate::error::Error;
use crate::executor::{ExecutionConfig, Executor};
use crate::models::{
    Collection, Headers, HttpMethod, RequestRecord, ResponseRecord, SavedRequest, Warning,
};
use crate::runner::{BatchItem, BatchRunner};
use crate::security::{body_looks_sensitive, redact, redact_record, url_guard};
use crate::storage::{open_storage, AliasMap, Storage};

/// Flags that accompany a single request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Headers sent on the wire as given.
    pub headers: Headers,

    /// Request body; empty means none.
    pub body: String,

    /// Skip recording this request in history.
    pub no_history: bool,

    /// Also save the request into this collection after it succeeds.
    pub collection: Option<String>,
}

impl RequestOptions {
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn without_history(mut self) -> Self {
        self.no_history = true;
        self
    }

    pub fn save_to(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }
}

/// Result of [`Session::execute_request`].
#[derive(Debug, Clone)]
pub struct RequestOutcome {
    /// The URL actually requested, after alias expansion.
    pub url: String,

    /// The unredacted response, for display.
    pub response: ResponseRecord,

    /// Everything the user should be told that did not stop the request.
    pub warnings: Vec<Warning>,
}

/// Parses `Key: Value` strings into a header map.
///
/// Keys and values are trimmed. Entries without a colon are skipped; a later
/// entry with the same key wins.
pub fn parse_headers<I, S>(raw: I) -> Headers
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .filter_map(|entry| {
            entry
                .as_ref()
                .split_once(':')
                .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Storage plus executor for one invocation.
pub struct Session {
    storage: Box<dyn Storage>,
    executor: Executor,
}

impl Session {
    /// Opens the configured storage backend and builds the executor.
    ///
    /// # Errors
    ///
    /// Returns `Error::Storage` if the data directory or backend cannot be
    /// opened, or `Error::Network` if the HTTP client cannot be built.
    pub fn open(config: &ClientConfig) -> Result<Self, Error> {
        let storage = open_storage(config)?;
        let executor = Executor::new(ExecutionConfig::from_client_config(config))?;
        Ok(Self::new(storage, executor))
    }

    /// Assembles a session from parts.
    pub fn new(storage: Box<dyn Storage>, executor: Executor) -> Self {
        Self { storage, executor }
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    /// Executes one ad-hoc request.
    ///
    /// Resolves aliases, validates the URL, sends the request and, unless
    /// `options.no_history` is set, records a redacted copy in history. If
    /// `options.collection` is set the request is also saved there with its
    /// headers redacted.
    ///
    /// # Arguments
    ///
    /// * `method` - HTTP method
    /// * `url` - Full URL or alias reference such as `api/users`
    /// * `options` - Headers, body and persistence flags
    ///
    /// # Returns
    ///
    /// The response with all warnings. Failing to write history or to save
    /// into the collection never fails the request.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if the URL is refused and `Error::Network`
    /// if the request could not be completed.
    pub async fn execute_request(
        &self,
        method: HttpMethod,
        url: &str,
        options: &RequestOptions,
    ) -> Result<RequestOutcome, Error> {
        let resolved = resolve_alias(url, self.storage());
        let validated = url_guard::validate(&resolved)?;
        let mut warnings = validated.warnings;

        if !options.no_history && body_looks_sensitive(&options.body) {
            log::warn!("request body to {} looks sensitive and will be stored", resolved);
            warnings.push(Warning::SensitiveBody);
        }

        let execution = self
            .executor
            .execute(method, &validated.url, &options.headers, &options.body)
            .await?;
        warnings.extend(execution.warnings);
        let response = execution.response;

        if !options.no_history {
            let record = RequestRecord::new(
                method,
                resolved.clone(),
                options.headers.clone(),
                options.body.clone(),
            )
            .with_response(response.clone());
            self.record_history(&record);
        }

        if let Some(collection) = &options.collection {
            let saved = SavedRequest {
                name: String::new(),
                method,
                url: resolved.clone(),
                headers: redact(&options.headers),
                body: options.body.clone(),
            };
            if let Err(e) = self.storage.add_to_collection(collection, &saved) {
                log::warn!("could not save request to collection '{}': {}", collection, e);
                warnings.push(Warning::CollectionSaveFailed {
                    collection: collection.clone(),
                    reason: e.to_string(),
                });
            }
        }

        Ok(RequestOutcome {
            url: resolved,
            response,
            warnings,
        })
    }

    /// Writes a redacted copy of `record` to history.
    ///
    /// Best effort: a storage failure is logged and otherwise ignored.
    pub fn record_history(&self, record: &RequestRecord) {
        let redacted = redact_record(record);
        if let Err(e) = self.storage.add_to_history(&redacted) {
            log::debug!("history write for {} skipped: {}", record.id, e);
        }
    }

    /// Returns up to `limit` history entries, most recent first.
    pub fn list_history(&self, limit: usize) -> Result<Vec<RequestRecord>, Error> {
        let mut history = self.storage.load_history()?;
        history.truncate(limit);
        Ok(history)
    }

    /// Looks up a history entry by 1-based position or by identifier.
    ///
    /// A number within `1..=len` selects by position; anything else is
    /// matched against entry identifiers.
    pub fn get_history_by_id_or_index(&self, key: &str) -> Result<Option<RequestRecord>, Error> {
        let mut history = self.storage.load_history()?;
        if let Ok(index) = key.trim().parse::<usize>() {
            if (1..=history.len()).contains(&index) {
                return Ok(Some(history.swap_remove(index - 1)));
            }
        }
        Ok(history.into_iter().find(|record| record.id == key))
    }

    pub fn clear_history(&self) -> Result<(), Error> {
        Ok(self.storage.clear_history()?)
    }

    pub fn list_collections(&self) -> Result<Vec<Collection>, Error> {
        Ok(self.storage.list_collections()?)
    }

    pub fn create_collection(&self, name: &str) -> Result<(), Error> {
        Ok(self.storage.create_collection(name)?)
    }

    pub fn get_collection(&self, name: &str) -> Result<Option<Collection>, Error> {
        Ok(self.storage.get_collection(name)?)
    }

    pub fn delete_collection(&self, name: &str) -> Result<(), Error> {
        Ok(self.storage.delete_collection(name)?)
    }

    /// Appends a request to a collection with its headers redacted, creating
    /// the collection if needed.
    pub fn add_saved_request(&self, collection: &str, request: &SavedRequest) -> Result<(), Error> {
        let request = SavedRequest {
            headers: redact(&request.headers),
            ..request.clone()
        };
        Ok(self.storage.add_to_collection(collection, &request)?)
    }

    /// Replays a collection. See [`BatchRunner::run_collection`].
    pub async fn run_collection(&self, name: &str) -> Result<Vec<BatchItem>, Error> {
        BatchRunner::new(&self.executor, self.storage())
            .run_collection(name)
            .await
    }

    pub fn list_aliases(&self) -> Result<AliasMap, Error> {
        Ok(self.storage.list_aliases()?)
    }

    /// Creates or overwrites an alias.
    pub fn create_alias(&self, name: &str, url: &str) -> Result<(), Error> {
        Ok(self.storage.create_alias(name, url)?)
    }

    pub fn get_alias(&self, name: &str) -> Result<Option<String>, Error> {
        Ok(self.storage.get_alias(name)?)
    }

    pub fn delete_alias(&self, name: &str) -> Result<(), Error> {
        Ok(self.storage.delete_alias(name)?)
    }
}
