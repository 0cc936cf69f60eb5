//! Batch runner for saved collections.
//!
//! Replays every request of a collection once, in stored order, one at a
//! time. A failing item is recorded and the run moves on; the run as a whole
//! only fails when the collection is missing or empty. Results are returned to
//! the caller and are not written to history.

use crate::aliases::resolve_alias;
use crate::error::Error;
use crate::executor::Executor;
use crate::models::{ResponseRecord, SavedRequest, Warning};
use crate::security::url_guard;
use crate::storage::Storage;

/// The outcome of one replayed request.
#[derive(Debug)]
pub struct BatchItem {
    /// The request as saved in the collection.
    pub request: SavedRequest,

    /// The URL after alias expansion.
    pub resolved_url: String,

    /// The response, or why there is none.
    pub outcome: Result<ResponseRecord, Error>,

    /// Validator and executor warnings for this item.
    pub warnings: Vec<Warning>,
}

impl BatchItem {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Drives a collection through alias resolution, validation and execution.
pub struct BatchRunner<'a> {
    executor: &'a Executor,
    storage: &'a dyn Storage,
}

impl<'a> BatchRunner<'a> {
    pub fn new(executor: &'a Executor, storage: &'a dyn Storage) -> Self {
        Self { executor, storage }
    }

    /// Runs every request of the named collection.
    ///
    /// # Arguments
    ///
    /// * `name` - Collection to replay
    ///
    /// # Returns
    ///
    /// One [`BatchItem`] per saved request, in replay order, even if every
    /// item failed.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` or `Error::EmptyCollection` before anything
    /// is sent, or `Error::Storage` if the collection could not be loaded.
    pub async fn run_collection(&self, name: &str) -> Result<Vec<BatchItem>, Error> {
        let collection = self
            .storage
            .get_collection(name)?
            .ok_or_else(|| Error::NotFound(name.to_string()))?;
        if collection.is_empty() {
            return Err(Error::EmptyCollection(name.to_string()));
        }

        let total = collection.len();
        log::info!("running collection '{}' ({} requests)", name, total);

        let mut items = Vec::with_capacity(total);
        for (index, request) in collection.requests.into_iter().enumerate() {
            let item = self.run_item(request).await;
            match &item.outcome {
                Ok(response) => log::info!(
                    "[{}/{}] {} -> {}",
                    index + 1,
                    total,
                    item.request.label(),
                    response.status
                ),
                Err(e) => log::warn!(
                    "[{}/{}] {} failed: {}",
                    index + 1,
                    total,
                    item.request.label(),
                    e
                ),
            }
            items.push(item);
        }

        Ok(items)
    }

    async fn run_item(&self, request: SavedRequest) -> BatchItem {
        let resolved_url = resolve_alias(&request.url, self.storage);
        let mut warnings = Vec::new();

        let outcome = match url_guard::validate(&resolved_url) {
            Ok(validated) => {
                warnings.extend(validated.warnings);
                self.executor
                    .execute(request.method, &validated.url, &request.headers, &request.body)
                    .await
                    .map(|execution| {
                        warnings.extend(execution.warnings);
                        execution.response
                    })
                    .map_err(Error::from)
            }
            Err(e) => Err(Error::from(e)),
        };

        BatchItem {
            request,
            resolved_url,
            outcome,
            warnings,
        }
    }
}
