//! Data models for requests, responses, collections and warnings.
//!
//! These are the types that flow between the executor, the redaction filter
//! and the storage backends, and the shapes that get persisted.

pub mod collection;
pub mod request;
pub mod response;
pub mod warning;

pub use collection::{
    AliasesDocument, Collection, CollectionsDocument, HistoryDocument, HISTORY_CAPACITY,
};
pub use request::{
    header_value, Headers, HttpMethod, HttpMethodParseError, RequestRecord, SavedRequest,
};
pub use response::{status_line, ResponseRecord};
pub use warning::Warning;
