//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::remote::Region;
use crate::storage::{EntityKind, FailureRecord, StoreOutcome};
use rusqlite::ErrorCode;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database cannot be reached or written; crawling must stop
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("SQLite error: {0}")]
    Sqlite(rusqlite::Error),
}

impl StoreError {
    /// Returns true if continuing would risk losing crawl progress silently
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Serialization(_))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        match e.sqlite_error_code() {
            Some(
                ErrorCode::CannotOpen
                | ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::SystemIoFailure
                | ErrorCode::NotADatabase
                | ErrorCode::DatabaseCorrupt
                | ErrorCode::ReadOnly
                | ErrorCode::DiskFull
                | ErrorCode::PermissionDenied
                | ErrorCode::OutOfMemory,
            ) => Self::Unavailable(e.to_string()),
            _ => Self::Sqlite(e),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Trait for document store implementations
///
/// Documents live in one collection per [`EntityKind`], keyed by a string
/// identifier. Matches are write-once, matchlists are replaced on every
/// crawl.
pub trait EntityStore: Send {
    // ===== Documents =====

    /// Writes a document under `id` in the `kind` collection
    ///
    /// With `upsert = false` a single insert is attempted and an existing
    /// key is reported as [`StoreOutcome::Duplicate`] rather than an error.
    /// With `upsert = true` any existing document is fully replaced.
    fn store(
        &mut self,
        id: &str,
        kind: EntityKind,
        doc: &Value,
        upsert: bool,
    ) -> StoreResult<StoreOutcome>;

    /// Checks whether a document with this key is present
    fn exists(&self, id: &str, kind: EntityKind) -> StoreResult<bool>;

    /// Loads a stored document
    fn load(&self, id: &str, kind: EntityKind) -> StoreResult<Option<Value>>;

    /// Returns keys of the most recently written documents, newest first
    ///
    /// When `region` is given, only documents tagged with that region are
    /// considered.
    fn recent_keys(
        &self,
        kind: EntityKind,
        region: Option<Region>,
        limit: usize,
    ) -> StoreResult<Vec<String>>;

    // ===== Failure Ledger =====

    /// Records a failed attempt to fetch a match
    ///
    /// A permanent failure makes every later lookup report the match as
    /// given up on, regardless of the attempt count.
    fn record_failure(&mut self, id: &str, error: &str, permanent: bool) -> StoreResult<FailureRecord>;

    /// Gets the failure record of a match, if any
    fn failure(&self, id: &str) -> StoreResult<Option<FailureRecord>>;

    /// Forgets earlier failures of a match
    fn clear_failure(&mut self, id: &str) -> StoreResult<()>;

    // ===== Statistics =====

    /// Counts the documents of a collection
    fn count(&self, kind: EntityKind) -> StoreResult<u64>;

    /// Counts documents per region tag
    fn count_by_region(&self, kind: EntityKind) -> StoreResult<Vec<(String, u64)>>;

    /// Counts matches in the failure ledger
    fn count_failures(&self) -> StoreResult<u64>;
}
