//! Storage module for persisting crawl data
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Write-once match documents and replaceable matchlists
//! - Existence checks used to skip already crawled matches
//! - The failure ledger that remembers matches which could not be fetched

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{EntityStore, StoreError, StoreResult};

use std::fmt;
use std::path::Path;

/// Opens or creates the store database
pub fn open_store(path: &Path) -> StoreResult<SqliteStore> {
    SqliteStore::new(path)
}

/// The two document collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Player matchlists, keyed by display name
    Matchlist,
    /// Full match documents, keyed by match id
    Match,
}

impl EntityKind {
    /// Logical collection name
    pub fn collection(&self) -> &'static str {
        match self {
            Self::Matchlist => "matchlist",
            Self::Match => "match",
        }
    }

    /// Backing SQLite table
    pub(crate) fn table(&self) -> &'static str {
        match self {
            Self::Matchlist => "matchlists",
            Self::Match => "matches",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection())
    }
}

/// What a write actually did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    Inserted,
    Replaced,
    /// The key was already present and nothing was written
    Duplicate,
}

/// A match the crawler failed to fetch
#[derive(Debug, Clone, PartialEq)]
pub struct FailureRecord {
    pub id: String,
    pub attempts: u32,
    pub permanent: bool,
    pub last_error: String,
    pub last_attempt_at: String,
}

impl FailureRecord {
    /// Returns true if the match should not be fetched again
    pub fn is_given_up(&self, max_failures: u32) -> bool {
        self.permanent || self.attempts >= max_failures
    }
}
