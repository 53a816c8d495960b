//! lolcrawler: a resumable crawler for League of Legends match histories
//!
//! This crate walks the graph formed by players ("summoners") and the
//! matches they played, alternating between the two: a player's matchlist
//! yields match ids, and each match's participant list yields new players.
//! Everything fetched is persisted idempotently so a crawl can be stopped
//! and resumed at any time.

pub mod config;
pub mod crawler;
pub mod output;
pub mod remote;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for lolcrawler operations
#[derive(Debug, Error)]
pub enum LolError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StoreError),

    #[error("Remote API error: {0}")]
    Remote(#[from] remote::ApiError),

    #[error("Crawl error: {0}")]
    Crawl(#[from] crawler::CrawlError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for lolcrawler operations
pub type Result<T> = std::result::Result<T, LolError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Engine, RandomWalk, Snapshot, Strategy};
pub use remote::{MatchApi, Region, RiotClient, Tier};
pub use state::{Frontier, ItemState};
pub use storage::{EntityKind, EntityStore, SqliteStore};
