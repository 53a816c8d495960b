//! Crawler module for match graph traversal
//!
//! This module contains the core crawling logic, including:
//! - The engine running the player and match cycles
//! - Extraction of match ids, participants and match summaries
//! - The random-walk and snapshot traversal strategies
//! - Event reporting through an injected observer

mod engine;
mod extract;
mod observer;
mod strategy;

#[cfg(test)]
mod testing;

pub use engine::{Engine, EngineSettings, PlayerOutcome, SessionStats, Shutdown};
pub use extract::{
    extract_match, match_ids, participant_names, Extraction, ExtractionError, MatchSummary,
    ParticipantSummary,
};
pub use observer::{CrawlEvent, CrawlObserver, RecordingObserver, SkipReason, TracingObserver};
pub use strategy::{Batch, RandomWalk, Snapshot, Strategy};

use crate::config::Config;
use crate::remote::{ApiError, RiotClient, TimeWindow};
use crate::storage::{SqliteStore, StoreError};
use crate::LolError;
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Failures of a crawl
///
/// Per-item failures are handled inside the engine and never leave a
/// cycle; only the ones returned from [`Engine::run`] end a crawl.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Not found upstream: {0}")]
    NotFoundRemote(String),

    #[error("Transient remote failure: {0}")]
    TransientRemote(String),

    #[error("Remote rejected the request: {0}")]
    FatalRemote(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Malformed document: {0}")]
    MalformedDocument(String),
}

impl CrawlError {
    /// Returns true if the process must stop
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_) | Self::FatalRemote(_))
    }
}

impl From<ApiError> for CrawlError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::NotFound(msg) => Self::NotFoundRemote(msg),
            ApiError::Transient(msg) => Self::TransientRemote(msg),
            ApiError::Fatal(msg) => Self::FatalRemote(msg),
            ApiError::Decode(msg) => Self::MalformedDocument(msg),
        }
    }
}

impl From<StoreError> for CrawlError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Serialization(msg) => Self::MalformedDocument(msg),
            other => Self::StoreUnavailable(other.to_string()),
        }
    }
}

/// Production engine over HTTP and SQLite
pub type LiveEngine = Engine<RiotClient, SqliteStore>;

/// Builds the production engine from a configuration
pub fn build_engine(config: &Config) -> Result<LiveEngine, LolError> {
    let client = RiotClient::new(&config.api)?;
    let store = SqliteStore::new(Path::new(&config.storage.database_path))?;

    Ok(Engine::new(
        client,
        store,
        config.crawler.region,
        EngineSettings::from_config(&config.crawler),
        Arc::new(TracingObserver),
    ))
}

/// Runs the unbounded random walk until shutdown or a fatal error
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `max_players` - Optional cap on visited players
/// * `shutdown` - Stop signal checked between cycles
///
/// # Example
///
/// ```no_run
/// use lolcrawler::config::load_config;
/// use lolcrawler::crawler::{run_random_walk, Shutdown};
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// run_random_walk(&config, None, &Shutdown::new()).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_random_walk(
    config: &Config,
    max_players: Option<u64>,
    shutdown: &Shutdown,
) -> Result<SessionStats, LolError> {
    let mut engine = build_engine(config)?;
    let mut walk = RandomWalk::from_config(&config.crawler).with_max_players(max_players);
    Ok(engine.run(&mut walk, shutdown).await?)
}

/// Runs one snapshot pass over the configured regions and tiers
///
/// The window covers the configured number of days up to now.
pub async fn run_snapshot(config: &Config, shutdown: &Shutdown) -> Result<SessionStats, LolError> {
    let mut engine = build_engine(config)?;
    let window = TimeWindow::last_days(config.snapshot.window_days, Utc::now());
    let mut snapshot = Snapshot::from_config(&config.snapshot, window);
    Ok(engine.run(&mut snapshot, shutdown).await?)
}
