//! Crawl event reporting
//!
//! The engine never logs directly. It reports what happens to a
//! [`CrawlObserver`], which decides where the events go. The binary uses
//! [`TracingObserver`]; tests use [`RecordingObserver`] to assert on what
//! the engine did.

use crate::crawler::SessionStats;
use crate::remote::{Region, Tier};
use crate::state::ItemState;
use std::sync::Mutex;

/// Why a match was not fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Already durable in the store
    AlreadyStored,
    /// Failed too often in earlier attempts
    GivenUp,
}

/// Something that happened during a crawl
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlEvent {
    RunStarted {
        strategy: &'static str,
    },
    Seeded {
        players: usize,
        resumed: bool,
    },
    SnapshotPlanned {
        pairs: usize,
        window: String,
    },
    BatchStarted {
        region: Region,
        players: usize,
    },
    PlayerStored {
        name: String,
        matches: usize,
        queued: usize,
    },
    PlayerAbandoned {
        name: String,
        state: ItemState,
        reason: String,
    },
    MatchStored {
        id: String,
        discovered: usize,
    },
    MatchSkipped {
        id: String,
        reason: SkipReason,
    },
    /// The store already held the match when the write happened
    MatchDuplicate {
        id: String,
    },
    MatchAbandoned {
        id: String,
        state: ItemState,
        reason: String,
    },
    RetryScheduled {
        item: String,
        reason: String,
    },
    ExtractionDegraded {
        id: String,
        problems: Vec<String>,
    },
    ParticipantsMalformed {
        id: String,
        reason: String,
    },
    RosterFetched {
        region: Region,
        tier: Tier,
        players: usize,
    },
    RosterFailed {
        region: Region,
        tier: Tier,
        reason: String,
    },
    FrontierFlushed,
    FrontierExhausted,
    Progress(SessionStats),
    Interrupted,
    RunFinished(SessionStats),
}

/// Receiver of crawl events
pub trait CrawlObserver: Send + Sync {
    fn record(&self, event: CrawlEvent);
}

/// Forwards crawl events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl CrawlObserver for TracingObserver {
    fn record(&self, event: CrawlEvent) {
        match event {
            CrawlEvent::RunStarted { strategy } => {
                tracing::info!("Starting {} crawl", strategy);
            }
            CrawlEvent::Seeded { players, resumed } => {
                if resumed {
                    tracing::info!("Resuming from {} recently stored players", players);
                } else {
                    tracing::info!("Nothing stored yet, starting from the seed player");
                }
            }
            CrawlEvent::SnapshotPlanned { pairs, window } => {
                tracing::info!("Snapshot of {} region/tier pairs over {}", pairs, window);
            }
            CrawlEvent::BatchStarted { region, players } => {
                tracing::debug!("Crawling {} players in {}", players, region);
            }
            CrawlEvent::PlayerStored {
                name,
                matches,
                queued,
            } => {
                tracing::info!(
                    "Stored matchlist of {} ({} matches, {} new)",
                    name,
                    matches,
                    queued
                );
            }
            CrawlEvent::PlayerAbandoned {
                name,
                state,
                reason,
            } => {
                tracing::warn!("Dropping player {} ({}): {}", name, state, reason);
            }
            CrawlEvent::MatchStored { id, discovered } => {
                tracing::debug!("Stored match {} ({} new players)", id, discovered);
            }
            CrawlEvent::MatchSkipped { id, reason } => match reason {
                SkipReason::AlreadyStored => tracing::debug!("Match {} already stored", id),
                SkipReason::GivenUp => tracing::debug!("Match {} failed too often, skipping", id),
            },
            CrawlEvent::MatchDuplicate { id } => {
                tracing::warn!("Match {} was stored concurrently, keeping the existing copy", id);
            }
            CrawlEvent::MatchAbandoned { id, state, reason } => {
                tracing::warn!("Dropping match {} ({}): {}", id, state, reason);
            }
            CrawlEvent::RetryScheduled { item, reason } => {
                tracing::warn!("Retrying {} after transient failure: {}", item, reason);
            }
            CrawlEvent::ExtractionDegraded { id, problems } => {
                tracing::warn!("Partial extraction for match {}: {}", id, problems.join("; "));
            }
            CrawlEvent::ParticipantsMalformed { id, reason } => {
                tracing::error!("Could not read participants of match {}: {}", id, reason);
            }
            CrawlEvent::RosterFetched {
                region,
                tier,
                players,
            } => {
                tracing::info!("{} {} roster: {} players", region, tier.as_str(), players);
            }
            CrawlEvent::RosterFailed {
                region,
                tier,
                reason,
            } => {
                tracing::error!(
                    "Skipping {} {}: roster unavailable: {}",
                    region,
                    tier.as_str(),
                    reason
                );
            }
            CrawlEvent::FrontierFlushed => tracing::debug!("Frontier flushed"),
            CrawlEvent::FrontierExhausted => {
                tracing::info!("Frontier exhausted, starting a new pass from stored players");
            }
            CrawlEvent::Progress(stats) => {
                tracing::info!(
                    "Progress: {} players, {} matches stored, {} skipped, {} failed",
                    stats.players_visited,
                    stats.matches_stored,
                    stats.matches_skipped,
                    stats.matches_failed
                );
            }
            CrawlEvent::Interrupted => tracing::info!("Shutdown requested, stopping crawl"),
            CrawlEvent::RunFinished(stats) => {
                tracing::info!(
                    "Crawl finished: {} players ({} stored), {} matches stored",
                    stats.players_visited,
                    stats.players_stored,
                    stats.matches_stored
                );
            }
        }
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<CrawlEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the events recorded so far
    pub fn events(&self) -> Vec<CrawlEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Counts recorded events matching a predicate
    pub fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&CrawlEvent) -> bool,
    {
        self.events().iter().filter(|event| predicate(event)).count()
    }
}

impl CrawlObserver for RecordingObserver {
    fn record(&self, event: CrawlEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
