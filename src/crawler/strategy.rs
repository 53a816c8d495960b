//! Traversal strategies
//!
//! A strategy decides which players the engine crawls next:
//! - [`RandomWalk`] follows participants outward from a seed player forever
//! - [`Snapshot`] crawls the rosters of top-tier leagues inside a time
//!   window, one region/tier pair at a time, and then stops

use crate::config::{CrawlerConfig, SnapshotConfig};
use crate::crawler::observer::CrawlEvent;
use crate::crawler::{CrawlError, Engine};
use crate::remote::{MatchApi, Region, Tier, TimeWindow};
use crate::storage::{EntityKind, EntityStore};
use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Duration;

/// Shortest pause before a pass that follows one without new matches
pub const MIN_IDLE_PASS_PAUSE: Duration = Duration::from_millis(500);

/// A unit of work handed to the engine
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub region: Region,
    pub players: Vec<String>,
    /// Restricts matchlists to this window
    pub window: Option<TimeWindow>,
    /// Clears the frontier once the batch is crawled
    pub flush_after: bool,
}

impl Batch {
    /// One player of an unbounded walk
    pub fn single(region: Region, player: String) -> Self {
        Self {
            region,
            players: vec![player],
            window: None,
            flush_after: false,
        }
    }
}

/// Policy that feeds batches to the engine
#[async_trait]
pub trait Strategy<A, S>: Send
where
    A: MatchApi + 'static,
    S: EntityStore + 'static,
{
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Prepares the engine before the first batch
    async fn seed(&mut self, engine: &mut Engine<A, S>) -> Result<(), CrawlError>;

    /// Returns the next batch, or `None` when there is nothing left to do
    async fn next_batch(&mut self, engine: &mut Engine<A, S>) -> Result<Option<Batch>, CrawlError>;

    fn is_done(&self) -> bool;
}

/// Unbounded crawl following match participants
///
/// Seeds from the most recently stored matchlists of its region, so a
/// restarted walk picks up where the previous process stopped. When the
/// frontier runs dry a new pass starts from the store again.
#[derive(Debug, Clone)]
pub struct RandomWalk {
    region: Region,
    seed_player: String,
    lookback: usize,
    max_players: Option<u64>,
    /// Matches stored when the current pass started
    matches_at_pass_start: Option<u64>,
    done: bool,
}

impl RandomWalk {
    pub fn new(region: Region, seed_player: impl Into<String>, lookback: usize) -> Self {
        Self {
            region,
            seed_player: seed_player.into(),
            lookback,
            max_players: None,
            matches_at_pass_start: None,
            done: false,
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(config.region, config.seed_player.clone(), config.lookback)
    }

    /// Stops the walk after this many players were visited
    pub fn with_max_players(mut self, max_players: Option<u64>) -> Self {
        self.max_players = max_players;
        self
    }

    fn fill_frontier<A, S>(&self, engine: &mut Engine<A, S>) -> Result<(), CrawlError>
    where
        A: MatchApi + 'static,
        S: EntityStore + 'static,
    {
        let recent = engine
            .store()
            .recent_keys(EntityKind::Matchlist, Some(self.region), self.lookback)?;
        let resumed = !recent.is_empty();

        let frontier = engine.frontier_mut();
        let mut players = frontier.seed_players(recent);
        players += frontier.seed_players(std::iter::once(self.seed_player.clone()));

        engine
            .observer()
            .record(CrawlEvent::Seeded { players, resumed });
        Ok(())
    }
}

#[async_trait]
impl<A, S> Strategy<A, S> for RandomWalk
where
    A: MatchApi + 'static,
    S: EntityStore + 'static,
{
    fn name(&self) -> &'static str {
        "random-walk"
    }

    async fn seed(&mut self, engine: &mut Engine<A, S>) -> Result<(), CrawlError> {
        engine.set_region(self.region);
        self.matches_at_pass_start = Some(engine.stats().matches_stored);
        self.fill_frontier(engine)
    }

    async fn next_batch(&mut self, engine: &mut Engine<A, S>) -> Result<Option<Batch>, CrawlError> {
        if let Some(limit) = self.max_players {
            if engine.stats().players_visited >= limit {
                self.done = true;
                return Ok(None);
            }
        }

        if let Some(player) = engine.frontier_mut().pop_player() {
            return Ok(Some(Batch::single(self.region, player)));
        }

        // Frontier ran dry: start a new pass from what is stored, pausing
        // first if the last pass found no new match
        engine.observer().record(CrawlEvent::FrontierExhausted);
        let stored = engine.stats().matches_stored;
        if self.matches_at_pass_start == Some(stored) {
            tokio::time::sleep(engine.settings().retry_backoff.max(MIN_IDLE_PASS_PAUSE)).await;
        }
        self.matches_at_pass_start = Some(stored);

        engine.flush();
        self.fill_frontier(engine)?;

        Ok(engine
            .frontier_mut()
            .pop_player()
            .map(|player| Batch::single(self.region, player)))
    }

    fn is_done(&self) -> bool {
        self.done
    }
}

/// Bounded crawl of top-tier league rosters
#[derive(Debug, Clone)]
pub struct Snapshot {
    pairs: Vec<(Region, Tier)>,
    window: TimeWindow,
    cursor: usize,
}

impl Snapshot {
    /// Plans one pass over every region/tier combination
    pub fn new(regions: &[Region], tiers: &[Tier], window: TimeWindow) -> Self {
        let pairs = regions
            .iter()
            .flat_map(|&region| tiers.iter().map(move |&tier| (region, tier)))
            .collect();
        Self {
            pairs,
            window,
            cursor: 0,
        }
    }

    pub fn from_config(config: &SnapshotConfig, window: TimeWindow) -> Self {
        Self::new(&config.regions, &config.tiers, window)
    }

    pub fn pairs(&self) -> &[(Region, Tier)] {
        &self.pairs
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }
}

#[async_trait]
impl<A, S> Strategy<A, S> for Snapshot
where
    A: MatchApi + 'static,
    S: EntityStore + 'static,
{
    fn name(&self) -> &'static str {
        "snapshot"
    }

    async fn seed(&mut self, engine: &mut Engine<A, S>) -> Result<(), CrawlError> {
        engine.observer().record(CrawlEvent::SnapshotPlanned {
            pairs: self.pairs.len(),
            window: self.window.to_string(),
        });
        Ok(())
    }

    async fn next_batch(&mut self, engine: &mut Engine<A, S>) -> Result<Option<Batch>, CrawlError> {
        while let Some(&(region, tier)) = self.pairs.get(self.cursor) {
            self.cursor += 1;

            let names = match engine.fetch_roster(region, tier).await? {
                Some(names) => names,
                None => {
                    engine.flush();
                    continue;
                }
            };

            let mut seen = HashSet::new();
            let players: Vec<String> = names
                .into_iter()
                .filter(|name| seen.insert(name.clone()))
                .collect();

            return Ok(Some(Batch {
                region,
                players,
                window: Some(self.window),
                flush_after: true,
            }));
        }

        Ok(None)
    }

    fn is_done(&self) -> bool {
        self.cursor >= self.pairs.len()
    }
}
