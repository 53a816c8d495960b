//! Crawl engine - the player and match cycles
//!
//! The engine owns the frontier and drives one item at a time through its
//! lifecycle:
//! - Resolving a player and storing their matchlist
//! - Fetching, summarizing and storing each unseen match
//! - Feeding the participants of stored matches back into the frontier
//!
//! What to crawl next is decided by a [`Strategy`]; the engine only knows
//! how to crawl one batch of players.

use crate::config::CrawlerConfig;
use crate::crawler::extract::{extract_match, match_ids, participant_names};
use crate::crawler::observer::{CrawlEvent, CrawlObserver, SkipReason};
use crate::crawler::{Batch, CrawlError, Strategy};
use crate::remote::{normalize_player_name, ApiError, ApiResult, MatchApi, Region, Tier, TimeWindow};
use crate::state::{Frontier, ItemState};
use crate::storage::{EntityKind, EntityStore, StoreOutcome};
use serde_json::json;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Players visited between two progress reports
const PROGRESS_INTERVAL: u64 = 10;

/// Tunables of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Pause before the single retry of a transient failure
    pub retry_backoff: Duration,
    /// Failed attempts after which a match is no longer fetched
    pub max_failures: u32,
}

impl EngineSettings {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
            max_failures: config.max_failures,
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            retry_backoff: Duration::from_millis(2000),
            max_failures: 3,
        }
    }
}

/// Counters for the current process
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub players_visited: u64,
    pub players_stored: u64,
    pub players_failed: u64,
    pub matches_stored: u64,
    pub matches_skipped: u64,
    pub matches_failed: u64,
}

/// Cooperative stop signal, checked at cycle boundaries
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    requested: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

/// Result of a player cycle
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerOutcome {
    pub state: ItemState,
    /// Match ids listed in the stored matchlist
    pub match_ids: Vec<String>,
}

/// Runs a remote call, repeating it once after a pause if it fails transiently
async fn with_retry<T, F, Fut>(
    observer: &dyn CrawlObserver,
    backoff: Duration,
    item: &str,
    mut call: F,
) -> ApiResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ApiResult<T>>,
{
    match call().await {
        Err(e) if e.is_transient() => {
            observer.record(CrawlEvent::RetryScheduled {
                item: item.to_string(),
                reason: e.to_string(),
            });
            tokio::time::sleep(backoff).await;
            call().await
        }
        other => other,
    }
}

fn failure_state(error: &ApiError) -> ItemState {
    if error.is_transient() {
        ItemState::FailedTransientRetry
    } else {
        ItemState::FailedPermanent
    }
}

/// The crawl engine
pub struct Engine<A, S> {
    api: A,
    store: S,
    observer: Arc<dyn CrawlObserver>,
    settings: EngineSettings,
    region: Region,
    frontier: Frontier,
    stats: SessionStats,
    /// Set once any remote call succeeded in this process
    remote_ok: bool,
}

impl<A, S> Engine<A, S>
where
    A: MatchApi + 'static,
    S: EntityStore + 'static,
{
    pub fn new(
        api: A,
        store: S,
        region: Region,
        settings: EngineSettings,
        observer: Arc<dyn CrawlObserver>,
    ) -> Self {
        Self {
            api,
            store,
            observer,
            settings,
            region,
            frontier: Frontier::new(),
            stats: SessionStats::default(),
            remote_ok: false,
        }
    }

    // ===== Accessors =====

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn frontier_mut(&mut self) -> &mut Frontier {
        &mut self.frontier
    }

    pub fn observer(&self) -> &dyn CrawlObserver {
        &*self.observer
    }

    pub fn settings(&self) -> EngineSettings {
        self.settings
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Region every remote call is scoped to
    pub fn region(&self) -> Region {
        self.region
    }

    pub fn set_region(&mut self, region: Region) {
        self.region = region;
    }

    // ===== Traversal =====

    /// Runs a strategy until it is done or a shutdown is requested
    ///
    /// Only a store failure, or a fatal remote failure before any remote
    /// call succeeded, ends the run with an error.
    pub async fn run<P>(&mut self, strategy: &mut P, shutdown: &Shutdown) -> Result<SessionStats, CrawlError>
    where
        P: Strategy<A, S> + ?Sized,
    {
        self.observer.record(CrawlEvent::RunStarted {
            strategy: strategy.name(),
        });

        strategy.seed(self).await?;

        while !strategy.is_done() {
            if shutdown.is_requested() {
                self.observer.record(CrawlEvent::Interrupted);
                break;
            }

            let batch = match strategy.next_batch(self).await? {
                Some(batch) => batch,
                None => break,
            };

            self.run_batch(batch, shutdown).await?;
        }

        self.observer.record(CrawlEvent::RunFinished(self.stats));
        Ok(self.stats)
    }

    /// Crawls every player of a batch, then every match they yielded
    pub async fn run_batch(&mut self, batch: Batch, shutdown: &Shutdown) -> Result<(), CrawlError> {
        self.region = batch.region;
        self.observer.record(CrawlEvent::BatchStarted {
            region: batch.region,
            players: batch.players.len(),
        });

        for name in &batch.players {
            if shutdown.is_requested() {
                return Ok(());
            }

            self.crawl_matchlist(name, batch.window).await?;

            if self.stats.players_visited % PROGRESS_INTERVAL == 0 {
                self.observer.record(CrawlEvent::Progress(self.stats));
            }
        }

        self.drain_matches(shutdown).await?;

        if batch.flush_after {
            self.flush();
        }

        Ok(())
    }

    /// Runs the match cycle until no match is pending
    pub async fn drain_matches(&mut self, shutdown: &Shutdown) -> Result<(), CrawlError> {
        while !shutdown.is_requested() {
            let id = match self.frontier.pop_match() {
                Some(id) => id,
                None => break,
            };
            self.crawl_match(&id).await?;
        }
        Ok(())
    }

    /// Clears all pending work and done sets
    pub fn flush(&mut self) {
        self.frontier.flush();
        self.observer.record(CrawlEvent::FrontierFlushed);
    }

    // ===== Player Cycle =====

    /// Fetches and stores the matchlist of one player
    ///
    /// The match ids it lists are queued for the match cycle. Remote
    /// failures and malformed documents only drop this player.
    pub async fn crawl_matchlist(
        &mut self,
        name: &str,
        window: Option<TimeWindow>,
    ) -> Result<PlayerOutcome, CrawlError> {
        let region = self.region;
        let backoff = self.settings.retry_backoff;
        self.stats.players_visited += 1;

        let lookup = normalize_player_name(name);
        let lookup = lookup.as_str();
        let api = &self.api;
        let player = with_retry(&*self.observer, backoff, name, move || {
            api.fetch_player(region, lookup)
        })
        .await;
        let player = match self.screen(player)? {
            Ok(player) => player,
            Err(e) => return Ok(self.abandon_player(name, failure_state(&e), e.to_string())),
        };

        let account = player.account_id.as_str();
        let api = &self.api;
        let matchlist = with_retry(&*self.observer, backoff, name, move || {
            api.fetch_matchlist(region, account, window)
        })
        .await;
        let mut matchlist = match self.screen(matchlist)? {
            Ok(matchlist) => matchlist,
            Err(e) => return Ok(self.abandon_player(name, failure_state(&e), e.to_string())),
        };

        match matchlist.as_object_mut() {
            Some(fields) => {
                fields.insert("extractions".to_string(), json!({ "region": region.as_str() }));
            }
            None => {
                return Ok(self.abandon_player(
                    name,
                    ItemState::FailedPermanent,
                    "matchlist is not a JSON object".to_string(),
                ))
            }
        }

        match self.store.store(name, EntityKind::Matchlist, &matchlist, true) {
            Ok(_) => {}
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => return Ok(self.abandon_player(name, ItemState::FailedPermanent, e.to_string())),
        }

        self.frontier.mark_player_done(name);
        self.stats.players_stored += 1;

        let ids = match match_ids(&matchlist) {
            Ok(ids) => ids,
            Err(e) => {
                self.observer.record(CrawlEvent::ExtractionDegraded {
                    id: name.to_string(),
                    problems: vec![e.to_string()],
                });
                Vec::new()
            }
        };
        let queued = self.frontier.enqueue_matches(ids.iter().cloned());

        self.observer.record(CrawlEvent::PlayerStored {
            name: name.to_string(),
            matches: ids.len(),
            queued,
        });

        Ok(PlayerOutcome {
            state: ItemState::Stored,
            match_ids: ids,
        })
    }

    fn abandon_player(&mut self, name: &str, state: ItemState, reason: String) -> PlayerOutcome {
        self.frontier.mark_player_done(name);
        self.stats.players_failed += 1;
        self.observer.record(CrawlEvent::PlayerAbandoned {
            name: name.to_string(),
            state,
            reason,
        });
        PlayerOutcome {
            state,
            match_ids: Vec::new(),
        }
    }

    // ===== Match Cycle =====

    /// Fetches, summarizes and stores one match
    ///
    /// Matches already in the store are never fetched. Participants of a
    /// stored match are queued ahead of all earlier players.
    pub async fn crawl_match(&mut self, id: &str) -> Result<ItemState, CrawlError> {
        self.frontier.mark_match_done(id);

        if self.store.exists(id, EntityKind::Match)? {
            self.stats.matches_skipped += 1;
            self.observer.record(CrawlEvent::MatchSkipped {
                id: id.to_string(),
                reason: SkipReason::AlreadyStored,
            });
            return Ok(ItemState::SkippedDuplicate);
        }

        let previous_failure = self.store.failure(id)?;
        if let Some(record) = &previous_failure {
            if record.is_given_up(self.settings.max_failures) {
                self.stats.matches_skipped += 1;
                self.observer.record(CrawlEvent::MatchSkipped {
                    id: id.to_string(),
                    reason: SkipReason::GivenUp,
                });
                return Ok(ItemState::FailedPermanent);
            }
        }

        let region = self.region;
        let api = &self.api;
        let fetched = with_retry(&*self.observer, self.settings.retry_backoff, id, move || {
            api.fetch_match(region, id)
        })
        .await;
        let mut doc = match self.screen(fetched)? {
            Ok(doc) => doc,
            Err(e) => {
                let permanent = matches!(e, ApiError::NotFound(_) | ApiError::Decode(_));
                return self.abandon_match(id, failure_state(&e), &e.to_string(), permanent);
            }
        };

        let extraction = extract_match(&doc);
        if !extraction.is_complete() {
            self.observer.record(CrawlEvent::ExtractionDegraded {
                id: id.to_string(),
                problems: extraction.problems.iter().map(|p| p.to_string()).collect(),
            });
        }

        match doc.as_object_mut() {
            Some(fields) => {
                fields.insert("extractions".to_string(), extraction.to_document(region));
            }
            None => {
                return self.abandon_match(id, ItemState::FailedPermanent, "match is not a JSON object", true)
            }
        }

        let state = match self.store.store(id, EntityKind::Match, &doc, false) {
            Ok(StoreOutcome::Duplicate) => {
                self.observer.record(CrawlEvent::MatchDuplicate { id: id.to_string() });
                ItemState::SkippedDuplicate
            }
            Ok(_) => ItemState::Stored,
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => return self.abandon_match(id, ItemState::FailedPermanent, &e.to_string(), true),
        };

        if previous_failure.is_some() {
            self.store.clear_failure(id)?;
        }

        let discovered = match participant_names(&doc) {
            Ok(names) => self.frontier.discover_players(names).len(),
            Err(e) => {
                self.observer.record(CrawlEvent::ParticipantsMalformed {
                    id: id.to_string(),
                    reason: e.to_string(),
                });
                0
            }
        };

        if state.is_success() {
            self.stats.matches_stored += 1;
            self.observer.record(CrawlEvent::MatchStored {
                id: id.to_string(),
                discovered,
            });
        } else {
            self.stats.matches_skipped += 1;
        }

        Ok(state)
    }

    fn abandon_match(
        &mut self,
        id: &str,
        state: ItemState,
        reason: &str,
        permanent: bool,
    ) -> Result<ItemState, CrawlError> {
        self.store.record_failure(id, reason, permanent)?;
        self.stats.matches_failed += 1;
        self.observer.record(CrawlEvent::MatchAbandoned {
            id: id.to_string(),
            state,
            reason: reason.to_string(),
        });
        Ok(state)
    }

    // ===== Rosters =====

    /// Fetches the player names of a league roster
    ///
    /// Returns `None` if the roster could not be fetched; the failure has
    /// been reported already.
    pub async fn fetch_roster(&mut self, region: Region, tier: Tier) -> Result<Option<Vec<String>>, CrawlError> {
        let label = format!("{} {} roster", region, tier.as_str());
        let api = &self.api;
        let roster = with_retry(&*self.observer, self.settings.retry_backoff, &label, move || {
            api.fetch_league_roster(region, tier)
        })
        .await;

        match self.screen(roster)? {
            Ok(entries) => {
                let names: Vec<String> = entries.into_iter().map(|e| e.summoner_name).collect();
                self.observer.record(CrawlEvent::RosterFetched {
                    region,
                    tier,
                    players: names.len(),
                });
                Ok(Some(names))
            }
            Err(e) => {
                self.observer.record(CrawlEvent::RosterFailed {
                    region,
                    tier,
                    reason: e.to_string(),
                });
                Ok(None)
            }
        }
    }

    /// Escalates a fatal remote failure if nothing has worked yet
    ///
    /// A credential or region problem shows up on the very first call; once
    /// a call has succeeded, fatal failures only drop the current item.
    fn screen<T>(&mut self, result: ApiResult<T>) -> Result<ApiResult<T>, CrawlError> {
        match result {
            Ok(value) => {
                self.remote_ok = true;
                Ok(Ok(value))
            }
            Err(e) if e.is_fatal() && !self.remote_ok => Err(e.into()),
            Err(e) => Ok(Err(e)),
        }
    }
}
