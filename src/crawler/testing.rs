//! In-memory doubles for engine and strategy tests

use crate::remote::{ApiError, ApiResult, MatchApi, Player, Region, RosterEntry, Tier, TimeWindow};
use crate::storage::{EntityKind, EntityStore, FailureRecord, StoreError, StoreOutcome, StoreResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// A scripted remote failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    NotFound,
    Transient,
    Fatal,
}

impl Failure {
    fn into_error(self, key: &str) -> ApiError {
        match self {
            Self::NotFound => ApiError::NotFound(key.to_string()),
            Self::Transient => ApiError::Transient(format!("{}: HTTP 503", key)),
            Self::Fatal => ApiError::Fatal(format!("{}: HTTP 403", key)),
        }
    }
}

/// A match with the given participants, won by team 100
pub fn match_doc(id: &str, participants: &[&str]) -> Value {
    let identities: Vec<Value> = participants
        .iter()
        .enumerate()
        .map(|(i, name)| json!({ "participantId": i + 1, "player": { "summonerName": name } }))
        .collect();
    let stats: Vec<Value> = participants
        .iter()
        .enumerate()
        .map(|(i, _)| {
            json!({
                "participantId": i + 1,
                "teamId": if i < 5 { 100 } else { 200 },
                "stats": { "kills": i, "deaths": 1, "assists": 2, "win": i < 5 }
            })
        })
        .collect();

    json!({
        "gameId": id.parse::<i64>().unwrap_or(0),
        "gameDuration": 1500,
        "gameVersion": "10.1.305.4321",
        "teams": [ { "teamId": 100, "win": "Win" }, { "teamId": 200, "win": "Fail" } ],
        "participants": stats,
        "participantIdentities": identities,
    })
}

fn matchlist_doc(ids: &[&str]) -> Value {
    let matches: Vec<Value> = ids
        .iter()
        .map(|id| json!({ "gameId": id.parse::<i64>().unwrap_or(0), "queue": 420 }))
        .collect();
    json!({ "matches": matches, "totalGames": ids.len() })
}

/// Remote provider serving canned documents
///
/// Calls are recorded as `player:<name>`, `matchlist:<account>`,
/// `match:<id>` and `roster:<region>:<tier>`. Unknown entities are
/// reported as not found.
#[derive(Default)]
pub struct MockApi {
    players: HashMap<String, Player>,
    matchlists: Mutex<HashMap<String, Value>>,
    matches: HashMap<String, Value>,
    rosters: HashMap<(Region, Tier), Vec<RosterEntry>>,
    failures: Mutex<HashMap<String, VecDeque<Failure>>>,
    calls: Mutex<Vec<String>>,
    windows: Mutex<Vec<Option<TimeWindow>>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_player(mut self, name: &str, match_ids: &[&str]) -> Self {
        let account = format!("acc-{}", name);
        self.players.insert(
            name.to_string(),
            Player {
                account_id: account.clone(),
                name: name.to_string(),
                id: None,
                puuid: None,
                summoner_level: None,
            },
        );
        if let Ok(mut matchlists) = self.matchlists.lock() {
            matchlists.insert(account, matchlist_doc(match_ids));
        }
        self
    }

    pub fn with_match(self, id: &str, participants: &[&str]) -> Self {
        let doc = match_doc(id, participants);
        self.with_match_doc(id, doc)
    }

    pub fn with_match_doc(mut self, id: &str, doc: Value) -> Self {
        self.matches.insert(id.to_string(), doc);
        self
    }

    pub fn with_roster(mut self, region: Region, tier: Tier, names: &[&str]) -> Self {
        let entries = names
            .iter()
            .map(|name| RosterEntry {
                summoner_name: name.to_string(),
                summoner_id: None,
                league_points: None,
            })
            .collect();
        self.rosters.insert((region, tier), entries);
        self
    }

    /// Makes the next calls to `key` fail, in order
    pub fn failing(self, key: &str, failures: &[Failure]) -> Self {
        if let Ok(mut scripted) = self.failures.lock() {
            scripted
                .entry(key.to_string())
                .or_default()
                .extend(failures.iter().copied());
        }
        self
    }

    /// Replaces the matchlist of an already registered player
    pub fn set_matchlist(&self, name: &str, match_ids: &[&str]) {
        if let Ok(mut matchlists) = self.matchlists.lock() {
            matchlists.insert(format!("acc-{}", name), matchlist_doc(match_ids));
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn calls_to(&self, key: &str) -> usize {
        self.calls().iter().filter(|call| call.as_str() == key).count()
    }

    pub fn calls_starting_with(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|call| call.starts_with(prefix)).count()
    }

    /// Windows passed to matchlist calls, in call order
    pub fn windows(&self) -> Vec<Option<TimeWindow>> {
        self.windows.lock().map(|w| w.clone()).unwrap_or_default()
    }

    fn begin_call(&self, key: &str) -> ApiResult<()> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(key.to_string());
        }
        let scripted = self
            .failures
            .lock()
            .ok()
            .and_then(|mut failures| failures.get_mut(key).and_then(VecDeque::pop_front));
        match scripted {
            Some(failure) => Err(failure.into_error(key)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MatchApi for MockApi {
    async fn fetch_player(&self, _region: Region, display_name: &str) -> ApiResult<Player> {
        let key = format!("player:{}", display_name);
        self.begin_call(&key)?;
        self.players
            .get(display_name)
            .cloned()
            .ok_or(ApiError::NotFound(key))
    }

    async fn fetch_matchlist(
        &self,
        _region: Region,
        account_id: &str,
        window: Option<TimeWindow>,
    ) -> ApiResult<Value> {
        let key = format!("matchlist:{}", account_id);
        self.begin_call(&key)?;
        if let Ok(mut windows) = self.windows.lock() {
            windows.push(window);
        }
        self.matchlists
            .lock()
            .ok()
            .and_then(|matchlists| matchlists.get(account_id).cloned())
            .ok_or(ApiError::NotFound(key))
    }

    async fn fetch_match(&self, _region: Region, match_id: &str) -> ApiResult<Value> {
        let key = format!("match:{}", match_id);
        self.begin_call(&key)?;
        self.matches
            .get(match_id)
            .cloned()
            .ok_or(ApiError::NotFound(key))
    }

    async fn fetch_league_roster(&self, region: Region, tier: Tier) -> ApiResult<Vec<RosterEntry>> {
        let key = format!("roster:{}:{}", region, tier.as_str());
        self.begin_call(&key)?;
        self.rosters
            .get(&(region, tier))
            .cloned()
            .ok_or(ApiError::NotFound(key))
    }
}

/// A store whose database is gone
pub struct FailingStore;

fn unavailable<T>() -> StoreResult<T> {
    Err(StoreError::Unavailable("database is locked".to_string()))
}

impl EntityStore for FailingStore {
    fn store(&mut self, _: &str, _: EntityKind, _: &Value, _: bool) -> StoreResult<StoreOutcome> {
        unavailable()
    }

    fn exists(&self, _: &str, _: EntityKind) -> StoreResult<bool> {
        unavailable()
    }

    fn load(&self, _: &str, _: EntityKind) -> StoreResult<Option<Value>> {
        unavailable()
    }

    fn recent_keys(&self, _: EntityKind, _: Option<Region>, _: usize) -> StoreResult<Vec<String>> {
        unavailable()
    }

    fn record_failure(&mut self, _: &str, _: &str, _: bool) -> StoreResult<FailureRecord> {
        unavailable()
    }

    fn failure(&self, _: &str) -> StoreResult<Option<FailureRecord>> {
        unavailable()
    }

    fn clear_failure(&mut self, _: &str) -> StoreResult<()> {
        unavailable()
    }

    fn count(&self, _: EntityKind) -> StoreResult<u64> {
        unavailable()
    }

    fn count_by_region(&self, _: EntityKind) -> StoreResult<Vec<(String, u64)>> {
        unavailable()
    }

    fn count_failures(&self) -> StoreResult<u64> {
        unavailable()
    }
}
