//! Document extraction
//!
//! This module reads the few fields the crawler itself depends on out of raw
//! provider documents:
//! - Match ids from a matchlist
//! - Participant display names from a match
//! - A compact summary of a match, stored next to the raw payload
//!
//! None of these functions panic on unexpected input. Summary extraction
//! is total: anything it cannot read is reported as a problem and left out.

use crate::remote::Region;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

/// A field that could not be read from a document
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractionError {
    #[error("missing field '{0}'")]
    Missing(&'static str),

    #[error("malformed field '{field}': {reason}")]
    Malformed { field: &'static str, reason: String },
}

/// Per-participant highlights
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantSummary {
    pub participant_id: i64,
    pub team_id: Option<i64>,
    pub champion_id: Option<i64>,
    pub kills: i64,
    pub deaths: i64,
    pub assists: i64,
    pub win: Option<bool>,
    pub kda: f64,
}

/// Derived fields stored under a match's `extractions` block
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchSummary {
    pub game_duration: Option<i64>,
    pub queue_id: Option<i64>,
    pub game_version: Option<String>,
    pub patch: Option<String>,
    pub winning_team: Option<i64>,
    pub participants: Vec<ParticipantSummary>,
    /// Participant with the highest KDA
    pub top_performer: Option<i64>,
}

/// Result of summarizing a match
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub summary: MatchSummary,
    pub problems: Vec<ExtractionError>,
}

impl Extraction {
    /// Returns true if every section was read
    pub fn is_complete(&self) -> bool {
        self.problems.is_empty()
    }

    /// Builds the `extractions` block attached to the stored match
    pub fn to_document(&self, region: Region) -> Value {
        let mut block = serde_json::to_value(&self.summary).unwrap_or_else(|_| json!({}));
        if let Value::Object(map) = &mut block {
            map.insert("region".to_string(), Value::from(region.as_str()));
        }
        block
    }
}

/// Summarizes a raw match document
pub fn extract_match(doc: &Value) -> Extraction {
    let mut extraction = Extraction::default();
    let summary = &mut extraction.summary;
    let problems = &mut extraction.problems;

    summary.game_duration = doc.get("gameDuration").and_then(Value::as_i64);
    summary.queue_id = doc.get("queueId").and_then(Value::as_i64);
    summary.game_version = doc
        .get("gameVersion")
        .and_then(Value::as_str)
        .map(str::to_string);
    summary.patch = summary.game_version.as_deref().and_then(patch_of);

    match winning_team(doc) {
        Ok(team) => summary.winning_team = team,
        Err(e) => problems.push(e),
    }

    match participants(doc) {
        Ok(list) => summary.participants = list,
        Err(e) => problems.push(e),
    }

    summary.top_performer = summary
        .participants
        .iter()
        .max_by(|a, b| a.kda.total_cmp(&b.kda))
        .map(|p| p.participant_id);

    extraction
}

/// Reduces "10.1.305.4321" to "10.1"
fn patch_of(version: &str) -> Option<String> {
    let mut parts = version.split('.');
    let major = parts.next().filter(|s| !s.is_empty())?;
    let minor = parts.next().filter(|s| !s.is_empty())?;
    Some(format!("{}.{}", major, minor))
}

fn winning_team(doc: &Value) -> Result<Option<i64>, ExtractionError> {
    let teams = match doc.get("teams") {
        Some(Value::Array(teams)) => teams,
        Some(_) => {
            return Err(ExtractionError::Malformed {
                field: "teams",
                reason: "expected an array".to_string(),
            })
        }
        None => return Err(ExtractionError::Missing("teams")),
    };

    Ok(teams
        .iter()
        .find(|t| t.get("win").and_then(Value::as_str) == Some("Win"))
        .and_then(|t| t.get("teamId"))
        .and_then(Value::as_i64))
}

fn participants(doc: &Value) -> Result<Vec<ParticipantSummary>, ExtractionError> {
    let entries = match doc.get("participants") {
        Some(Value::Array(entries)) => entries,
        Some(_) => {
            return Err(ExtractionError::Malformed {
                field: "participants",
                reason: "expected an array".to_string(),
            })
        }
        None => return Err(ExtractionError::Missing("participants")),
    };

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let stats = entry.get("stats").ok_or(ExtractionError::Malformed {
                field: "participants",
                reason: format!("entry {} has no stats", index),
            })?;
            let stat = |name: &str| stats.get(name).and_then(Value::as_i64).unwrap_or(0);

            let (kills, deaths, assists) = (stat("kills"), stat("deaths"), stat("assists"));

            Ok(ParticipantSummary {
                participant_id: entry
                    .get("participantId")
                    .and_then(Value::as_i64)
                    .unwrap_or(index as i64 + 1),
                team_id: entry.get("teamId").and_then(Value::as_i64),
                champion_id: entry.get("championId").and_then(Value::as_i64),
                kills,
                deaths,
                assists,
                win: stats.get("win").and_then(Value::as_bool),
                kda: (kills + assists) as f64 / deaths.max(1) as f64,
            })
        })
        .collect()
}

/// Reads the match ids listed in a matchlist document
///
/// Entries without a usable `gameId` are skipped.
pub fn match_ids(matchlist: &Value) -> Result<Vec<String>, ExtractionError> {
    let entries = matchlist
        .get("matches")
        .ok_or(ExtractionError::Missing("matches"))?
        .as_array()
        .ok_or_else(|| ExtractionError::Malformed {
            field: "matches",
            reason: "expected an array".to_string(),
        })?;

    Ok(entries
        .iter()
        .filter_map(|entry| match entry.get("gameId")? {
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        })
        .collect())
}

/// Reads the participant display names of a match document
///
/// Participants without a name (bots) are skipped; a missing or malformed
/// identity list is an error.
pub fn participant_names(doc: &Value) -> Result<Vec<String>, ExtractionError> {
    let identities = doc
        .get("participantIdentities")
        .ok_or(ExtractionError::Missing("participantIdentities"))?
        .as_array()
        .ok_or_else(|| ExtractionError::Malformed {
            field: "participantIdentities",
            reason: "expected an array".to_string(),
        })?;

    Ok(identities
        .iter()
        .filter_map(|identity| identity.get("player")?.get("summonerName")?.as_str())
        .filter(|name| !name.trim().is_empty())
        .map(str::to_string)
        .collect())
}
