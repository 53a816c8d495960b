use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Platform routing values of the remote API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Na1,
    Ru,
    Kr,
    Br1,
    Oc1,
    Jp1,
    Eun1,
    Euw1,
    Tr1,
    La1,
    La2,
}

/// Every region the provider serves
pub const ALL_REGIONS: [Region; 11] = [
    Region::Na1,
    Region::Ru,
    Region::Kr,
    Region::Br1,
    Region::Oc1,
    Region::Jp1,
    Region::Eun1,
    Region::Euw1,
    Region::Tr1,
    Region::La1,
    Region::La2,
];

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Na1 => "na1",
            Self::Ru => "ru",
            Self::Kr => "kr",
            Self::Br1 => "br1",
            Self::Oc1 => "oc1",
            Self::Jp1 => "jp1",
            Self::Eun1 => "eun1",
            Self::Euw1 => "euw1",
            Self::Tr1 => "tr1",
            Self::La1 => "la1",
            Self::La2 => "la2",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        ALL_REGIONS
            .iter()
            .copied()
            .find(|r| r.as_str() == lowered)
            .ok_or_else(|| format!("unknown region '{}'", s))
    }
}

/// Top competitive tiers that expose a full roster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Challenger,
    Grandmaster,
    Master,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Challenger => "challenger",
            Self::Grandmaster => "grandmaster",
            Self::Master => "master",
        }
    }

    /// Path segment of the league endpoint for this tier
    pub fn league_endpoint(&self) -> &'static str {
        match self {
            Self::Challenger => "challengerleagues",
            Self::Grandmaster => "grandmasterleagues",
            Self::Master => "masterleagues",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved player
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Stable account identifier used by the matchlist endpoint
    pub account_id: String,

    /// Display name as known by the provider
    pub name: String,

    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub puuid: Option<String>,

    #[serde(default)]
    pub summoner_level: Option<i64>,
}

/// One entry of a league roster
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub summoner_name: String,

    #[serde(default)]
    pub summoner_id: Option<String>,

    #[serde(default)]
    pub league_points: Option<i64>,
}

/// Inclusive time range that restricts matchlist results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub begin: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(begin: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { begin, end }
    }

    /// The window covering the `days` days up to `now`
    pub fn last_days(days: u32, now: DateTime<Utc>) -> Self {
        Self {
            begin: now - Duration::days(i64::from(days)),
            end: now,
        }
    }

    /// Window start as epoch milliseconds, the unit the provider expects
    pub fn begin_millis(&self) -> i64 {
        self.begin.timestamp_millis()
    }

    /// Window end as epoch milliseconds
    pub fn end_millis(&self) -> i64 {
        self.end.timestamp_millis()
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} .. {}", self.begin.to_rfc3339(), self.end.to_rfc3339())
    }
}
