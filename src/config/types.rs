use crate::remote::{Region, Tier};
use serde::Deserialize;

/// Main configuration structure for lolcrawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    pub storage: StorageConfig,
}

/// Remote API access configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// API token sent with every request
    pub key: String,

    /// Base URL template; `{region}` is replaced by the platform id
    #[serde(rename = "base-url", default)]
    pub base_url: Option<String>,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Upper bound on pages fetched for one windowed matchlist
    #[serde(rename = "max-matchlist-pages", default = "default_max_matchlist_pages")]
    pub max_matchlist_pages: u32,
}

/// Traversal behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Region crawled by the random walk
    pub region: Region,

    /// Player the random walk starts from when nothing is stored yet
    #[serde(rename = "seed-player")]
    pub seed_player: String,

    /// How many recently stored players seed a resumed walk
    #[serde(default = "default_lookback")]
    pub lookback: usize,

    /// Pause before the single retry of a transient failure (milliseconds)
    #[serde(rename = "retry-backoff-ms", default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Failed attempts after which a match is no longer fetched
    #[serde(rename = "max-failures", default = "default_max_failures")]
    pub max_failures: u32,
}

/// Bounded snapshot crawl configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotConfig {
    #[serde(default = "default_snapshot_regions")]
    pub regions: Vec<Region>,

    #[serde(default = "default_snapshot_tiers")]
    pub tiers: Vec<Tier>,

    /// Length of the crawled window, ending now (days)
    #[serde(rename = "window-days", default = "default_window_days")]
    pub window_days: u32,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            regions: default_snapshot_regions(),
            tiers: default_snapshot_tiers(),
            window_days: default_window_days(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_matchlist_pages() -> u32 {
    10
}

fn default_lookback() -> usize {
    100
}

fn default_retry_backoff_ms() -> u64 {
    2000
}

fn default_max_failures() -> u32 {
    3
}

fn default_snapshot_regions() -> Vec<Region> {
    vec![Region::Euw1, Region::Na1, Region::Kr, Region::Eun1]
}

fn default_snapshot_tiers() -> Vec<Tier> {
    vec![Tier::Grandmaster]
}

fn default_window_days() -> u32 {
    7
}
