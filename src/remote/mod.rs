//! Remote match-data provider
//!
//! This module wraps the external API the crawler reads from:
//! - Resolving a player display name to an account
//! - Fetching a player's matchlist (optionally restricted to a time window)
//! - Fetching a full match document
//! - Fetching the roster of a top-tier ranked league
//!
//! The engine only talks to the [`MatchApi`] trait; [`RiotClient`] is the
//! production implementation over HTTP.

mod client;
mod normalize;
mod types;

pub use client::{build_http_client, RiotClient, MATCHLIST_PAGE_SIZE, RANKED_QUEUE};
pub use normalize::normalize_player_name;
pub use types::{Player, Region, RosterEntry, TimeWindow, Tier, ALL_REGIONS};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors returned by the remote provider
///
/// The engine only cares about which bucket a failure falls into: a missing
/// entity is dropped, a transient failure gets one retry, a fatal one aborts
/// the current item.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Transient failure: {0}")]
    Transient(String),

    #[error("Fatal API error: {0}")]
    Fatal(String),

    #[error("Malformed response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Returns true if the request may succeed when repeated
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Returns true if the failure points at credentials or configuration
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

/// Result type for remote calls
pub type ApiResult<T> = Result<T, ApiError>;

/// Interface to the remote match-data provider
///
/// Every call is scoped to a region. Implementations own their timeouts;
/// callers only distinguish transient from permanent outcomes.
#[async_trait]
pub trait MatchApi: Send + Sync {
    /// Resolves a display name to a player descriptor
    async fn fetch_player(&self, region: Region, display_name: &str) -> ApiResult<Player>;

    /// Fetches the matchlist document of an account
    ///
    /// With a window, only matches played inside it are returned and the
    /// implementation pages through the full result set.
    async fn fetch_matchlist(
        &self,
        region: Region,
        account_id: &str,
        window: Option<TimeWindow>,
    ) -> ApiResult<Value>;

    /// Fetches a full match document
    async fn fetch_match(&self, region: Region, match_id: &str) -> ApiResult<Value>;

    /// Fetches the players of a top-tier league
    async fn fetch_league_roster(&self, region: Region, tier: Tier) -> ApiResult<Vec<RosterEntry>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_buckets() {
        assert!(ApiError::Transient("503".into()).is_transient());
        assert!(!ApiError::NotFound("x".into()).is_transient());
        assert!(ApiError::Fatal("403".into()).is_fatal());
        assert!(!ApiError::Decode("eof".into()).is_fatal());
    }
}
