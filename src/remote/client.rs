//! HTTP implementation of the remote provider
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the API token and timeouts
//! - Building endpoint URLs per region
//! - Paging through windowed matchlists
//! - Classifying HTTP and transport failures

use crate::config::ApiConfig;
use crate::remote::types::{Player, Region, RosterEntry, TimeWindow, Tier};
use crate::remote::{ApiError, ApiResult, MatchApi};
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Ranked queue whose leagues are crawled by the snapshot strategy
pub const RANKED_QUEUE: &str = "RANKED_SOLO_5x5";

/// Number of matchlist entries requested per page
pub const MATCHLIST_PAGE_SIZE: usize = 100;

/// Default base URL; `{region}` is replaced by the platform id
pub const DEFAULT_BASE_URL: &str = "https://{region}.api.riotgames.com";

const TOKEN_HEADER: &str = "x-riot-token";

#[derive(Debug, Deserialize)]
struct LeagueList {
    #[serde(default)]
    entries: Vec<RosterEntry>,
}

/// Builds an HTTP client that authenticates every request
///
/// # Arguments
///
/// * `config` - The API configuration holding the key and timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(ApiError::Fatal)` - The key cannot be sent as a header, or the client failed to build
pub fn build_http_client(config: &ApiConfig) -> ApiResult<Client> {
    let mut token = header::HeaderValue::from_str(&config.key)
        .map_err(|_| ApiError::Fatal("API key contains invalid header characters".to_string()))?;
    token.set_sensitive(true);

    let mut headers = header::HeaderMap::new();
    headers.insert(TOKEN_HEADER, token);

    Client::builder()
        .user_agent(concat!("lolcrawler/", env!("CARGO_PKG_VERSION")))
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .build()
        .map_err(|e| ApiError::Fatal(format!("Failed to build HTTP client: {}", e)))
}

/// Client for the Riot v4 REST endpoints
pub struct RiotClient {
    http: Client,
    base_url: String,
    max_matchlist_pages: u32,
}

impl RiotClient {
    /// Creates a client from the API configuration
    pub fn new(config: &ApiConfig) -> ApiResult<Self> {
        Ok(Self {
            http: build_http_client(config)?,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            max_matchlist_pages: config.max_matchlist_pages,
        })
    }

    /// Builds the URL of an endpoint for a region
    ///
    /// Path segments are percent-encoded, so display names with spaces or
    /// non-ASCII characters are safe to pass through.
    fn endpoint(&self, region: Region, segments: &[&str]) -> ApiResult<Url> {
        let base = self.base_url.replace("{region}", region.as_str());
        let mut url = Url::parse(&base)
            .map_err(|e| ApiError::Fatal(format!("Invalid base URL '{}': {}", base, e)))?;

        url.path_segments_mut()
            .map_err(|_| ApiError::Fatal(format!("Base URL '{}' cannot hold a path", base)))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    /// Sends a GET request and decodes the JSON body
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> ApiResult<T> {
        tracing::trace!("GET {}", url);

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_transport_error(&url, e))?;

        let status = response.status();
        if let Some(err) = classify_status(status, &url) {
            return Err(err);
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Transient(format!("Failed to read body from {}: {}", url, e)))?;

        serde_json::from_str(&body)
            .map_err(|e| ApiError::Decode(format!("Unexpected payload from {}: {}", url, e)))
    }

    async fn fetch_matchlist_page(
        &self,
        region: Region,
        account_id: &str,
        window: TimeWindow,
        begin_index: usize,
    ) -> ApiResult<Value> {
        let mut url = self.endpoint(
            region,
            &["lol", "match", "v4", "matchlists", "by-account", account_id],
        )?;
        url.query_pairs_mut()
            .append_pair("beginTime", &window.begin_millis().to_string())
            .append_pair("endTime", &window.end_millis().to_string())
            .append_pair("beginIndex", &begin_index.to_string())
            .append_pair("endIndex", &(begin_index + MATCHLIST_PAGE_SIZE).to_string());

        self.get_json(url).await
    }
}

#[async_trait]
impl MatchApi for RiotClient {
    async fn fetch_player(&self, region: Region, display_name: &str) -> ApiResult<Player> {
        let url = self.endpoint(
            region,
            &["lol", "summoner", "v4", "summoners", "by-name", display_name],
        )?;
        self.get_json(url).await
    }

    async fn fetch_matchlist(
        &self,
        region: Region,
        account_id: &str,
        window: Option<TimeWindow>,
    ) -> ApiResult<Value> {
        let window = match window {
            Some(w) => w,
            None => {
                let url = self.endpoint(
                    region,
                    &["lol", "match", "v4", "matchlists", "by-account", account_id],
                )?;
                return self.get_json(url).await;
            }
        };

        let mut first: Option<Value> = None;
        let mut collected: Vec<Value> = Vec::new();
        let mut ended = false;

        for page in 0..self.max_matchlist_pages as usize {
            let begin_index = page * MATCHLIST_PAGE_SIZE;
            let doc = match self
                .fetch_matchlist_page(region, account_id, window, begin_index)
                .await
            {
                Ok(doc) => doc,
                Err(e) if page == 0 || e.is_fatal() => return Err(e),
                // The page past the last match of the window is answered with 404
                Err(ApiError::NotFound(_)) => {
                    ended = true;
                    break;
                }
                Err(e) => {
                    tracing::warn!(
                        "Keeping {} matches of account {}; page at index {} failed: {}",
                        collected.len(),
                        account_id,
                        begin_index,
                        e
                    );
                    ended = true;
                    break;
                }
            };

            let matches = doc
                .get("matches")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            let page_len = matches.len();
            collected.extend(matches);

            if first.is_none() {
                first = Some(doc);
            }

            if page_len < MATCHLIST_PAGE_SIZE {
                ended = true;
                break;
            }
        }

        if !ended {
            tracing::info!(
                "Matchlist of account {} cut at {} pages ({} matches)",
                account_id,
                self.max_matchlist_pages,
                collected.len()
            );
        }

        let mut merged = first.unwrap_or_else(|| serde_json::json!({}));
        if let Value::Object(map) = &mut merged {
            map.insert("endIndex".to_string(), Value::from(collected.len()));
            map.insert("matches".to_string(), Value::Array(collected));
        }
        Ok(merged)
    }

    async fn fetch_match(&self, region: Region, match_id: &str) -> ApiResult<Value> {
        let url = self.endpoint(region, &["lol", "match", "v4", "matches", match_id])?;
        self.get_json(url).await
    }

    async fn fetch_league_roster(&self, region: Region, tier: Tier) -> ApiResult<Vec<RosterEntry>> {
        let url = self.endpoint(
            region,
            &["lol", "league", "v4", tier.league_endpoint(), "by-queue", RANKED_QUEUE],
        )?;
        let list: LeagueList = self.get_json(url).await?;
        Ok(list.entries)
    }
}

/// Maps a non-success HTTP status to an error bucket
///
/// | Status | Bucket |
/// |--------|--------|
/// | 404 | NotFound |
/// | 429, 5xx, 408 | Transient |
/// | 401, 403, other 4xx | Fatal |
fn classify_status(status: StatusCode, url: &Url) -> Option<ApiError> {
    if status.is_success() {
        return None;
    }

    let detail = format!("HTTP {} for {}", status.as_u16(), url.path());

    Some(match status {
        StatusCode::NOT_FOUND => ApiError::NotFound(detail),
        StatusCode::TOO_MANY_REQUESTS | StatusCode::REQUEST_TIMEOUT => ApiError::Transient(detail),
        s if s.is_server_error() => ApiError::Transient(detail),
        _ => ApiError::Fatal(detail),
    })
}

fn classify_transport_error(url: &Url, e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Transient(format!("Request timeout for {}", url.path()))
    } else if e.is_connect() {
        ApiError::Transient(format!("Connection failed for {}: {}", url.path(), e))
    } else if e.is_builder() {
        ApiError::Fatal(format!("Invalid request for {}: {}", url.path(), e))
    } else {
        ApiError::Transient(format!("Request to {} failed: {}", url.path(), e))
    }
}
