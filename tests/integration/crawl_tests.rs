//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the remote API and test the
//! HTTP client and full crawl cycles end-to-end against a SQLite file.

use lolcrawler::config::{ApiConfig, Config, CrawlerConfig, SnapshotConfig, StorageConfig};
use lolcrawler::crawler::{run_random_walk, run_snapshot, CrawlError, Shutdown};
use lolcrawler::remote::{ApiError, MatchApi, Region, RiotClient, Tier, TimeWindow};
use lolcrawler::storage::{open_store, EntityKind, EntityStore, StoreError};
use lolcrawler::LolError;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: &str = "RGAPI-test";

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, db_path: &Path) -> Config {
    Config {
        api: ApiConfig {
            key: KEY.to_string(),
            base_url: Some(base_url.to_string()),
            timeout_secs: 5,
            max_matchlist_pages: 5,
        },
        crawler: CrawlerConfig {
            region: Region::Euw1,
            seed_player: "Seed".to_string(),
            lookback: 10,
            retry_backoff_ms: 0,
            max_failures: 3,
        },
        snapshot: SnapshotConfig {
            regions: vec![Region::Euw1],
            tiers: vec![Tier::Challenger],
            window_days: 7,
        },
        storage: StorageConfig {
            database_path: db_path.to_string_lossy().into_owned(),
        },
    }
}

fn summoner(name: &str, account: &str) -> Value {
    json!({ "id": format!("sid-{}", account), "accountId": account, "name": name, "summonerLevel": 30 })
}

fn matchlist(ids: &[i64]) -> Value {
    let matches: Vec<Value> = ids.iter().map(|id| json!({ "gameId": id, "queue": 420 })).collect();
    json!({ "matches": matches, "startIndex": 0, "endIndex": ids.len(), "totalGames": ids.len() })
}

fn match_doc(id: i64, participants: &[&str]) -> Value {
    let identities: Vec<Value> = participants
        .iter()
        .enumerate()
        .map(|(i, name)| json!({ "participantId": i + 1, "player": { "summonerName": name } }))
        .collect();
    json!({
        "gameId": id,
        "gameDuration": 1700,
        "gameVersion": "10.2.306.1234",
        "teams": [ { "teamId": 100, "win": "Win" }, { "teamId": 200, "win": "Fail" } ],
        "participants": [],
        "participantIdentities": identities,
    })
}

async fn mount_json(server: &MockServer, route: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn client(server: &MockServer) -> RiotClient {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), &dir.path().join("unused.db"));
    RiotClient::new(&config.api).unwrap()
}

#[tokio::test]
async fn test_client_sends_token_and_decodes_player() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/lol/summoner/v4/summoners/by-name/Hide%20on%20bush"))
        .and(header("x-riot-token", KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(summoner("Hide on bush", "acc-faker")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let player = client(&mock_server)
        .fetch_player(Region::Kr, "Hide on bush")
        .await
        .unwrap();

    assert_eq!(player.account_id, "acc-faker");
    assert_eq!(player.summoner_level, Some(30));
}

#[tokio::test]
async fn test_client_classifies_failures() {
    let mock_server = MockServer::start().await;

    for (id, status) in [("404", 404), ("503", 503), ("429", 429), ("403", 403)] {
        Mock::given(method("GET"))
            .and(path(format!("/lol/match/v4/matches/{}", id)))
            .respond_with(ResponseTemplate::new(status))
            .mount(&mock_server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/lol/match/v4/matches/garbage"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    let fetch = |id: &'static str| client.fetch_match(Region::Euw1, id);

    assert!(matches!(fetch("404").await, Err(ApiError::NotFound(_))));
    assert!(matches!(fetch("503").await, Err(ApiError::Transient(_))));
    assert!(matches!(fetch("429").await, Err(ApiError::Transient(_))));
    assert!(matches!(fetch("403").await, Err(ApiError::Fatal(_))));
    assert!(matches!(fetch("garbage").await, Err(ApiError::Decode(_))));
}

#[tokio::test]
async fn test_windowed_matchlist_pages_are_merged() {
    let mock_server = MockServer::start().await;
    let route = "/lol/match/v4/matchlists/by-account/acc-1";

    let first_page: Vec<i64> = (1..=100).collect();
    Mock::given(method("GET"))
        .and(path(route))
        .and(query_param("beginIndex", "0"))
        .and(query_param("endIndex", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(matchlist(&first_page)))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(route))
        .and(query_param("beginIndex", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(matchlist(&[101, 102, 103])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let window = TimeWindow::new(
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2020, 1, 8, 0, 0, 0).unwrap(),
    );
    let doc = client(&mock_server)
        .fetch_matchlist(Region::Euw1, "acc-1", Some(window))
        .await
        .unwrap();

    assert_eq!(doc["matches"].as_array().unwrap().len(), 103);
    assert_eq!(doc["matches"][102]["gameId"], 103);

    let requests = mock_server.received_requests().await.unwrap();
    assert!(requests
        .iter()
        .all(|r| r.url.query().unwrap_or("").contains("beginTime=1577836800000")));
}

fn test_window() -> TimeWindow {
    TimeWindow::new(
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2020, 1, 8, 0, 0, 0).unwrap(),
    )
}

/// Serves a full first page and `status` for the page after it
async fn mount_full_page_then(server: &MockServer, route: &str, status: u16) {
    let first_page: Vec<i64> = (1..=100).collect();
    Mock::given(method("GET"))
        .and(path(route))
        .and(query_param("beginIndex", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(matchlist(&first_page)))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(route))
        .and(query_param("beginIndex", "100"))
        .respond_with(ResponseTemplate::new(status))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_matchlist_of_exactly_one_page_ends_at_not_found() {
    let mock_server = MockServer::start().await;
    let route = "/lol/match/v4/matchlists/by-account/acc-1";
    mount_full_page_then(&mock_server, route, 404).await;

    let doc = client(&mock_server)
        .fetch_matchlist(Region::Euw1, "acc-1", Some(test_window()))
        .await
        .unwrap();

    assert_eq!(doc["matches"].as_array().unwrap().len(), 100);
    assert_eq!(doc["endIndex"], 100);
}

#[tokio::test]
async fn test_failing_later_page_keeps_merged_matches() {
    let mock_server = MockServer::start().await;
    let route = "/lol/match/v4/matchlists/by-account/acc-1";
    mount_full_page_then(&mock_server, route, 503).await;

    let doc = client(&mock_server)
        .fetch_matchlist(Region::Euw1, "acc-1", Some(test_window()))
        .await
        .unwrap();

    assert_eq!(doc["matches"].as_array().unwrap().len(), 100);
    assert_eq!(doc["matches"][99]["gameId"], 100);
}

#[tokio::test]
async fn test_rejected_later_page_fails_the_matchlist() {
    let mock_server = MockServer::start().await;
    let route = "/lol/match/v4/matchlists/by-account/acc-1";
    mount_full_page_then(&mock_server, route, 403).await;

    let result = client(&mock_server)
        .fetch_matchlist(Region::Euw1, "acc-1", Some(test_window()))
        .await;

    assert!(matches!(result, Err(ApiError::Fatal(_))));
}

#[tokio::test]
async fn test_missing_first_page_is_not_found() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lol/match/v4/matchlists/by-account/acc-1"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = client(&mock_server)
        .fetch_matchlist(Region::Euw1, "acc-1", Some(test_window()))
        .await;

    assert!(matches!(result, Err(ApiError::NotFound(_))));
}

#[tokio::test]
async fn test_league_roster() {
    let mock_server = MockServer::start().await;
    mount_json(
        &mock_server,
        "/lol/league/v4/grandmasterleagues/by-queue/RANKED_SOLO_5x5",
        json!({
            "tier": "GRANDMASTER",
            "entries": [
                { "summonerName": "A", "summonerId": "s1", "leaguePoints": 500 },
                { "summonerName": "B", "summonerId": "s2", "leaguePoints": 480 }
            ]
        }),
    )
    .await;

    let roster = client(&mock_server)
        .fetch_league_roster(Region::Na1, Tier::Grandmaster)
        .await
        .unwrap();

    let names: Vec<_> = roster.iter().map(|e| e.summoner_name.as_str()).collect();
    assert_eq!(names, vec!["A", "B"]);
}

#[tokio::test]
async fn test_random_walk_crawls_and_resumes() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("crawl.db");
    let config = create_test_config(&mock_server.uri(), &db_path);

    mount_json(&mock_server, "/lol/summoner/v4/summoners/by-name/Seed", summoner("Seed", "acc-seed")).await;
    mount_json(&mock_server, "/lol/match/v4/matchlists/by-account/acc-seed", matchlist(&[11, 12])).await;
    mount_json(&mock_server, "/lol/summoner/v4/summoners/by-name/Friend", summoner("Friend", "acc-friend")).await;
    mount_json(&mock_server, "/lol/match/v4/matchlists/by-account/acc-friend", matchlist(&[12])).await;

    Mock::given(method("GET"))
        .and(path("/lol/match/v4/matches/11"))
        .respond_with(ResponseTemplate::new(200).set_body_json(match_doc(11, &["Seed", "Friend"])))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/lol/match/v4/matches/12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(match_doc(12, &["Seed", "Friend"])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let stats = run_random_walk(&config, Some(2), &Shutdown::new()).await.unwrap();
    assert_eq!(stats.players_stored, 2);
    assert_eq!(stats.matches_stored, 2);

    {
        let store = open_store(&db_path).unwrap();
        assert_eq!(store.count(EntityKind::Matchlist).unwrap(), 2);
        assert_eq!(store.count(EntityKind::Match).unwrap(), 2);

        let stored = store.load("11", EntityKind::Match).unwrap().unwrap();
        assert_eq!(stored["extractions"]["region"], "euw1");
        assert_eq!(stored["extractions"]["patch"], "10.2");
    }

    // A second process resumes from the stored players without refetching matches
    let stats = run_random_walk(&config, Some(2), &Shutdown::new()).await.unwrap();
    assert_eq!(stats.players_stored, 2);
    assert_eq!(stats.matches_stored, 0);
    assert!(stats.matches_skipped >= 2);

    let store = open_store(&db_path).unwrap();
    assert_eq!(store.count(EntityKind::Matchlist).unwrap(), 2);
}

#[tokio::test]
async fn test_snapshot_crawls_roster_within_window() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("snapshot.db");
    let config = create_test_config(&mock_server.uri(), &db_path);

    Mock::given(method("GET"))
        .and(path("/lol/league/v4/challengerleagues/by-queue/RANKED_SOLO_5x5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entries": [ { "summonerName": "Top" }, { "summonerName": "Ghost" }, { "summonerName": "Top" } ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_json(&mock_server, "/lol/summoner/v4/summoners/by-name/Top", summoner("Top", "acc-top")).await;
    mount_json(&mock_server, "/lol/match/v4/matchlists/by-account/acc-top", matchlist(&[77])).await;
    mount_json(&mock_server, "/lol/match/v4/matches/77", match_doc(77, &["Top", "Rival"])).await;

    let stats = run_snapshot(&config, &Shutdown::new()).await.unwrap();

    assert_eq!(stats.players_stored, 1);
    assert_eq!(stats.players_failed, 1);
    assert_eq!(stats.matches_stored, 1);

    let requests = mock_server.received_requests().await.unwrap();
    let matchlist_calls: Vec<_> = requests
        .iter()
        .filter(|r| r.url.path().contains("/matchlists/"))
        .collect();
    assert_eq!(matchlist_calls.len(), 1);
    assert!(matchlist_calls[0].url.query().unwrap_or("").contains("beginTime="));

    // Discovered participants are not crawled in snapshot mode
    assert!(!requests.iter().any(|r| r.url.path().ends_with("/Rival")));
}

#[tokio::test]
async fn test_rejected_key_aborts_the_run() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &temp_dir.path().join("crawl.db"));

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let result = run_random_walk(&config, Some(5), &Shutdown::new()).await;

    assert!(matches!(
        result,
        Err(LolError::Crawl(CrawlError::FatalRemote(_)))
    ));
}

#[tokio::test]
async fn test_unopenable_database_is_fatal() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(
        &mock_server.uri(),
        &temp_dir.path().join("missing").join("dir").join("crawl.db"),
    );

    let result = run_snapshot(&config, &Shutdown::new()).await;

    match result {
        Err(LolError::Storage(e)) => {
            assert!(e.is_fatal());
            assert!(matches!(e, StoreError::Unavailable(_)));
        }
        other => panic!("expected a storage failure, got {:?}", other.map(|_| ())),
    }
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}
