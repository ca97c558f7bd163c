//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the GitHub API and run the full
//! crawl cycle end-to-end against an on-disk SQLite database.

use ghminer::config::{ApiConfig, Config, CrawlConfig, OutputConfig, RetryConfig};
use ghminer::crawler::Coordinator;
use ghminer::storage::{RunStatus, SqliteStorage, Storage};
use ghminer::{CrawlPhase, GhMinerError};
use serde_json::json;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "test-token";

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, db_path: &Path, per_page: u32, ceiling: i64) -> Config {
    Config {
        api: ApiConfig {
            base_url: base_url.to_string(),
            token_path: "unused".to_string(),
            per_page,
            user_agent: "ghminer-test".to_string(),
            request_timeout_secs: 5,
        },
        crawl: CrawlConfig { floor: 0, ceiling },
        retry: RetryConfig {
            connect_retry_delay_ms: 10,
            rate_limit_margin_secs: 1,
            min_rate_limit_wait_secs: 0,
        },
        output: OutputConfig {
            database_path: db_path.display().to_string(),
        },
    }
}

fn db_path(dir: &TempDir) -> PathBuf {
    dir.path().join("ghaccounts.sqlite3")
}

async fn mount_listing(server: &MockServer, since: i64, logins: &[&str]) {
    let body: Vec<_> = logins.iter().map(|login| json!({ "login": login })).collect();
    Mock::given(method("GET"))
        .and(path("/users"))
        .and(query_param("since", since.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_account(server: &MockServer, login: &str, id: i64) {
    Mock::given(method("GET"))
        .and(path(format!("/users/{}", login)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "login": login,
            "id": id,
            "type": "User",
            "followers": id * 10,
            "created_at": "2008-01-14T04:33:35Z"
        })))
        .mount(server)
        .await;
}

async fn mount_status(server: &MockServer, login: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(format!("/users/{}", login)))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({
            "message": "Not Found"
        })))
        .mount(server)
        .await;
}

async fn requested_since(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == "/users")
        .filter_map(|request| {
            request
                .url
                .query_pairs()
                .find(|(key, _)| key == "since")
                .map(|(_, value)| value.into_owned())
        })
        .collect()
}

#[tokio::test]
async fn test_missing_account_is_skipped_and_cursor_stops_at_last_saved() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_listing(&mock_server, 0, &["alice", "bob"]).await;
    mount_account(&mock_server, "alice", 5).await;
    mount_status(&mock_server, "bob", 404).await;
    mount_listing(&mock_server, 5, &[]).await;

    let config = create_test_config(&mock_server.uri(), &db_path(&dir), 2, 1000);
    let mut coordinator =
        Coordinator::new(config, TOKEN.to_string(), "hash".to_string()).expect("coordinator");
    let report = coordinator.run().await.expect("crawl failed");

    assert_eq!(coordinator.phase(), CrawlPhase::Done);
    assert_eq!(report.final_cursor, 5);
    assert_eq!(report.accounts_saved, 1);
    assert_eq!(report.accounts_skipped, 1);

    let storage = SqliteStorage::new(&db_path(&dir)).expect("Failed to open DB");
    assert_eq!(storage.count_accounts().unwrap(), 1);
    assert_eq!(storage.max_persisted_id().unwrap(), Some(5));

    let alice = storage.get_account(5).unwrap().expect("alice stored");
    assert_eq!(alice.login, "alice");
    assert_eq!(alice.followers, Some(50));
    assert_eq!(alice.name, None);

    assert_eq!(requested_since(&mock_server).await, vec!["0", "5"]);
}

#[tokio::test]
async fn test_every_listed_account_is_stored_without_gaps() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_listing(&mock_server, 0, &["mojombo", "defunkt"]).await;
    mount_listing(&mock_server, 2, &["pjhyett", "wycats"]).await;
    mount_listing(&mock_server, 4, &[]).await;
    mount_account(&mock_server, "mojombo", 1).await;
    mount_account(&mock_server, "defunkt", 2).await;
    mount_account(&mock_server, "pjhyett", 3).await;
    mount_account(&mock_server, "wycats", 4).await;

    let config = create_test_config(&mock_server.uri(), &db_path(&dir), 2, 1000);
    let mut coordinator =
        Coordinator::new(config, TOKEN.to_string(), "hash".to_string()).expect("coordinator");
    let report = coordinator.run().await.expect("crawl failed");

    assert_eq!(report.pages_fetched, 3);
    assert_eq!(report.accounts_saved, 4);

    let storage = coordinator.storage();
    assert_eq!(storage.count_accounts().unwrap(), 4);
    assert_eq!(storage.max_persisted_id().unwrap(), Some(report.final_cursor));
}

#[tokio::test]
async fn test_resume_continues_after_highest_stored_id() {
    let dir = TempDir::new().unwrap();

    // First run stores ids 1 and 2
    let first_server = MockServer::start().await;
    mount_listing(&first_server, 0, &["mojombo", "defunkt"]).await;
    mount_listing(&first_server, 2, &[]).await;
    mount_account(&first_server, "mojombo", 1).await;
    mount_account(&first_server, "defunkt", 2).await;

    let config = create_test_config(&first_server.uri(), &db_path(&dir), 2, 1000);
    Coordinator::new(config, TOKEN.to_string(), "hash".to_string())
        .expect("coordinator")
        .run()
        .await
        .expect("first crawl failed");

    // Second run must start from since=2 and never touch ids <= 2
    let second_server = MockServer::start().await;
    mount_listing(&second_server, 2, &["pjhyett"]).await;
    mount_listing(&second_server, 3, &[]).await;
    mount_account(&second_server, "pjhyett", 3).await;

    let config = create_test_config(&second_server.uri(), &db_path(&dir), 2, 1000);
    let mut coordinator =
        Coordinator::new(config, TOKEN.to_string(), "hash".to_string()).expect("coordinator");
    let report = coordinator.run().await.expect("second crawl failed");

    assert_eq!(report.start_cursor, 2);
    assert_eq!(report.accounts_saved, 1);
    assert_eq!(requested_since(&second_server).await, vec!["2", "3"]);

    let detail_paths: Vec<String> = second_server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| request.url.path().to_string())
        .filter(|p| p.starts_with("/users/"))
        .collect();
    assert_eq!(detail_paths, vec!["/users/pjhyett"]);

    let storage = coordinator.storage();
    assert_eq!(storage.count_accounts().unwrap(), 3);
    let runs = storage.list_runs(10).unwrap();
    assert_eq!(runs.len(), 2);
    assert!(runs.iter().all(|run| run.status == RunStatus::Completed));
}

#[tokio::test]
async fn test_missing_account_mid_page_does_not_halt_page() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_listing(&mock_server, 0, &["a", "readme", "c"]).await;
    mount_account(&mock_server, "a", 10).await;
    mount_status(&mock_server, "readme", 404).await;
    mount_account(&mock_server, "c", 12).await;
    mount_listing(&mock_server, 12, &[]).await;

    let config = create_test_config(&mock_server.uri(), &db_path(&dir), 3, 1000);
    let mut coordinator =
        Coordinator::new(config, TOKEN.to_string(), "hash".to_string()).expect("coordinator");
    let report = coordinator.run().await.expect("crawl failed");

    assert_eq!(report.final_cursor, 12);
    assert_eq!(report.accounts_saved, 2);
    assert_eq!(report.accounts_skipped, 1);
    assert!(coordinator.storage().get_account(12).unwrap().is_some());
}

#[tokio::test]
async fn test_rate_limited_request_is_retried() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    // Reset already in the past: the wait clamps to zero
    let reset = chrono::Utc::now().timestamp() - 60;

    mount_listing(&mock_server, 0, &["octocat"]).await;
    Mock::given(method("GET"))
        .and(path("/users/octocat"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("X-RateLimit-Remaining", "0")
                .insert_header("X-RateLimit-Reset", reset.to_string().as_str())
                .set_body_json(json!({ "message": "API rate limit exceeded" })),
        )
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_account(&mock_server, "octocat", 583231).await;
    mount_listing(&mock_server, 583231, &[]).await;

    let config = create_test_config(&mock_server.uri(), &db_path(&dir), 100, 25_000_000);
    let mut coordinator =
        Coordinator::new(config, TOKEN.to_string(), "hash".to_string()).expect("coordinator");
    let report = coordinator.run().await.expect("crawl failed");

    assert_eq!(report.accounts_saved, 1);

    let detail_requests = mock_server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == "/users/octocat")
        .count();
    assert_eq!(detail_requests, 2);
}

#[tokio::test]
async fn test_unexpected_status_fails_run_with_url_and_code() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_listing(&mock_server, 0, &["a", "b"]).await;
    mount_account(&mock_server, "a", 1).await;
    mount_status(&mock_server, "b", 500).await;

    let config = create_test_config(&mock_server.uri(), &db_path(&dir), 2, 1000);
    let mut coordinator =
        Coordinator::new(config, TOKEN.to_string(), "hash".to_string()).expect("coordinator");
    let err = coordinator.run().await.expect_err("crawl should fail");

    let message = err.to_string();
    assert!(matches!(
        err,
        GhMinerError::RemoteRequest {
            status_code: 500,
            ..
        }
    ));
    assert!(message.contains(&format!("{}/users/b", mock_server.uri())));
    assert!(message.contains("(500)"));
    assert_eq!(coordinator.phase(), CrawlPhase::Failed);

    let storage = SqliteStorage::new(&db_path(&dir)).expect("Failed to open DB");
    assert_eq!(storage.count_accounts().unwrap(), 1);
    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Failed);
}

#[tokio::test]
async fn test_token_is_sent_as_authorization_header() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/users"))
        .and(header("Authorization", format!("token {}", TOKEN).as_str()))
        .and(header("Accept", "application/vnd.github+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), &db_path(&dir), 100, 1000);
    let mut coordinator =
        Coordinator::new(config, TOKEN.to_string(), "hash".to_string()).expect("coordinator");
    let report = coordinator.run().await.expect("crawl failed");

    assert_eq!(report.pages_fetched, 1);
    assert_eq!(report.accounts_saved, 0);
}

#[tokio::test]
async fn test_crawl_stops_once_cursor_reaches_ceiling() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_listing(&mock_server, 0, &["mojombo", "defunkt"]).await;
    mount_account(&mock_server, "mojombo", 1).await;
    mount_account(&mock_server, "defunkt", 2).await;

    let config = create_test_config(&mock_server.uri(), &db_path(&dir), 2, 2);
    let mut coordinator =
        Coordinator::new(config, TOKEN.to_string(), "hash".to_string()).expect("coordinator");
    let report = coordinator.run().await.expect("crawl failed");

    assert_eq!(report.final_cursor, 2);
    assert_eq!(report.pages_fetched, 1);
    assert_eq!(requested_since(&mock_server).await, vec!["0"]);
}
