//! Integration tests for the scraper
//!
//! These tests use wiremock to serve portfolio pages and run the whole
//! scrape cycle end-to-end against files in a temporary directory.

use sft_scraper::config::{Config, DEFAULT_MISSING_PHRASE};
use sft_scraper::scraper::{scrape, Coordinator};
use sft_scraper::ScrapeError;
use std::collections::HashSet;
use std::path::Path;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(server: &MockServer, dir: &Path, start: u64, end: u64, resume: bool) -> Config {
    let mut config = Config::default();
    config.range.start = start;
    config.range.end = end;
    config.fetch.url_template = format!("{}/portfolio/{{id}}", server.uri());
    config.fetch.timeout = 2.0;
    config.fetch.retries = 1;
    config.fetch.backoff_base = 0.01;
    config.pool.workers = 3;
    config.pool.progress_interval = 0.05;
    config.output.base_dir = dir.to_path_buf();
    config.output.out = "names.txt".to_string();
    config.output.resume = resume;
    config
}

fn page(title: &str) -> String {
    format!(
        "<html><head><title>{}</title></head><body>portfolio</body></html>",
        title
    )
}

/// Mounts one page per outcome kind
///
/// | ID | Response | Outcome |
/// |----|----------|---------|
/// | 1 | named page | accepted |
/// | 2 | moved-page notice | missing page |
/// | 3 | inactive user | inactive user |
/// | 4 | page without a title | no title |
/// | 5 | HTTP 500 | failed |
async fn mount_portfolio(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/portfolio/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page("Jan Novák")))
        .mount(server)
        .await;

    let missing = format!("Chyba - {}", DEFAULT_MISSING_PHRASE);
    Mock::given(method("GET"))
        .and(path("/portfolio/2"))
        .respond_with(ResponseTemplate::new(404).set_body_string(page(&missing)))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/portfolio/3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page("Neaktivní uživatel")))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/portfolio/4"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>empty</body></html>"))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/portfolio/5"))
        .respond_with(ResponseTemplate::new(500))
        .mount(server)
        .await;
}

fn read_lines(path: &Path) -> Vec<String> {
    let mut lines: Vec<String> = std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect();
    lines.sort();
    lines
}

fn read_ids(path: &Path) -> HashSet<u64> {
    read_lines(path)
        .iter()
        .filter_map(|line| line.trim().parse().ok())
        .collect()
}

async fn requested_paths(server: &MockServer) -> Vec<String> {
    let mut paths: Vec<String> = server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| request.url.path().to_string())
        .collect();
    paths.sort();
    paths.dedup();
    paths
}

#[tokio::test]
async fn test_full_scrape_routes_every_outcome() {
    let server = MockServer::start().await;
    mount_portfolio(&server).await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, dir.path(), 1, 5, true);

    let summary = scrape(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(summary.counters.total, 5);
    assert_eq!(summary.counters.dispatched, 5);
    assert_eq!(summary.counters.processed, 5);
    assert_eq!(summary.counters.accepted, 1);
    assert_eq!(summary.counters.missing_page, 1);
    assert_eq!(summary.counters.inactive_user, 1);
    assert_eq!(summary.counters.no_title, 1);
    assert_eq!(summary.counters.failed, 1);
    assert_eq!(summary.skipped, 0);
    assert!(!summary.stopped_early);

    assert_eq!(read_lines(&config.output.output_path()), vec!["Jan Novák".to_string()]);

    let done = read_ids(&config.output.done_ids_path());
    assert_eq!(done, [1, 2, 3, 4].into_iter().collect::<HashSet<u64>>());
}

#[tokio::test]
async fn test_failed_page_is_retried_before_giving_up() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/portfolio/5"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, dir.path(), 5, 5, false);

    let summary = scrape(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(summary.counters.failed, 1);
    assert_eq!(summary.counters.processed, 1);
    server.verify().await;
}

#[tokio::test]
async fn test_resumed_run_only_fetches_unfinished_ids() {
    let dir = TempDir::new().unwrap();

    let first = MockServer::start().await;
    mount_portfolio(&first).await;
    let config = create_test_config(&first, dir.path(), 1, 5, true);
    scrape(&config, CancellationToken::new()).await.unwrap();

    // ID 5 recovers on the second run.
    let second = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/portfolio/5"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page("Eva Svobodová")))
        .mount(&second)
        .await;
    let config = create_test_config(&second, dir.path(), 1, 5, true);

    let summary = scrape(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(requested_paths(&second).await, vec!["/portfolio/5".to_string()]);
    assert_eq!(summary.skipped, 4);
    assert_eq!(summary.counters.total, 1);
    assert_eq!(summary.counters.accepted, 1);

    assert_eq!(
        read_lines(&config.output.output_path()),
        vec!["Eva Svobodová".to_string(), "Jan Novák".to_string()]
    );
    let done = read_ids(&config.output.done_ids_path());
    assert_eq!(done, (1..=5).collect::<HashSet<u64>>());
}

#[tokio::test]
async fn test_without_resume_every_id_is_fetched() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("names.txt.done_ids"), "1\n2\n3\n4\n").unwrap();

    let server = MockServer::start().await;
    mount_portfolio(&server).await;
    let config = create_test_config(&server, dir.path(), 1, 5, false);

    let summary = scrape(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.counters.processed, 5);
    assert_eq!(requested_paths(&server).await.len(), 5);

    // The ledger is neither read nor written.
    assert_eq!(
        std::fs::read_to_string(config.output.done_ids_path()).unwrap(),
        "1\n2\n3\n4\n"
    );
}

#[tokio::test]
async fn test_resume_falls_back_to_legacy_output() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("names.txt"), "1\tJan Novák\n3\tEva Svobodová\n").unwrap();

    let server = MockServer::start().await;
    mount_portfolio(&server).await;
    let config = create_test_config(&server, dir.path(), 1, 5, true);

    let coordinator = Coordinator::new(&config).unwrap();
    assert_eq!(coordinator.candidates(), &[2, 4, 5]);
    assert_eq!(coordinator.skipped(), 2);
}

#[tokio::test]
async fn test_output_directory_is_created() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start().await;
    mount_portfolio(&server).await;
    let mut config = create_test_config(&server, &dir.path().join("nested").join("out"), 1, 1, false);
    config.pool.workers = 1;

    let summary = scrape(&config, CancellationToken::new()).await.unwrap();

    assert!(config.output.output_path().exists());
    assert_eq!(summary.output_path, config.output.output_path());
    assert_eq!(read_lines(&summary.output_path), vec!["Jan Novák".to_string()]);
}

#[tokio::test]
async fn test_unwritable_output_fails_before_dispatch() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();

    let server = MockServer::start().await;
    mount_portfolio(&server).await;
    let config = create_test_config(&server, &blocker, 1, 5, true);

    let result = scrape(&config, CancellationToken::new()).await;

    assert!(matches!(result, Err(ScrapeError::Storage(_))));
    assert!(requested_paths(&server).await.is_empty());
}

#[tokio::test]
async fn test_invalid_range_is_rejected() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start().await;
    let config = create_test_config(&server, dir.path(), 9, 3, false);

    let result = scrape(&config, CancellationToken::new()).await;

    assert!(matches!(result, Err(ScrapeError::Config(_))));
    assert!(!config.output.output_path().exists());
}

#[tokio::test]
async fn test_cancelled_run_dispatches_nothing() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start().await;
    mount_portfolio(&server).await;
    let config = create_test_config(&server, dir.path(), 1, 5, true);

    let cancel = CancellationToken::new();
    cancel.cancel();
    let summary = scrape(&config, cancel).await.unwrap();

    assert!(summary.stopped_early);
    assert_eq!(summary.counters.dispatched, 0);
    assert_eq!(summary.counters.processed, 0);
    assert!(requested_paths(&server).await.is_empty());
}

#[tokio::test]
async fn test_legacy_ids_survive_consecutive_resumed_runs() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("names.txt"), "1\tJan Novák\n3\tEva Svobodová\n").unwrap();

    // First resumed run stops before dispatching anything.
    let first = MockServer::start().await;
    mount_portfolio(&first).await;
    let config = create_test_config(&first, dir.path(), 1, 5, true);
    let cancel = CancellationToken::new();
    cancel.cancel();
    let summary = scrape(&config, cancel).await.unwrap();
    assert_eq!(summary.skipped, 2);

    let done = read_ids(&config.output.done_ids_path());
    assert_eq!(done, [1, 3].into_iter().collect::<HashSet<u64>>());

    // The ledger now exists, yet the legacy IDs stay skipped.
    let second = MockServer::start().await;
    mount_portfolio(&second).await;
    let config = create_test_config(&second, dir.path(), 1, 5, true);
    assert_eq!(Coordinator::new(&config).unwrap().candidates(), &[2, 4, 5]);

    let summary = scrape(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.counters.processed, 3);
    assert_eq!(
        requested_paths(&second).await,
        vec![
            "/portfolio/2".to_string(),
            "/portfolio/4".to_string(),
            "/portfolio/5".to_string()
        ]
    );
    assert_eq!(
        read_lines(&config.output.output_path()),
        vec!["1\tJan Novák".to_string(), "3\tEva Svobodová".to_string()]
    );

    let done = read_ids(&config.output.done_ids_path());
    assert_eq!(done, [1, 2, 3, 4].into_iter().collect::<HashSet<u64>>());
}

#[tokio::test]
async fn test_oversized_range_is_rejected() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start().await;
    mount_portfolio(&server).await;
    let config = create_test_config(&server, dir.path(), 1, u64::MAX, false);

    let result = scrape(&config, CancellationToken::new()).await;

    assert!(matches!(result, Err(ScrapeError::Config(_))));
    assert!(!config.output.output_path().exists());
    assert!(requested_paths(&server).await.is_empty());
}
