//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! crawl cycle end-to-end through the plain HTTP engine.

use docs_mirror::config::{Config, Engine};
use docs_mirror::crawler::{run_crawl, Crawler, FailureClass, HttpRenderer, RetryPolicy};
use docs_mirror::storage::{JsonManifest, ResumeStore};
use docs_mirror::url::normalize_url;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration scoped to `<server>/guide`
fn create_test_config(server: &MockServer, output: &Path) -> Config {
    let base = url::Url::parse(&server.uri()).expect("Failed to parse base URL");
    let host = format!(
        "{}:{}",
        base.host_str().expect("Failed to extract host"),
        base.port().expect("Mock server has no port")
    );

    let mut config = Config::default();
    config.scope.base_host = host;
    config.scope.path_prefix = "/guide".to_string();
    config.scope.start_url = format!("{}/guide", server.uri());
    config.crawler.rate_limit_delay = 0.0;
    config.browser.engine = Engine::Http;
    config.output.directory = output.to_path_buf();
    config
}

fn html(links: &[&str]) -> ResponseTemplate {
    let anchors: String = links
        .iter()
        .map(|l| format!(r#"<a href="{}">{}</a>"#, l, l))
        .collect();
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", anchors))
        .insert_header("content-type", "text/html")
}

fn manifest_paths(output: &Path) -> Vec<String> {
    let mut paths: Vec<String> = JsonManifest::new(output)
        .load()
        .expect("Failed to load manifest")
        .iter()
        .map(|u| u.path().to_string())
        .collect();
    paths.sort();
    paths
}

#[tokio::test]
async fn test_full_mirror_of_small_site() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/guide"))
        .respond_with(html(&["/guide/a", "/guide/b/", "/elsewhere"]))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/guide/a"))
        .respond_with(html(&["b#details", "/guide", "https://example.com/guide/x"]))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/guide/b"))
        .respond_with(html(&[]))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Out of scope; never requested
    Mock::given(method("GET"))
        .and(path("/elsewhere"))
        .respond_with(html(&[]))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server, output.path());
    let outcome = run_crawl(&config, std::future::pending())
        .await
        .expect("Crawl failed");

    assert_eq!(outcome.stats.successful, 3);
    assert_eq!(outcome.stats.failed, 0);
    assert!(!outcome.cancelled);
    assert!(outcome.state_saved);

    assert!(output.path().join("index.html").exists());
    assert!(output.path().join("a").join("index.html").exists());
    assert!(output.path().join("b").join("index.html").exists());

    let page_a = std::fs::read_to_string(output.path().join("a").join("index.html")).unwrap();
    assert!(page_a.contains("b#details"));

    assert_eq!(
        manifest_paths(output.path()),
        vec!["/guide", "/guide/a", "/guide/b"]
    );
}

#[tokio::test]
async fn test_resume_skips_previous_work() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    let config = create_test_config(&mock_server, output.path());

    // /guide/a finished in a previous run; /guide/b was written but not recorded
    let previous: HashSet<_> = [normalize_url(&format!("{}/guide/a", mock_server.uri())).unwrap()]
        .into_iter()
        .collect();
    JsonManifest::new(output.path()).save(&previous).unwrap();
    std::fs::create_dir_all(output.path().join("b")).unwrap();
    std::fs::write(output.path().join("b").join("index.html"), "<html>b</html>").unwrap();

    Mock::given(method("GET"))
        .and(path("/guide"))
        .respond_with(html(&["/guide/a", "/guide/b", "/guide/c"]))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/guide/a"))
        .respond_with(html(&[]))
        .expect(0)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/guide/b"))
        .respond_with(html(&[]))
        .expect(0)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/guide/c"))
        .respond_with(html(&[]))
        .expect(1)
        .mount(&mock_server)
        .await;

    let outcome = run_crawl(&config, std::future::pending())
        .await
        .expect("Crawl failed");

    assert_eq!(outcome.stats.successful, 2);
    assert_eq!(outcome.stats.skipped, 1);
    assert_eq!(
        manifest_paths(output.path()),
        vec!["/guide", "/guide/a", "/guide/b", "/guide/c"]
    );

    let untouched = std::fs::read_to_string(output.path().join("b").join("index.html")).unwrap();
    assert_eq!(untouched, "<html>b</html>");
}

#[tokio::test]
async fn test_fresh_run_ignores_manifest() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    let mut config = create_test_config(&mock_server, output.path());
    config.crawler.resume = false;

    let previous: HashSet<_> = [normalize_url(&config.scope.start_url).unwrap()]
        .into_iter()
        .collect();
    JsonManifest::new(output.path()).save(&previous).unwrap();

    Mock::given(method("GET"))
        .and(path("/guide"))
        .respond_with(html(&[]))
        .expect(1)
        .mount(&mock_server)
        .await;

    let outcome = run_crawl(&config, std::future::pending())
        .await
        .expect("Crawl failed");

    assert_eq!(outcome.stats.successful, 1);
}

#[tokio::test]
async fn test_recovers_from_rate_limit() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    let config = create_test_config(&mock_server, output.path());

    // First request is rate limited, the retry succeeds
    Mock::given(method("GET"))
        .and(path("/guide"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/guide"))
        .respond_with(html(&[]))
        .expect(1)
        .mount(&mock_server)
        .await;

    let renderer = HttpRenderer::new(&config.browser).unwrap();
    let policy = RetryPolicy {
        rate_limit_base: Duration::from_millis(50),
        ..RetryPolicy::default()
    };
    let mut crawler = Crawler::new(&config, renderer, JsonManifest::new(output.path()))
        .unwrap()
        .with_retry_policy(policy);

    let outcome = crawler.run().await;

    assert_eq!(outcome.stats.successful, 1);
    assert_eq!(outcome.stats.failed, 0);
    assert!(output.path().join("index.html").exists());
}

#[tokio::test]
async fn test_http_errors_are_recorded_and_skipped() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    let config = create_test_config(&mock_server, output.path());

    Mock::given(method("GET"))
        .and(path("/guide"))
        .respond_with(html(&["/guide/missing", "/guide/ok"]))
        .mount(&mock_server)
        .await;

    // Permanent failures are not retried
    Mock::given(method("GET"))
        .and(path("/guide/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/guide/ok"))
        .respond_with(html(&[]))
        .mount(&mock_server)
        .await;

    let outcome = run_crawl(&config, std::future::pending())
        .await
        .expect("Crawl failed");

    assert_eq!(outcome.stats.successful, 2);
    assert_eq!(outcome.stats.failed, 1);
    assert_eq!(outcome.stats.failures(FailureClass::Permanent), 1);
    assert!(!output.path().join("missing").join("index.html").exists());
    assert_eq!(
        manifest_paths(output.path()),
        vec!["/guide", "/guide/missing", "/guide/ok"]
    );
}

#[tokio::test]
async fn test_out_of_scope_seed_rejected() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    let mut config = create_test_config(&mock_server, output.path());
    config.scope.start_url = format!("{}/blog", mock_server.uri());

    let result = run_crawl(&config, std::future::pending()).await;

    assert!(result.is_err());
    assert!(mock_server.received_requests().await.unwrap_or_default().is_empty());
}
