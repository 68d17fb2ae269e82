//! Tests for source fetching: retries, supplemental adapters and the
//! Mullvad API client with its response cache.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use relay_list::initialization::init_api_client;
use relay_list::source::{MullvadApi, ResponseCache, SourceAdapter, SourceManager};

#[path = "helpers.rs"]
mod helpers;

use helpers::{sample_payload, StaticSource};

/// Fails the first `failures` calls, then succeeds.
struct FlakySource {
    failures: usize,
    calls: AtomicUsize,
}

impl FlakySource {
    fn new(failures: usize) -> Self {
        Self {
            failures,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SourceAdapter for FlakySource {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn fetch(&self, _force_refresh: bool) -> anyhow::Result<Value> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            anyhow::bail!("transient failure {}", call + 1);
        }
        Ok(json!({"ok": true}))
    }
}

fn manager(adapters: Vec<Box<dyn SourceAdapter>>) -> SourceManager {
    SourceManager::new(
        Box::new(StaticSource::new("mullvad", sample_payload())),
        adapters,
    )
    .with_retry(Duration::from_millis(1), 2)
}

#[tokio::test]
async fn test_retry_recovers_after_one_failure() {
    let results = manager(vec![Box::new(FlakySource::new(1))])
        .fetch_all(false)
        .await;
    assert_eq!(results.len(), 2);
    let flaky = &results[1];
    assert_eq!(flaky.name, "flaky");
    assert_eq!(flaky.attempts, 2);
    assert!(flaky.error.is_none());
    assert_eq!(flaky.payload, Some(json!({"ok": true})));
}

#[tokio::test]
async fn test_persistent_failure_exhausts_attempts() {
    let results = manager(vec![Box::new(FlakySource::new(usize::MAX))])
        .fetch_all(true)
        .await;
    let primary = &results[0];
    assert_eq!(primary.name, "mullvad");
    assert!(primary.succeeded());
    assert_eq!(primary.attempts, 1);
    assert!(primary.cache_bypassed);

    let flaky = &results[1];
    assert_eq!(flaky.attempts, 2);
    assert!(flaky.payload.is_none());
    let error = flaky.error.as_ref().expect("error should be kept");
    assert_eq!(error.to_string(), "transient failure 2");
}

#[tokio::test]
async fn test_results_follow_configuration_order() {
    let results = manager(vec![
        Box::new(StaticSource::new("mirror-b", json!({}))),
        Box::new(StaticSource::new("mirror-a", json!({}))),
    ])
    .fetch_all(false)
    .await;
    let names: Vec<_> = results.iter().map(|result| result.name.as_str()).collect();
    assert_eq!(names, vec!["mullvad", "mirror-b", "mirror-a"]);
}

#[tokio::test]
async fn test_max_attempts_is_at_least_one() {
    let manager = SourceManager::new(Box::new(FlakySource::new(usize::MAX)), Vec::new())
        .with_retry(Duration::ZERO, 0);
    assert_eq!(manager.max_attempts(), 1);
    let results = manager.fetch_all(false).await;
    assert_eq!(results[0].attempts, 1);
}

async fn api_server(response: ResponseTemplate, expected_calls: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/public/relays/wireguard/v2"))
        .respond_with(response)
        .expect(expected_calls)
        .mount(&server)
        .await;
    server
}

fn api_for(server: &MockServer) -> MullvadApi {
    MullvadApi::new(init_api_client().expect("client"))
        .with_url(format!("{}/public/relays/wireguard/v2", server.uri()))
}

#[tokio::test]
async fn test_api_returns_payload() {
    let server = api_server(ResponseTemplate::new(200).set_body_json(sample_payload()), 1).await;
    let payload = api_for(&server).fetch_wireguard_relays(false).await.unwrap();
    assert_eq!(payload, sample_payload());
}

#[tokio::test]
async fn test_api_rejects_error_status() {
    let server = api_server(ResponseTemplate::new(503), 1).await;
    let err = api_for(&server).fetch_wireguard_relays(false).await.unwrap_err();
    assert!(err.to_string().starts_with("Unexpected status 503 from"));
}

#[tokio::test]
async fn test_api_rejects_non_json_body() {
    let server = api_server(ResponseTemplate::new(200).set_body_string("<html>"), 1).await;
    let err = api_for(&server).fetch_wireguard_relays(false).await.unwrap_err();
    assert_eq!(err.to_string(), "Mullvad API did not return JSON data");
}

#[tokio::test]
async fn test_api_unreachable() {
    let addr = helpers::unused_addr().await;
    let api = MullvadApi::new(init_api_client().unwrap()).with_url(format!("http://{addr}/relays"));
    let err = api.fetch_wireguard_relays(false).await.unwrap_err();
    assert!(err.to_string().starts_with("Failed to reach http://"));
}

#[tokio::test]
async fn test_cached_response_is_reused() {
    let dir = TempDir::new().unwrap();
    let server = api_server(ResponseTemplate::new(200).set_body_json(sample_payload()), 1).await;
    let cache = ResponseCache::new(dir.path(), Duration::from_secs(300)).unwrap();
    let api = api_for(&server).with_cache(cache.clone());

    let first = api.fetch_wireguard_relays(false).await.unwrap();
    let second = api.fetch_wireguard_relays(false).await.unwrap();
    assert_eq!(first, second);
    assert!(cache.path_for(api.url()).exists());
}

#[tokio::test]
async fn test_force_refresh_skips_cache_reads() {
    let dir = TempDir::new().unwrap();
    let server = api_server(ResponseTemplate::new(200).set_body_json(sample_payload()), 2).await;
    let cache = ResponseCache::new(dir.path(), Duration::from_secs(300)).unwrap();
    let api = api_for(&server).with_cache(cache);

    api.fetch_wireguard_relays(false).await.unwrap();
    api.fetch_wireguard_relays(true).await.unwrap();
}

#[tokio::test]
async fn test_long_api_url_is_fetched_and_cached() {
    let dir = TempDir::new().unwrap();
    let server = api_server(ResponseTemplate::new(200).set_body_json(sample_payload()), 1).await;
    let cache = ResponseCache::new(dir.path(), Duration::from_secs(300)).unwrap();
    let url = format!(
        "{}/public/relays/wireguard/v2?token={}",
        server.uri(),
        "x".repeat(300)
    );
    let api = MullvadApi::new(init_api_client().unwrap())
        .with_url(url)
        .with_cache(cache.clone());

    let payload = api.fetch_wireguard_relays(false).await.unwrap();
    assert_eq!(payload, sample_payload());
    assert!(cache.path_for(api.url()).exists());
    assert_eq!(api.fetch_wireguard_relays(false).await.unwrap(), payload);
}

#[tokio::test]
async fn test_cache_write_failure_keeps_the_response() {
    let dir = TempDir::new().unwrap();
    let server = api_server(ResponseTemplate::new(200).set_body_json(sample_payload()), 1).await;
    let cache_dir = dir.path().join("cache");
    let cache = ResponseCache::new(&cache_dir, Duration::from_secs(300)).unwrap();
    std::fs::remove_dir(&cache_dir).unwrap();
    std::fs::write(&cache_dir, "not a directory").unwrap();

    let payload = api_for(&server)
        .with_cache(cache)
        .fetch_wireguard_relays(false)
        .await
        .unwrap();
    assert_eq!(payload, sample_payload());
}

#[tokio::test]
async fn test_api_is_the_primary_source() {
    let server = api_server(ResponseTemplate::new(200).set_body_json(sample_payload()), 1).await;
    let api = api_for(&server);
    assert_eq!(api.name(), "mullvad");
    let results = SourceManager::new(Box::new(api), Vec::new()).fetch_all(false).await;
    assert!(results[0].succeeded());
}
