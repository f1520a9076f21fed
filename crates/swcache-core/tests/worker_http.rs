//! Integration tests for the worker over real HTTP.
//!
//! Uses wiremock for the origin and a temp-dir DiskStore. Tests cover the
//! offline fallbacks per category, write-through and stale reads for API
//! calls, install/activate against disk partitions, and GET_CACHE_SIZE.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use swcache_core::fallback::{FROM_CACHE_HEADER, OFFLINE_FALLBACK};
use swcache_core::{
    CacheError, Destination, DiskStore, Event, EventOutcome, HttpFetcher, PartitionStore,
    Request, TracingHost, Worker, WorkerConfig, WorkerState,
};
use tempfile::TempDir;
use tokio::sync::oneshot;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Nothing listens on the discard port; connections are refused.
const UNREACHABLE_ORIGIN: &str = "http://127.0.0.1:9/";

fn config_for(origin: &str) -> WorkerConfig {
    let mut config = WorkerConfig::default()
        .with_origin(Url::parse(origin).expect("valid origin"))
        .with_static_assets(["/", "/index.html", "/app.js", "/images/logo.jpg"]);
    config.timeout_secs = 5;
    config
}

fn mock_origin(mock_server: &MockServer) -> String {
    format!("{}/", mock_server.uri())
}

fn create_worker(config: WorkerConfig, dir: &Path) -> Worker {
    let fetcher = Arc::new(HttpFetcher::new(&config).expect("failed to create fetcher"));
    let store = Arc::new(DiskStore::with_dir(dir.join("partitions")));
    Worker::new(config, store, fetcher, Arc::new(TracingHost)).expect("failed to create worker")
}

async fn fetch(worker: &Worker, url: &str) -> swcache_core::Response {
    let request = Request::get(url).expect("valid url");
    worker
        .handle_fetch(&request)
        .await
        .expect("fetch failed")
        .expect("expected interception")
}

async fn mount_static_assets(mock_server: &MockServer) {
    for (p, body) in [
        ("/", "<html>home</html>"),
        ("/index.html", "<html>index</html>"),
        ("/images/logo.jpg", "jpeg-bytes"),
    ] {
        Mock::given(method("GET"))
            .and(path(p))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(mock_server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/app.js"))
        .respond_with(ResponseTemplate::new(404))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_collection_data_falls_back_to_mock_on_server_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/collection-data"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let worker = create_worker(config_for(&mock_origin(&mock_server)), temp_dir.path());

    let resp = fetch(&worker, &format!("{}/api/collection-data", mock_server.uri())).await;
    assert_eq!(resp.status, 200);
    assert_eq!(resp.header(FROM_CACHE_HEADER), Some(OFFLINE_FALLBACK));
    let body: Value = resp.json().unwrap();
    assert_eq!(body["totalSupply"], 3247);
    assert_eq!(body["currentPhase"], "public");

    // Failed responses are never stored.
    assert_eq!(worker.cache_size().await.unwrap(), 0);
}

#[tokio::test]
async fn test_api_writes_through_then_serves_stale() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/mint-events"))
        .and(header("cache-control", "no-cache"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"events": [{"address": "0xabc", "amount": 1}]})),
        )
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let worker = create_worker(config_for(&mock_origin(&mock_server)), temp_dir.path());
    let url = format!("{}/api/mint-events", mock_server.uri());

    let fresh = fetch(&worker, &url).await;
    assert_eq!(fresh.status, 200);
    assert_eq!(fresh.header(FROM_CACHE_HEADER), None);

    // Origin now fails; the stored copy is served instead of the mock.
    mock_server.reset().await;
    Mock::given(method("GET"))
        .and(path("/api/mint-events"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let stale = fetch(&worker, &url).await;
    assert_eq!(stale.status, 200);
    assert_eq!(stale.body, fresh.body);
    assert_eq!(stale.header(FROM_CACHE_HEADER), None);
}

#[tokio::test]
async fn test_unreachable_images_get_placeholder() {
    let temp_dir = TempDir::new().unwrap();
    let worker = create_worker(config_for(UNREACHABLE_ORIGIN), temp_dir.path());

    // Static by extension, but still an image.
    let logo = fetch(&worker, "http://127.0.0.1:9/images/logo.jpg").await;
    assert_eq!(logo.status, 200);
    assert_eq!(logo.header("content-type"), Some("image/svg+xml"));
    assert!(logo.text().contains("Image Unavailable"));

    let art = fetch(&worker, "http://127.0.0.1:9/gallery/42.webp").await;
    assert_eq!(art.header("content-type"), Some("image/svg+xml"));
}

#[tokio::test]
async fn test_unreachable_chain_returns_503() {
    let temp_dir = TempDir::new().unwrap();
    let worker = create_worker(config_for(UNREACHABLE_ORIGIN), temp_dir.path());

    let resp = fetch(&worker, "http://rpc.hyperliquid.invalid/v1").await;
    assert_eq!(resp.status, 503);
    assert_eq!(resp.header("content-type"), Some("application/json"));
    assert_eq!(
        resp.text(),
        r#"{"error":"Network unavailable","message":"Please check your connection and try again"}"#
    );
}

#[tokio::test]
async fn test_chain_responses_pass_through_uncached() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rpc"))
        .and(header("cache-control", "no-cache"))
        .respond_with(ResponseTemplate::new(500).set_body_string("node error"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let worker = create_worker(config_for(&mock_origin(&mock_server)), temp_dir.path());
    let url = format!("{}/rpc", mock_server.uri());

    for _ in 0..2 {
        let resp = fetch(&worker, &url).await;
        assert_eq!(resp.status, 500);
        assert_eq!(resp.text(), "node error");
    }
    assert_eq!(worker.cache_size().await.unwrap(), 0);
}

#[tokio::test]
async fn test_generic_network_failure_surfaces() {
    let temp_dir = TempDir::new().unwrap();
    let worker = create_worker(config_for(UNREACHABLE_ORIGIN), temp_dir.path());

    let request = Request::get("http://127.0.0.1:9/about").unwrap();
    let err = worker.handle_fetch(&request).await.unwrap_err();
    assert!(matches!(err, CacheError::Network { .. }));
}

#[tokio::test]
async fn test_install_caches_what_it_can_and_serves_offline() {
    let temp_dir = TempDir::new().unwrap();
    let mock_server = MockServer::start().await;
    mount_static_assets(&mock_server).await;
    let origin = mock_origin(&mock_server);
    let mut config = config_for(&origin);
    config.timeout_secs = 1;
    let worker = create_worker(config, temp_dir.path());

    let outcome = worker.dispatch(Event::Install).await.unwrap();
    let EventOutcome::Installed(report) = outcome else {
        panic!("expected install report");
    };
    assert_eq!(report.cached.len(), 3);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "/app.js");
    assert_eq!(worker.state(), WorkerState::Installed);

    worker.dispatch(Event::Activate).await.unwrap();
    assert_eq!(worker.state(), WorkerState::Activated);

    // A page the origin never answers in time.
    Mock::given(method("GET"))
        .and(path("/mint/live.html"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let logo = fetch(&worker, &format!("{}images/logo.jpg", origin)).await;
    assert_eq!(logo.text(), "jpeg-bytes");

    let navigation = Request::get(&format!("{}mint/live.html", origin))
        .unwrap()
        .with_destination(Destination::Document);
    let page = worker.handle_fetch(&navigation).await.unwrap().unwrap();
    assert_eq!(page.text(), "<html>home</html>");
}

#[tokio::test]
async fn test_activate_new_version_reclaims_old_partitions() {
    let temp_dir = TempDir::new().unwrap();
    let mock_server = MockServer::start().await;
    mount_static_assets(&mock_server).await;
    let origin = mock_origin(&mock_server);

    let v1 = create_worker(config_for(&origin), temp_dir.path());
    v1.install().await.unwrap();
    v1.activate().await.unwrap();

    let v2 = create_worker(config_for(&origin).with_version("v2"), temp_dir.path());
    v2.install().await.unwrap();
    let report = v2.activate().await.unwrap();
    assert_eq!(report.deleted, vec!["hypertoons-static-v1".to_string()]);

    let store = DiskStore::with_dir(temp_dir.path().join("partitions"));
    let names = store.partition_names().await.unwrap();
    assert_eq!(names, vec!["hypertoons-static-v2".to_string()]);
    assert_eq!(v2.cache_size().await.unwrap(), 3);
}

#[tokio::test]
async fn test_get_cache_size_message() {
    let temp_dir = TempDir::new().unwrap();
    let mock_server = MockServer::start().await;
    mount_static_assets(&mock_server).await;
    let worker = create_worker(config_for(&mock_origin(&mock_server)), temp_dir.path());
    worker.install().await.unwrap();

    let (tx, rx) = oneshot::channel();
    worker
        .spawn(Event::Message {
            data: json!({"type": "GET_CACHE_SIZE"}),
            port: Some(tx),
        })
        .await
        .unwrap()
        .unwrap();

    let reply = rx.await.expect("reply");
    assert_eq!(reply.cache_size, 3);
}

#[tokio::test]
async fn test_repeated_response_headers_survive_fetch_and_cache() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/app.js"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("console.log(1)")
                .append_header("link", "</a.css>; rel=preload")
                .append_header("link", "</b.css>; rel=preload"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let worker = create_worker(config_for(&mock_origin(&mock_server)), temp_dir.path());
    let url = format!("{}/app.js", mock_server.uri());
    let joined = Some("</a.css>; rel=preload, </b.css>; rel=preload");

    let fresh = fetch(&worker, &url).await;
    assert_eq!(fresh.header("link"), joined);

    // Second read comes from the static partition with the same headers.
    let cached = fetch(&worker, &url).await;
    assert_eq!(cached.header("link"), joined);
}
