//! Worker lifecycle and event dispatch.
//!
//! ```text
//! parsed ──install──▶ installing ──▶ installed ──activate──▶ activating ──▶ activated
//! ```
//!
//! Each event is handled by its own async handler and can be run as an
//! independent task with [`Worker::spawn`]. Side effects outside the cache
//! (skip-waiting, claiming pages, notifications, windows) go through the
//! [`Host`] trait.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::{CacheError, CacheResult};
use crate::fetch::Fetcher;
use crate::partition::{Partition, PartitionManager, PartitionStore};
use crate::strategy::Engine;
use crate::types::{PartitionKind, Request, Response, WorkerConfig};

/// Lifecycle state of a worker instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Parsed => "parsed",
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Activating => "activating",
            Self::Activated => "activated",
        };
        f.write_str(s)
    }
}

/// Control message posted by the hosting page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    SkipWaiting,
    GetCacheSize,
}

/// Reply to `GET_CACHE_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSizeReply {
    #[serde(rename = "cacheSize")]
    pub cache_size: u64,
}

/// Response channel supplied by the page with a message.
pub type ReplyPort = oneshot::Sender<CacheSizeReply>;

/// Push message body.
#[derive(Debug, Clone, Deserialize)]
pub struct PushPayload {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

/// A notification as displayed by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    #[serde(default)]
    pub data: Option<Value>,
    pub require_interaction: bool,
    pub silent: bool,
}

impl Notification {
    /// Page to open on click; the site root when the payload carries none.
    pub fn target_url(&self) -> &str {
        self.data
            .as_ref()
            .and_then(|data| data.get("url"))
            .and_then(Value::as_str)
            .unwrap_or("/")
    }
}

/// Events delivered by the hosting runtime.
#[derive(Debug)]
pub enum Event {
    Install,
    Activate,
    Fetch(Request),
    Message {
        data: Value,
        port: Option<ReplyPort>,
    },
    Push(Option<Bytes>),
    NotificationClick(Notification),
}

impl Event {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Activate => "activate",
            Self::Fetch(_) => "fetch",
            Self::Message { .. } => "message",
            Self::Push(_) => "push",
            Self::NotificationClick(_) => "notificationclick",
        }
    }
}

/// What an event handler produced.
#[derive(Debug)]
pub enum EventOutcome {
    Installed(InstallReport),
    Activated(ActivateReport),
    Response(Response),
    /// Not intercepted; the request goes to the network untouched.
    NotIntercepted,
    MessageHandled,
    NotificationShown(Notification),
    NotificationSkipped,
    WindowOpened(String),
}

/// Result of the install step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub cached: Vec<String>,
    pub failed: Vec<(String, String)>,
}

/// Result of the activate step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivateReport {
    pub deleted: Vec<String>,
}

/// Side effects the hosting runtime performs on the worker's behalf.
#[async_trait]
pub trait Host: Send + Sync + fmt::Debug {
    /// Activate without waiting for older instances to finish.
    async fn skip_waiting(&self) -> CacheResult<()>;

    /// Take control of every open page immediately.
    async fn claim_clients(&self) -> CacheResult<()>;

    async fn show_notification(&self, notification: &Notification) -> CacheResult<()>;

    async fn close_notification(&self, notification: &Notification) -> CacheResult<()>;

    /// Focus a page at `url`, opening one if needed.
    async fn open_window(&self, url: &str) -> CacheResult<()>;
}

/// [`Host`] that only records side effects in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingHost;

#[async_trait]
impl Host for TracingHost {
    async fn skip_waiting(&self) -> CacheResult<()> {
        info!("skip waiting");
        Ok(())
    }

    async fn claim_clients(&self) -> CacheResult<()> {
        info!("claimed clients");
        Ok(())
    }

    async fn show_notification(&self, notification: &Notification) -> CacheResult<()> {
        info!(title = %notification.title, body = %notification.body, "show notification");
        Ok(())
    }

    async fn close_notification(&self, notification: &Notification) -> CacheResult<()> {
        info!(title = %notification.title, "close notification");
        Ok(())
    }

    async fn open_window(&self, url: &str) -> CacheResult<()> {
        info!(url, "open window");
        Ok(())
    }
}

/// One worker instance.
#[derive(Debug, Clone)]
pub struct Worker {
    engine: Engine,
    host: Arc<dyn Host>,
    state: Arc<watch::Sender<WorkerState>>,
    skip_waiting: Arc<AtomicBool>,
}

impl Worker {
    pub fn new(
        config: WorkerConfig,
        store: Arc<dyn PartitionStore>,
        fetcher: Arc<dyn Fetcher>,
        host: Arc<dyn Host>,
    ) -> CacheResult<Self> {
        config.validate()?;
        let partitions = PartitionManager::new(store, &config);
        let engine = Engine::new(Arc::new(config), partitions, fetcher);
        let (state, _) = watch::channel(WorkerState::Parsed);

        Ok(Self {
            engine,
            host,
            state: Arc::new(state),
            skip_waiting: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn partitions(&self) -> &PartitionManager {
        self.engine.partitions()
    }

    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    /// Watch lifecycle transitions.
    pub fn subscribe(&self) -> watch::Receiver<WorkerState> {
        self.state.subscribe()
    }

    /// Whether skip-waiting was requested (by install or by the page).
    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    /// Route an event to its handler.
    pub async fn dispatch(&self, event: Event) -> CacheResult<EventOutcome> {
        debug!(event = event.kind(), "dispatch");
        match event {
            Event::Install => self.install().await.map(EventOutcome::Installed),
            Event::Activate => self.activate().await.map(EventOutcome::Activated),
            Event::Fetch(request) => Ok(match self.handle_fetch(&request).await? {
                Some(response) => EventOutcome::Response(response),
                None => EventOutcome::NotIntercepted,
            }),
            Event::Message { data, port } => {
                self.handle_message(data, port).await;
                Ok(EventOutcome::MessageHandled)
            }
            Event::Push(payload) => Ok(match self.handle_push(payload.as_deref()).await {
                Some(notification) => EventOutcome::NotificationShown(notification),
                None => EventOutcome::NotificationSkipped,
            }),
            Event::NotificationClick(notification) => Ok(EventOutcome::WindowOpened(
                self.handle_notification_click(&notification).await,
            )),
        }
    }

    /// Run an event as an independent task.
    pub fn spawn(&self, event: Event) -> JoinHandle<CacheResult<EventOutcome>> {
        let worker = self.clone();
        tokio::spawn(async move { worker.dispatch(event).await })
    }

    /// Precache the static assets, then ask to activate immediately.
    ///
    /// An asset that fails to fetch or store is logged and reported; it does
    /// not fail the install.
    pub async fn install(&self) -> CacheResult<InstallReport> {
        self.transition(&[WorkerState::Parsed], WorkerState::Installing, "install")?;
        info!("worker installing");

        let report = match self.partitions().open(PartitionKind::Static).await {
            Ok(partition) => {
                let config = self.engine.config();
                let fetches = config.static_assets.iter().map(|asset| {
                    let partition = partition.clone();
                    async move {
                        let result = self.precache_asset(&partition, asset).await;
                        (asset.clone(), result)
                    }
                });

                let mut report = InstallReport::default();
                for (asset, result) in join_all(fetches).await {
                    match result {
                        Ok(()) => report.cached.push(asset),
                        Err(e) => {
                            error!(asset = %asset, error = %e, "failed to cache static asset");
                            report.failed.push((asset, e.to_string()));
                        }
                    }
                }
                report
            }
            Err(e) => {
                error!(error = %e, "failed to open static partition");
                InstallReport {
                    cached: Vec::new(),
                    failed: self
                        .engine
                        .config()
                        .static_assets
                        .iter()
                        .map(|asset| (asset.clone(), e.to_string()))
                        .collect(),
                }
            }
        };

        info!(
            cached = report.cached.len(),
            failed = report.failed.len(),
            "static assets cached"
        );
        self.request_skip_waiting().await;
        self.state.send_replace(WorkerState::Installed);
        Ok(report)
    }

    async fn precache_asset(
        &self,
        partition: &Partition,
        asset: &str,
    ) -> CacheResult<()> {
        let url = self.engine.config().resolve(asset)?;
        let request = Request::new(reqwest::Method::GET, url);
        let response = self.engine.fetcher().fetch(&request).await?;
        if !response.is_success() {
            return Err(CacheError::Network {
                message: format!("HTTP {} for {}", response.status, request.url),
            });
        }
        partition.put(&request, &response).await
    }

    /// Reclaim partitions from older versions, then claim open pages.
    ///
    /// Cleanup is best-effort: a failure is logged and activation continues.
    pub async fn activate(&self) -> CacheResult<ActivateReport> {
        self.transition(&[WorkerState::Installed], WorkerState::Activating, "activate")?;
        info!("worker activating");

        let deleted = match self.partitions().reclaim_stale().await {
            Ok(deleted) => deleted,
            Err(e) => {
                warn!(error = %e, "partition cleanup failed");
                Vec::new()
            }
        };
        info!(deleted = deleted.len(), "cache cleanup completed");

        if let Err(e) = self.host.claim_clients().await {
            warn!(error = %e, "failed to claim clients");
        }
        self.state.send_replace(WorkerState::Activated);
        Ok(ActivateReport { deleted })
    }

    /// Intercept a request. `Ok(None)`: not intercepted.
    pub async fn handle_fetch(&self, request: &Request) -> CacheResult<Option<Response>> {
        self.engine.handle(request).await
    }

    /// Handle a page message. Unknown or malformed messages are ignored.
    pub async fn handle_message(&self, data: Value, port: Option<ReplyPort>) {
        let message: ControlMessage = match serde_json::from_value(data) {
            Ok(message) => message,
            Err(e) => {
                debug!(error = %e, "ignoring unrecognized message");
                return;
            }
        };

        match message {
            ControlMessage::SkipWaiting => self.request_skip_waiting().await,
            ControlMessage::GetCacheSize => {
                let cache_size = match self.cache_size().await {
                    Ok(size) => size,
                    Err(e) => {
                        error!(error = %e, "failed to compute cache size");
                        return;
                    }
                };
                match port {
                    Some(port) => {
                        if port.send(CacheSizeReply { cache_size }).is_err() {
                            debug!("cache size requester went away");
                        }
                    }
                    None => warn!("GET_CACHE_SIZE without a reply port"),
                }
            }
        }
    }

    /// Show a notification built from a push payload.
    ///
    /// No payload, a malformed payload or a host failure skips the display.
    pub async fn handle_push(&self, payload: Option<&[u8]>) -> Option<Notification> {
        let payload: PushPayload = match serde_json::from_slice(payload?) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "ignoring malformed push payload");
                return None;
            }
        };

        let default_icon = &self.engine.config().notification_icon;
        let notification = Notification {
            title: payload.title,
            body: payload.body,
            icon: payload.icon.unwrap_or_else(|| default_icon.clone()),
            badge: default_icon.clone(),
            data: payload.data,
            require_interaction: false,
            silent: false,
        };

        match self.host.show_notification(&notification).await {
            Ok(()) => Some(notification),
            Err(e) => {
                warn!(error = %e, "failed to show notification");
                None
            }
        }
    }

    /// Close the notification and open its target page. Returns the URL.
    pub async fn handle_notification_click(&self, notification: &Notification) -> String {
        if let Err(e) = self.host.close_notification(notification).await {
            warn!(error = %e, "failed to close notification");
        }
        let url = notification.target_url().to_string();
        if let Err(e) = self.host.open_window(&url).await {
            warn!(url = %url, error = %e, "failed to open window");
        }
        url
    }

    /// Entries across every application-prefixed partition.
    pub async fn cache_size(&self) -> CacheResult<u64> {
        self.partitions().entry_count().await
    }

    async fn request_skip_waiting(&self) {
        self.skip_waiting.store(true, Ordering::SeqCst);
        if let Err(e) = self.host.skip_waiting().await {
            warn!(error = %e, "skip waiting failed");
        }
    }

    fn transition(
        &self,
        from: &[WorkerState],
        to: WorkerState,
        event: &str,
    ) -> CacheResult<()> {
        let mut observed = WorkerState::Parsed;
        let moved = self.state.send_if_modified(|state| {
            observed = *state;
            if from.contains(state) {
                *state = to;
                true
            } else {
                false
            }
        });

        if moved {
            Ok(())
        } else {
            Err(CacheError::Lifecycle {
                event: event.to_string(),
                state: observed.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::partition::MemoryStore;
    use crate::strategy::tests::ScriptedFetcher;

    #[derive(Debug, Clone, PartialEq)]
    enum HostCall {
        SkipWaiting,
        Claim,
        Show(String),
        Close(String),
        Open(String),
    }

    #[derive(Debug, Default)]
    struct RecordingHost {
        calls: Mutex<Vec<HostCall>>,
        fail_show: bool,
    }

    impl RecordingHost {
        fn calls(&self) -> Vec<HostCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Host for RecordingHost {
        async fn skip_waiting(&self) -> CacheResult<()> {
            self.calls.lock().unwrap().push(HostCall::SkipWaiting);
            Ok(())
        }

        async fn claim_clients(&self) -> CacheResult<()> {
            self.calls.lock().unwrap().push(HostCall::Claim);
            Ok(())
        }

        async fn show_notification(&self, notification: &Notification) -> CacheResult<()> {
            if self.fail_show {
                return Err(CacheError::Host {
                    message: "permission denied".to_string(),
                });
            }
            self.calls
                .lock()
                .unwrap()
                .push(HostCall::Show(notification.title.clone()));
            Ok(())
        }

        async fn close_notification(&self, notification: &Notification) -> CacheResult<()> {
            self.calls
                .lock()
                .unwrap()
                .push(HostCall::Close(notification.title.clone()));
            Ok(())
        }

        async fn open_window(&self, url: &str) -> CacheResult<()> {
            self.calls
                .lock()
                .unwrap()
                .push(HostCall::Open(url.to_string()));
            Ok(())
        }
    }

    struct Fixture {
        worker: Worker,
        store: Arc<MemoryStore>,
        fetcher: Arc<ScriptedFetcher>,
        host: Arc<RecordingHost>,
    }

    fn fixture_with(config: WorkerConfig, host: RecordingHost) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let fetcher = Arc::new(ScriptedFetcher::default());
        let host = Arc::new(host);
        let worker = Worker::new(config, store.clone(), fetcher.clone(), host.clone()).unwrap();
        Fixture {
            worker,
            store,
            fetcher,
            host,
        }
    }

    fn fixture() -> Fixture {
        let config = WorkerConfig::default().with_static_assets(["/", "/index.html", "/app.js"]);
        fixture_with(config, RecordingHost::default())
    }

    fn notification(data: Option<Value>) -> Notification {
        Notification {
            title: "Mint live".to_string(),
            body: "Public phase started".to_string(),
            icon: "/images/logo.jpg".to_string(),
            badge: "/images/logo.jpg".to_string(),
            data,
            require_interaction: false,
            silent: false,
        }
    }

    #[tokio::test]
    async fn test_install_survives_failed_asset() {
        let f = fixture();
        f.fetcher.route("http://localhost:5173/", Response::ok("home"));
        f.fetcher.route("http://localhost:5173/app.js", Response::ok("js"));
        // /index.html is unreachable

        let report = f.worker.install().await.unwrap();
        assert_eq!(report.cached.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "/index.html");

        assert_eq!(f.worker.state(), WorkerState::Installed);
        assert!(f.worker.skip_waiting_requested());
        assert_eq!(f.host.calls(), vec![HostCall::SkipWaiting]);

        let keys = f.store.keys("hypertoons-static-v1").await.unwrap();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&"GET http://localhost:5173/app.js".to_string()));
    }

    #[tokio::test]
    async fn test_install_treats_error_status_as_failure() {
        let f = fixture();
        f.fetcher.route("http://localhost:5173/", Response::new(404));

        let report = f.worker.install().await.unwrap();
        assert_eq!(report.cached.len(), 0);
        assert_eq!(report.failed.len(), 3);
        assert!(f.store.keys("hypertoons-static-v1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lifecycle_order_is_enforced() {
        let f = fixture();
        let err = f.worker.activate().await.unwrap_err();
        assert!(matches!(err, CacheError::Lifecycle { .. }));

        f.worker.install().await.unwrap();
        assert!(f.worker.install().await.is_err());

        f.worker.activate().await.unwrap();
        assert_eq!(f.worker.state(), WorkerState::Activated);
        assert!(f.worker.activate().await.is_err());
    }

    #[tokio::test]
    async fn test_activate_reclaims_and_claims() {
        let f = fixture();
        f.store.open("hypertoons-static-v0").await.unwrap();
        f.store.open("hypertoons-images-v0").await.unwrap();
        f.store.open("unrelated").await.unwrap();

        let mut states = f.worker.subscribe();
        f.worker.install().await.unwrap();
        let report = f.worker.activate().await.unwrap();

        assert_eq!(report.deleted.len(), 2);
        assert_eq!(
            f.host.calls(),
            vec![HostCall::SkipWaiting, HostCall::Claim]
        );
        assert!(states.has_changed().unwrap());
        assert_eq!(*states.borrow_and_update(), WorkerState::Activated);

        let names = f.store.partition_names().await.unwrap();
        assert!(names.contains(&"unrelated".to_string()));
        assert!(names.contains(&"hypertoons-static-v1".to_string()));
    }

    #[tokio::test]
    async fn test_get_cache_size_replies_on_port() {
        let f = fixture();
        f.fetcher.route("http://localhost:5173/", Response::ok("home"));
        f.fetcher.route("http://localhost:5173/index.html", Response::ok("index"));
        f.worker.install().await.unwrap();
        f.store
            .put("hypertoons-api-v0", "GET http://x/api/a", &Response::ok("{}"))
            .await
            .unwrap();

        let (tx, rx) = oneshot::channel();
        let outcome = f
            .worker
            .dispatch(Event::Message {
                data: json!({"type": "GET_CACHE_SIZE"}),
                port: Some(tx),
            })
            .await
            .unwrap();
        assert!(matches!(outcome, EventOutcome::MessageHandled));

        let reply = rx.await.unwrap();
        assert_eq!(reply.cache_size, 3);
        assert_eq!(serde_json::to_value(reply).unwrap(), json!({"cacheSize": 3}));
    }

    #[tokio::test]
    async fn test_skip_waiting_message() {
        let f = fixture();
        let (tx, rx) = oneshot::channel();
        f.worker
            .dispatch(Event::Message {
                data: json!({"type": "SKIP_WAITING"}),
                port: Some(tx),
            })
            .await
            .unwrap();

        assert!(f.worker.skip_waiting_requested());
        assert_eq!(f.host.calls(), vec![HostCall::SkipWaiting]);
        assert!(rx.await.is_err(), "SKIP_WAITING sends no reply");
    }

    #[tokio::test]
    async fn test_unknown_message_is_ignored() {
        let f = fixture();
        for data in [json!({"type": "NOPE"}), json!("SKIP_WAITING"), Value::Null] {
            let outcome = f
                .worker
                .dispatch(Event::Message { data, port: None })
                .await
                .unwrap();
            assert!(matches!(outcome, EventOutcome::MessageHandled));
        }
        assert!(f.host.calls().is_empty());
    }

    #[tokio::test]
    async fn test_push_shows_notification() {
        let f = fixture();
        let payload = br#"{"title":"Mint live","body":"Go","data":{"url":"/mint"}}"#;

        let outcome = f
            .worker
            .dispatch(Event::Push(Some(Bytes::from_static(payload))))
            .await
            .unwrap();
        let EventOutcome::NotificationShown(shown) = outcome else {
            panic!("expected a notification");
        };
        assert_eq!(shown.icon, "/images/logo.jpg");
        assert_eq!(shown.badge, "/images/logo.jpg");
        assert!(!shown.require_interaction);
        assert_eq!(shown.target_url(), "/mint");
        assert_eq!(f.host.calls(), vec![HostCall::Show("Mint live".to_string())]);
    }

    #[tokio::test]
    async fn test_push_without_or_with_bad_payload_is_skipped() {
        let f = fixture();
        assert!(matches!(
            f.worker.dispatch(Event::Push(None)).await.unwrap(),
            EventOutcome::NotificationSkipped
        ));
        assert!(matches!(
            f.worker
                .dispatch(Event::Push(Some(Bytes::from_static(b"not json"))))
                .await
                .unwrap(),
            EventOutcome::NotificationSkipped
        ));
        assert!(matches!(
            f.worker
                .dispatch(Event::Push(Some(Bytes::from_static(br#"{"title":"x"}"#))))
                .await
                .unwrap(),
            EventOutcome::NotificationSkipped
        ));
        assert!(f.host.calls().is_empty());
    }

    #[tokio::test]
    async fn test_push_host_failure_is_contained() {
        let host = RecordingHost {
            fail_show: true,
            ..Default::default()
        };
        let f = fixture_with(WorkerConfig::default(), host);
        let payload = Bytes::from_static(br#"{"title":"t","body":"b"}"#);
        assert!(f.worker.handle_push(Some(&payload)).await.is_none());
    }

    #[tokio::test]
    async fn test_notification_click_opens_target_or_root() {
        let f = fixture();
        let url = f
            .worker
            .handle_notification_click(&notification(Some(json!({"url": "/mint"}))))
            .await;
        assert_eq!(url, "/mint");

        let outcome = f
            .worker
            .dispatch(Event::NotificationClick(notification(None)))
            .await
            .unwrap();
        assert!(matches!(outcome, EventOutcome::WindowOpened(ref u) if u == "/"));

        assert_eq!(
            f.host.calls(),
            vec![
                HostCall::Close("Mint live".to_string()),
                HostCall::Open("/mint".to_string()),
                HostCall::Close("Mint live".to_string()),
                HostCall::Open("/".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_spawned_fetches_run_independently() {
        let f = fixture();
        f.fetcher
            .route("http://localhost:5173/api/mint-events", Response::ok("[]"));

        let ok = f.worker.spawn(Event::Fetch(
            Request::get("http://localhost:5173/api/mint-events").unwrap(),
        ));
        let failing = f.worker.spawn(Event::Fetch(
            Request::get("http://localhost:5173/missing.js").unwrap(),
        ));
        let blockchain = f.worker.spawn(Event::Fetch(
            Request::get("https://rpc.hyperliquid.xyz/v1").unwrap(),
        ));

        assert!(matches!(ok.await.unwrap(), Ok(EventOutcome::Response(_))));
        assert!(matches!(failing.await.unwrap(), Err(CacheError::Network { .. })));
        match blockchain.await.unwrap() {
            Ok(EventOutcome::Response(resp)) => assert_eq!(resp.status, 503),
            other => panic!("unexpected outcome: {:?}", other),
        }

        // The failed static fetch left the API write intact.
        assert_eq!(f.worker.cache_size().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_non_get_fetch_is_not_intercepted() {
        let f = fixture();
        let mut request = Request::get("http://localhost:5173/api/mint-events").unwrap();
        request.method = reqwest::Method::POST;
        assert!(matches!(
            f.worker.dispatch(Event::Fetch(request)).await.unwrap(),
            EventOutcome::NotIntercepted
        ));
    }
}
