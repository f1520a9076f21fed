//! Per-category caching strategies.
//!
//! | Category | Strategy | Partition |
//! |----------|----------|-----------|
//! | static asset | cache-first | `static` |
//! | api | network-first | `api` |
//! | image | cache-first | `images` |
//! | blockchain | network-only | none |
//! | generic | passthrough | none |
//!
//! A partition read or write failure never fails the request: reads degrade
//! to a miss and writes are logged and dropped.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::classify::{looks_like_image, Category, Classifier};
use crate::error::{CacheError, CacheResult};
use crate::fallback;
use crate::fetch::Fetcher;
use crate::partition::{Partition, PartitionManager};
use crate::types::{Destination, PartitionKind, Request, Response, WorkerConfig};

const CACHE_CONTROL: &str = "cache-control";
const NO_CACHE: &str = "no-cache";

/// Consistency policy applied to a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    CacheFirst(PartitionKind),
    NetworkFirst(PartitionKind),
    NetworkOnly,
    Passthrough,
}

impl Strategy {
    pub fn for_category(category: Category) -> Self {
        match category {
            Category::StaticAsset => Self::CacheFirst(PartitionKind::Static),
            Category::Api => Self::NetworkFirst(PartitionKind::Api),
            Category::Image => Self::CacheFirst(PartitionKind::Image),
            Category::Blockchain => Self::NetworkOnly,
            Category::Generic => Self::Passthrough,
        }
    }
}

/// Classifier, partitions and network wired together.
#[derive(Debug, Clone)]
pub struct Engine {
    classifier: Classifier,
    partitions: PartitionManager,
    fetcher: Arc<dyn Fetcher>,
    config: Arc<WorkerConfig>,
}

impl Engine {
    pub fn new(
        config: Arc<WorkerConfig>,
        partitions: PartitionManager,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            classifier: Classifier::new(&config),
            partitions,
            fetcher,
            config,
        }
    }

    pub fn partitions(&self) -> &PartitionManager {
        &self.partitions
    }

    pub fn fetcher(&self) -> &Arc<dyn Fetcher> {
        &self.fetcher
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn classify(&self, request: &Request) -> Option<Category> {
        self.classifier.classify(&request.method, &request.url)
    }

    /// Handle an intercepted request.
    ///
    /// `Ok(None)` means the request is not intercepted and should go to the
    /// network untouched. `Err` is only returned for static-asset and generic
    /// requests, which have no fallback.
    pub async fn handle(&self, request: &Request) -> CacheResult<Option<Response>> {
        let Some(category) = self.classify(request) else {
            return Ok(None);
        };
        let strategy = Strategy::for_category(category);
        debug!(url = %request.url, %category, ?strategy, "intercepted");

        let response = match strategy {
            Strategy::CacheFirst(kind) => self.cache_first(kind, request).await?,
            Strategy::NetworkFirst(kind) => self.network_first(kind, request).await,
            Strategy::NetworkOnly => self.network_only(request).await,
            Strategy::Passthrough => self.passthrough(request).await?,
        };
        Ok(Some(response))
    }

    /// Serve from the partition of `kind`, fetching and storing on a miss.
    ///
    /// When the fetch fails the partition's offline fallback applies: the
    /// placeholder for images, the cached root or offline text for
    /// navigations. Anything else propagates the network error.
    pub async fn cache_first(
        &self,
        kind: PartitionKind,
        request: &Request,
    ) -> CacheResult<Response> {
        let partition = self.open_partition(kind).await;
        if let Some(hit) = lookup(partition.as_ref(), request).await {
            debug!(url = %request.url, "serving from cache");
            return Ok(hit);
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_success() {
                    if let Some(partition) = &partition {
                        write_through(partition, request, &response).await;
                    }
                }
                Ok(response)
            }
            Err(e) => {
                error!(
                    url = %request.url,
                    partition = %self.partitions.identity(kind),
                    error = %e,
                    "fetch failed"
                );
                self.offline_fallback(kind, partition.as_ref(), request, e).await
            }
        }
    }

    /// Fetch with a cache-busting header and store successes in the
    /// partition of `kind`; otherwise serve the stored copy, then a mock.
    pub async fn network_first(&self, kind: PartitionKind, request: &Request) -> Response {
        let busted = request.clone().with_header(CACHE_CONTROL, NO_CACHE);
        let partition = self.open_partition(kind).await;

        match self.fetcher.fetch(&busted).await {
            Ok(response) if response.is_success() => {
                if let Some(partition) = &partition {
                    write_through(partition, request, &response).await;
                }
                return response;
            }
            Ok(response) => {
                warn!(url = %request.url, status = response.status, "request failed, trying cache");
            }
            Err(e) => {
                warn!(url = %request.url, error = %e, "request failed, trying cache");
            }
        }

        if let Some(stale) = lookup(partition.as_ref(), request).await {
            debug!(url = %request.url, "serving stale data from cache");
            return stale;
        }

        fallback::api_mock(request.url.path())
    }

    /// Network only; never reads or writes a partition.
    pub async fn network_only(&self, request: &Request) -> Response {
        let busted = request.clone().with_header(CACHE_CONTROL, NO_CACHE);
        debug!(url = %request.url, "network-only request");

        match self.fetcher.fetch(&busted).await {
            Ok(response) => response,
            Err(e) => {
                error!(url = %request.url, error = %e, "network-only request failed");
                fallback::network_unavailable()
            }
        }
    }

    /// Straight to the network; failures surface to the caller.
    pub async fn passthrough(&self, request: &Request) -> CacheResult<Response> {
        self.fetcher.fetch(request).await.map_err(|e| {
            error!(url = %request.url, error = %e, "passthrough request failed");
            e
        })
    }

    async fn offline_fallback(
        &self,
        kind: PartitionKind,
        partition: Option<&Partition>,
        request: &Request,
        err: CacheError,
    ) -> CacheResult<Response> {
        if kind == PartitionKind::Image {
            return Ok(fallback::placeholder_image());
        }
        if request.expects_document() {
            return Ok(self.offline_document(partition).await);
        }
        if request.destination == Destination::Image || looks_like_image(request.url.path()) {
            return Ok(fallback::placeholder_image());
        }
        Err(err)
    }

    async fn offline_document(&self, partition: Option<&Partition>) -> Response {
        if let Ok(root) = self.config.resolve("/") {
            let root_request = Request::new(reqwest::Method::GET, root);
            if let Some(hit) = lookup(partition, &root_request).await {
                debug!("serving cached root document while offline");
                return hit;
            }
        }
        fallback::offline_document()
    }

    async fn open_partition(&self, kind: PartitionKind) -> Option<Partition> {
        match self.partitions.open(kind).await {
            Ok(partition) => Some(partition),
            Err(e) => {
                warn!(partition = %self.partitions.identity(kind), error = %e, "failed to open partition");
                None
            }
        }
    }
}

async fn lookup(partition: Option<&Partition>, request: &Request) -> Option<Response> {
    let partition = partition?;
    match partition.lookup(request).await {
        Ok(hit) => hit,
        Err(e) => {
            warn!(partition = %partition.identity(), error = %e, "cache read failed, treating as miss");
            None
        }
    }
}

async fn write_through(partition: &Partition, request: &Request, response: &Response) {
    if let Err(e) = partition.put(request, response).await {
        warn!(partition = %partition.identity(), error = %e, "cache write failed");
    }
}
