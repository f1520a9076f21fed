//! Offline-first HTTP caching worker for the Hypertoons mint site.
//!
//! This crate implements the request-interception side of the site's
//! background worker, providing:
//!
//! - Request classification into static assets, API calls, images,
//!   blockchain/RPC calls and everything else
//! - Three versioned cache partitions (`static`, `api`, `images`) with
//!   cleanup of older versions on activation
//! - Per-category strategies: cache-first, network-first, network-only and
//!   passthrough
//! - Synthesized offline fallbacks (mock API payloads, placeholder image,
//!   offline document, 503 for chain calls)
//! - Lifecycle and control-plane hooks: install, activate, push,
//!   notification click, `SKIP_WAITING` and `GET_CACHE_SIZE`
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use swcache_core::{DiskStore, Event, HttpFetcher, Request, TracingHost, Worker, WorkerConfig};
//!
//! # async fn example() -> swcache_core::CacheResult<()> {
//! let config = WorkerConfig::from_env()?;
//! let fetcher = Arc::new(HttpFetcher::new(&config)?);
//! let worker = Worker::new(config, Arc::new(DiskStore::new()?), fetcher, Arc::new(TracingHost))?;
//!
//! worker.dispatch(Event::Install).await?;
//! worker.dispatch(Event::Activate).await?;
//!
//! let request = Request::get("http://localhost:5173/api/collection-data")?;
//! if let Some(response) = worker.handle_fetch(&request).await? {
//!     println!("{} {}", response.status, response.text());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `SWCACHE_ORIGIN` | Origin for relative asset paths (default: `http://localhost:5173/`) |
//! | `SWCACHE_PREFIX` | Application partition prefix (default: `hypertoons-`) |
//! | `SWCACHE_VERSION` | Version of all three partitions (default: `v1`) |
//! | `SWCACHE_TIMEOUT` | Request timeout in seconds (default: 30) |
//! | `SWCACHE_CACHE_DIR` | Disk store root (default: `{user cache dir}/swcache/partitions`) |

pub mod classify;
pub mod error;
pub mod fallback;
pub mod fetch;
pub mod partition;
pub mod strategy;
pub mod types;
pub mod worker;

// Re-export main types
pub use classify::{Category, Classifier};
pub use error::{CacheError, CacheResult};
pub use fetch::{Fetcher, HttpFetcher};
pub use partition::{DiskStore, MemoryStore, Partition, PartitionManager, PartitionStore};
pub use reqwest::Method;
pub use strategy::{Engine, Strategy};
pub use types::{
    Destination, PartitionKind, PartitionSet, PartitionSpec, Request, Response, WorkerConfig,
};
pub use url::Url;
pub use worker::{
    ActivateReport, CacheSizeReply, ControlMessage, Event, EventOutcome, Host, InstallReport,
    Notification, PushPayload, ReplyPort, TracingHost, Worker, WorkerState,
};
