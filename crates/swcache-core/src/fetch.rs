//! Network layer.
//!
//! The worker never talks to the network directly; it goes through a
//! [`Fetcher`]. Any HTTP status, including 4xx/5xx, is a successful fetch.
//! Only transport failures (DNS, refused connection, timeout, truncated
//! body) are errors.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use tracing::{debug, warn};

use crate::error::{CacheError, CacheResult};
use crate::types::{Request, Response, WorkerConfig};

pub const USER_AGENT_VALUE: &str = concat!("swcache/", env!("CARGO_PKG_VERSION"));

/// Performs a request against the network.
#[async_trait]
pub trait Fetcher: Send + Sync + std::fmt::Debug {
    async fn fetch(&self, request: &Request) -> CacheResult<Response>;
}

/// [`Fetcher`] backed by a reqwest client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &WorkerConfig) -> CacheResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| CacheError::Network {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> CacheResult<Response> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone());

        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                CacheError::InvalidRequest {
                    message: format!("invalid header name {:?}: {}", name, e),
                }
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| CacheError::InvalidRequest {
                message: format!("invalid header value for {}: {}", name, e),
            })?;
            builder = builder.header(name, value);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();

        let headers = collect_headers(response.headers(), request);

        let body = response.bytes().await.map_err(|e| CacheError::Network {
            message: format!("failed to read response body: {}", e),
        })?;

        debug!(url = %request.url, status, bytes = body.len(), "fetched");
        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

/// Flatten response headers. Repeated names are joined with `", "` in
/// arrival order; values that are not UTF-8 are skipped.
fn collect_headers(map: &HeaderMap, request: &Request) -> BTreeMap<String, String> {
    let mut headers: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in map {
        let Ok(value) = value.to_str() else {
            warn!(url = %request.url, header = %name, "skipping non-UTF-8 response header");
            continue;
        };
        headers
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    headers
}
