//! Request/response snapshots and worker configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{CacheError, CacheResult};

/// What the page intends to do with the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    /// Top-level navigation; expects a full HTML document.
    Document,
    Image,
    Script,
    Style,
    Font,
    #[default]
    Other,
}

/// An intercepted request.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    /// Header names are stored lowercase.
    pub headers: BTreeMap<String, String>,
    pub destination: Destination,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: BTreeMap::new(),
            destination: Destination::Other,
        }
    }

    /// Parse `url` and build a GET request.
    pub fn get(url: &str) -> CacheResult<Self> {
        Ok(Self::new(Method::GET, Url::parse(url)?))
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Partition key: method plus URL. The query string is significant,
    /// the fragment is not.
    pub fn cache_key(&self) -> String {
        let mut url = self.url.clone();
        url.set_fragment(None);
        format!("{} {}", self.method, url)
    }

    pub fn expects_document(&self) -> bool {
        self.destination == Destination::Document
    }
}

/// A response snapshot.
///
/// The body is a shared [`Bytes`] buffer: cloning a response hands out an
/// independent reader over the same bytes, so one copy can be written to a
/// partition while the other goes back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    /// Header names are stored lowercase.
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: Bytes::new(),
        }
    }

    /// A 200 response with the given body.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(200).with_body(body)
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> CacheResult<T> {
        serde_json::from_slice(&self.body).map_err(|e| CacheError::InvalidRequest {
            message: format!("response body is not valid JSON: {}", e),
        })
    }
}

/// The three partitions the worker owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartitionKind {
    Static,
    Api,
    Image,
}

impl PartitionKind {
    pub const ALL: [PartitionKind; 3] = [Self::Static, Self::Api, Self::Image];
}

/// Logical partition name paired with the version it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionSpec {
    pub name: String,
    pub version: String,
}

impl PartitionSpec {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Version-qualified identity, e.g. `hypertoons-static-v1`.
    pub fn identity(&self, prefix: &str) -> String {
        format!("{}{}-{}", prefix, self.name, self.version)
    }
}

/// The declared (name, version) pairs for the running worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionSet {
    pub assets: PartitionSpec,
    pub api: PartitionSpec,
    pub images: PartitionSpec,
}

impl PartitionSet {
    /// All three partitions at one version.
    pub fn versioned(version: &str) -> Self {
        Self {
            assets: PartitionSpec::new("static", version),
            api: PartitionSpec::new("api", version),
            images: PartitionSpec::new("images", version),
        }
    }

    pub fn spec(&self, kind: PartitionKind) -> &PartitionSpec {
        match kind {
            PartitionKind::Static => &self.assets,
            PartitionKind::Api => &self.api,
            PartitionKind::Image => &self.images,
        }
    }

    pub fn identities(&self, prefix: &str) -> Vec<String> {
        PartitionKind::ALL
            .iter()
            .map(|kind| self.spec(*kind).identity(prefix))
            .collect()
    }
}

impl Default for PartitionSet {
    fn default() -> Self {
        Self::versioned("v1")
    }
}

/// Worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Reserved prefix carried by every partition this application owns.
    pub app_prefix: String,

    /// Current partition versions.
    pub partitions: PartitionSet,

    /// Origin the relative asset paths resolve against.
    pub origin: Url,

    /// Assets written to the static partition on install.
    pub static_assets: Vec<String>,

    /// Known API endpoint paths.
    pub api_endpoints: Vec<String>,

    /// Hosts whose responses are static assets (web fonts).
    pub font_hosts: Vec<String>,

    /// Substrings identifying chain/RPC provider hosts.
    pub chain_hosts: Vec<String>,

    /// Icon and badge for push notifications.
    pub notification_icon: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Root directory of the disk partition store.
    pub cache_dir: Option<PathBuf>,
}

fn default_origin() -> Url {
    Url::parse("http://localhost:5173/").expect("static origin URL is valid")
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            app_prefix: "hypertoons-".to_string(),
            partitions: PartitionSet::default(),
            origin: default_origin(),
            static_assets: [
                "/",
                "/index.html",
                "/src/main.jsx",
                "/src/App.jsx",
                "/src/index.css",
                "/images/logo.jpg",
                "/images/background.png",
                "https://fonts.googleapis.com/css2?family=Inter:wght@300;400;500;600;700;800&family=JetBrains+Mono:wght@400;500;600&display=swap",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            api_endpoints: ["/api/collection-data", "/api/mint-events", "/api/eligibility"]
                .into_iter()
                .map(String::from)
                .collect(),
            font_hosts: vec![
                "fonts.googleapis.com".to_string(),
                "fonts.gstatic.com".to_string(),
            ],
            chain_hosts: vec!["hyperliquid".to_string(), "ethereum".to_string()],
            notification_icon: "/images/logo.jpg".to_string(),
            timeout_secs: 30,
            cache_dir: None,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `SWCACHE_ORIGIN` | Origin for relative asset paths |
    /// | `SWCACHE_PREFIX` | Application partition prefix |
    /// | `SWCACHE_VERSION` | Version for all three partitions |
    /// | `SWCACHE_TIMEOUT` | Request timeout in seconds |
    /// | `SWCACHE_CACHE_DIR` | Disk store root |
    pub fn from_env() -> CacheResult<Self> {
        Self::default().apply_env()
    }

    /// Load a YAML config file, then apply environment overrides.
    pub fn from_yaml_file(path: &Path) -> CacheResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CacheError::Config {
            message: format!("failed to read {}: {}", path.display(), e),
        })?;
        let config: Self = serde_yaml::from_str(&content).map_err(|e| CacheError::Config {
            message: format!("failed to parse {}: {}", path.display(), e),
        })?;
        config.apply_env()
    }

    /// Overlay `SWCACHE_*` environment variables.
    pub fn apply_env(mut self) -> CacheResult<Self> {
        if let Ok(origin) = std::env::var("SWCACHE_ORIGIN") {
            self.origin = Url::parse(&origin).map_err(|e| CacheError::Config {
                message: format!("invalid SWCACHE_ORIGIN {:?}: {}", origin, e),
            })?;
        }
        if let Ok(prefix) = std::env::var("SWCACHE_PREFIX") {
            self.app_prefix = prefix;
        }
        if let Ok(version) = std::env::var("SWCACHE_VERSION") {
            self.partitions = PartitionSet::versioned(&version);
        }
        if let Some(timeout) = std::env::var("SWCACHE_TIMEOUT")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.timeout_secs = timeout;
        }
        if let Ok(dir) = std::env::var("SWCACHE_CACHE_DIR") {
            self.cache_dir = Some(PathBuf::from(dir));
        }
        self.validate()?;
        Ok(self)
    }

    /// Reject configs the partition lifecycle cannot work with.
    pub fn validate(&self) -> CacheResult<()> {
        if self.app_prefix.is_empty() {
            return Err(CacheError::Config {
                message: "app_prefix must not be empty".to_string(),
            });
        }
        let ids = self.partitions.identities(&self.app_prefix);
        if ids[0] == ids[1] || ids[0] == ids[2] || ids[1] == ids[2] {
            return Err(CacheError::Config {
                message: format!("partition identities must be distinct: {:?}", ids),
            });
        }
        Ok(())
    }

    /// Set the origin.
    pub fn with_origin(mut self, origin: Url) -> Self {
        self.origin = origin;
        self
    }

    /// Set the version of all three partitions.
    pub fn with_version(mut self, version: &str) -> Self {
        self.partitions = PartitionSet::versioned(version);
        self
    }

    /// Replace the install-time asset list.
    pub fn with_static_assets<I, S>(mut self, assets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.static_assets = assets.into_iter().map(Into::into).collect();
        self
    }

    /// Resolve a path (or absolute URL) against the origin.
    pub fn resolve(&self, path: &str) -> CacheResult<Url> {
        Ok(self.origin.join(path)?)
    }

    pub fn identity(&self, kind: PartitionKind) -> String {
        self.partitions.spec(kind).identity(&self.app_prefix)
    }
}
