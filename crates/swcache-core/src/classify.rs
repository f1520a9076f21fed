//! Request classification.
//!
//! Rules are evaluated in a fixed order and the first match wins:
//! non-GET → not intercepted, then static asset, API, image, blockchain,
//! generic. A path such as `/images/logo.jpg` is therefore a static asset,
//! not an image.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Method;
use url::Url;

use crate::types::WorkerConfig;

/// Extensions served cache-first from the static partition (case-sensitive).
const STATIC_EXTENSIONS: &[&str] = &[
    ".js", ".css", ".html", ".png", ".jpg", ".jpeg", ".gif", ".svg", ".ico", ".woff", ".woff2",
];

const API_PREFIX: &str = "/api/";
const IMAGES_SEGMENT: &str = "/images/";
const RPC_PATH_MARKERS: &[&str] = &["rpc", "api/v1"];

static IMAGE_EXTENSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\.(png|jpg|jpeg|gif|svg|webp)(\?.*)?$").expect("image extension pattern")
});

/// Category of an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    StaticAsset,
    Api,
    Image,
    Blockchain,
    Generic,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StaticAsset => write!(f, "static-asset"),
            Self::Api => write!(f, "api"),
            Self::Image => write!(f, "image"),
            Self::Blockchain => write!(f, "blockchain"),
            Self::Generic => write!(f, "generic"),
        }
    }
}

/// Pure URL/method classifier.
#[derive(Debug, Clone)]
pub struct Classifier {
    api_endpoints: Vec<String>,
    font_hosts: Vec<String>,
    chain_hosts: Vec<String>,
}

impl Classifier {
    pub fn new(config: &WorkerConfig) -> Self {
        Self {
            api_endpoints: config.api_endpoints.clone(),
            font_hosts: config.font_hosts.clone(),
            chain_hosts: config.chain_hosts.clone(),
        }
    }

    /// Classify a request. `None` means the worker must not intercept it.
    pub fn classify(&self, method: &Method, url: &Url) -> Option<Category> {
        if *method != Method::GET {
            return None;
        }

        let path = url.path();
        let host = url.host_str().unwrap_or_default();

        let category = if self.is_static_asset(path, host) {
            Category::StaticAsset
        } else if self.is_api(path) {
            Category::Api
        } else if looks_like_image(path) {
            Category::Image
        } else if self.is_blockchain(path, host) {
            Category::Blockchain
        } else {
            Category::Generic
        };
        Some(category)
    }

    fn is_static_asset(&self, path: &str, host: &str) -> bool {
        STATIC_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
            || path == "/"
            || self.font_hosts.iter().any(|h| h == host)
    }

    fn is_api(&self, path: &str) -> bool {
        path.starts_with(API_PREFIX)
            || self
                .api_endpoints
                .iter()
                .any(|endpoint| path.contains(endpoint.as_str()))
    }

    fn is_blockchain(&self, path: &str, host: &str) -> bool {
        self.chain_hosts.iter().any(|h| host.contains(h.as_str()))
            || RPC_PATH_MARKERS.iter().any(|marker| path.contains(marker))
    }
}

/// Path sits under the images directory or carries an image extension.
pub(crate) fn looks_like_image(path: &str) -> bool {
    path.contains(IMAGES_SEGMENT) || IMAGE_EXTENSION.is_match(path)
}
