//! Offline fallback responses.
//!
//! Used when neither the network nor a partition can answer. Every function
//! here is infallible and returns a well-formed response.

use chrono::Utc;
use serde_json::{json, Value};

use crate::types::Response;

/// Marker header on synthesized API payloads.
pub const FROM_CACHE_HEADER: &str = "x-from-cache";
pub const OFFLINE_FALLBACK: &str = "offline-fallback";

pub const OFFLINE_DOCUMENT_TEXT: &str = "Offline - Please check your connection";

const PLACEHOLDER_SVG: &str = r##"<svg width="400" height="300" xmlns="http://www.w3.org/2000/svg">
  <rect width="100%" height="100%" fill="#f3f4f6"/>
  <text x="50%" y="50%" text-anchor="middle" dy="0.3em" font-family="Arial, sans-serif" font-size="18" fill="#9ca3af">
    Image Unavailable
  </text>
  <text x="50%" y="60%" text-anchor="middle" dy="0.3em" font-family="Arial, sans-serif" font-size="12" fill="#6b7280">
    Please check your connection
  </text>
</svg>
"##;

/// Plain-text stand-in for a navigation that could not be served.
pub fn offline_document() -> Response {
    Response::ok(OFFLINE_DOCUMENT_TEXT).with_header("content-type", "text/plain;charset=UTF-8")
}

/// Mock payload for an API path, picked by substring.
pub fn api_mock(path: &str) -> Response {
    Response::ok(api_mock_payload(path).to_string())
        .with_header("content-type", "application/json")
        .with_header(FROM_CACHE_HEADER, OFFLINE_FALLBACK)
}

fn api_mock_payload(path: &str) -> Value {
    if path.contains("collection-data") {
        json!({
            "totalSupply": 3247,
            "maxSupply": 5000,
            "progress": 64.94,
            "currentPhase": "public"
        })
    } else if path.contains("mint-events") {
        let now = Utc::now().timestamp_millis();
        json!({
            "events": [
                { "address": "0x123...abc", "amount": 5, "time": now - 30_000 },
                { "address": "0x456...def", "amount": 2, "time": now - 60_000 }
            ]
        })
    } else if path.contains("eligibility") {
        json!({
            "isEligible": true,
            "phase": "public",
            "maxMints": 20
        })
    } else {
        json!({ "message": "Offline mode - using cached data" })
    }
}

/// Inline SVG shown in place of any image that could not be loaded.
pub fn placeholder_image() -> Response {
    Response::ok(PLACEHOLDER_SVG)
        .with_header("content-type", "image/svg+xml")
        .with_header("cache-control", "public, max-age=86400")
}

/// 503 returned for chain/RPC requests when the network is down.
pub fn network_unavailable() -> Response {
    let body = json!({
        "error": "Network unavailable",
        "message": "Please check your connection and try again"
    });
    Response::new(503)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
}
