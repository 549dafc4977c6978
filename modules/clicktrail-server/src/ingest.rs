//! Lenient decoding of ingest requests.
//!
//! Nothing is validated. A field that is missing renders as `undefined`, a body
//! that is not a JSON object renders every field as `undefined`, and non-string
//! values render as their JSON text.

use std::net::SocketAddr;

use axum::http::HeaderMap;
use clicktrail_common::EventRecord;
use serde_json::{Map, Value};

const MISSING: &str = "undefined";

pub fn record_from_body(body: &[u8]) -> EventRecord {
    let fields = match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    EventRecord {
        event_type: field(&fields, "eventType"),
        data: field(&fields, "data"),
        device_info: field(&fields, "deviceInfo"),
    }
}

fn field(fields: &Map<String, Value>, name: &str) -> String {
    match fields.get(name) {
        None => MISSING.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Address recorded in the log line for this request.
pub fn sender_address(headers: &HeaderMap, peer: SocketAddr, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }
    peer.ip().to_canonical().to_string()
}
