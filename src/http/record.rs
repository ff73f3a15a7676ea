//! Loggable request/response records.
//!
//! # Responsibilities
//! - Normalize a request into a `RequestRecord` (method, path + query, client IP, body)
//! - Normalize a finished response into a `ResponseRecord`
//! - Pair them into the single `LogEntry` handed to the sink
//!
//! # Design Decisions
//! - Records are plain serde structs, built once and never mutated
//! - "Not JSON" is a value (`Option` / `BodyValue::Text`), never an error

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    extract::ConnectInfo,
    http::{Method, Request, StatusCode, Uri},
};
use serde::Serialize;
use serde_json::Value;

/// Client address reported when the transport did not attach one.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Request side of a log entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestRecord {
    pub method: String,

    /// Path with the query string appended when present.
    pub path: String,

    /// Client IP address.
    pub ip: String,

    /// Request body, only when it parsed as JSON.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl RequestRecord {
    /// Build the request head from a request. The body is filled in by the
    /// middleware after the read-ahead.
    pub fn from_request<B>(req: &Request<B>) -> Self {
        let ip = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());

        Self {
            method: req.method().to_string(),
            path: path_with_query(req.uri()),
            ip,
            body: None,
        }
    }
}

/// Whether the handler produced a success or error status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Successful,
    Failed,
}

impl Outcome {
    /// Failed iff status >= 400.
    pub fn from_status(status: StatusCode) -> Self {
        if status.as_u16() < 400 {
            Outcome::Successful
        } else {
            Outcome::Failed
        }
    }
}

/// Captured response body: parsed JSON, or the raw bytes as text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BodyValue {
    Json(Value),
    Text(String),
}

impl BodyValue {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match parse_json(bytes) {
            Some(value) => BodyValue::Json(value),
            None => BodyValue::Text(String::from_utf8_lossy(bytes).into_owned()),
        }
    }
}

/// Response side of a log entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseRecord {
    pub status: Outcome,
    pub status_code: u16,

    /// Handler time, e.g. `"0.0123s"`.
    pub elapsed: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<BodyValue>,

    /// Set when the body outgrew the capture limit.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,

    /// Set when the body stopped before end-of-stream (stream error or the
    /// client went away), so `body` holds only what was delivered.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub incomplete: bool,
}

impl ResponseRecord {
    pub fn new(status: StatusCode, elapsed: Duration, body: Option<BodyValue>) -> Self {
        Self {
            status: Outcome::from_status(status),
            status_code: status.as_u16(),
            elapsed: format_elapsed(elapsed),
            body,
            truncated: false,
            incomplete: false,
        }
    }

    pub fn truncated(mut self, truncated: bool) -> Self {
        self.truncated = truncated;
        self
    }

    pub fn incomplete(mut self, incomplete: bool) -> Self {
        self.incomplete = incomplete;
        self
    }
}

/// One record per request/response cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub request: RequestRecord,
    pub response: ResponseRecord,
}

/// Context logged when the downstream handler fails instead of responding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandlerFailure {
    pub kind: &'static str,
    pub path: String,
    pub method: String,
    pub reason: String,
}

impl HandlerFailure {
    pub fn new(method: &Method, path: String, reason: impl Into<String>) -> Self {
        Self {
            kind: "handler_error",
            path,
            method: method.to_string(),
            reason: reason.into(),
        }
    }
}

/// Parse bytes as JSON. Empty or malformed input yields `None`.
pub fn parse_json(bytes: &[u8]) -> Option<Value> {
    serde_json::from_slice(bytes).ok()
}

pub fn path_with_query(uri: &Uri) -> String {
    match uri.query() {
        Some(query) => format!("{}?{}", uri.path(), query),
        None => uri.path().to_string(),
    }
}

/// Seconds with four decimals and an `s` suffix.
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.4}s", elapsed.as_secs_f64())
}
