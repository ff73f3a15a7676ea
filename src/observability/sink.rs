//! Destination for request log records.

use std::fmt;

use serde::Serialize;

use crate::http::record::{HandlerFailure, LogEntry};

/// Receives one record per request. Shared by every in-flight request, so
/// implementations must be safe for concurrent use.
pub trait LogSink: Send + Sync + 'static {
    /// Completed request/response cycle.
    fn record(&self, entry: &LogEntry);

    /// Downstream handler failed before producing a response.
    fn handler_failed(&self, failure: &HandlerFailure);
}

/// Default sink: writes through `tracing` under the `request_logger` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn record(&self, entry: &LogEntry) {
        tracing::info!(
            target: "request_logger",
            method = %entry.request.method,
            path = %entry.request.path,
            status_code = entry.response.status_code,
            request = %Json(&entry.request),
            response = %Json(&entry.response),
            "request handled"
        );
    }

    fn handler_failed(&self, failure: &HandlerFailure) {
        tracing::error!(
            target: "request_logger",
            kind = failure.kind,
            method = %failure.method,
            path = %failure.path,
            reason = %failure.reason,
            "request handler failed"
        );
    }
}

/// Renders a serializable value as compact JSON in a log field.
struct Json<'a, T>(&'a T);

impl<T: Serialize> fmt::Display for Json<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = serde_json::to_string(self.0).map_err(|_| fmt::Error)?;
        f.write_str(&rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_field_rendering() {
        let value = json!({"method": "GET", "path": "/"});
        assert_eq!(Json(&value).to_string(), r#"{"method":"GET","path":"/"}"#);
    }
}
