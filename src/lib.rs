//! HTTP request/response logging middleware for axum/tower services.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::AppConfig;
pub use http::{HttpServer, LogEntry, RequestLoggerLayer};
pub use lifecycle::Shutdown;
pub use observability::{LogSink, TracingSink};
