//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request logger middleware produces:
//!     → sink.rs (one LogEntry per request, or a handler failure)
//!
//! Consumers:
//!     → TracingSink → tracing subscriber (logging.rs) → stderr
//!     → any other LogSink supplied by the embedding application
//! ```
//!
//! # Design Decisions
//! - Structured logging for machine parsing (JSON format available)
//! - Subscriber installed explicitly at startup, never implicitly
//! - Sinks are shared across requests; no locking in the middleware

pub mod logging;
pub mod sink;

pub use sink::{LogSink, TracingSink};
